//! Conflict retry envelope
//!
//! The backend serializes some mutations per instance and rejects the loser
//! of a race with 409. Wrapping such calls here re-waits the parent and
//! retries until the deadline; every other error is returned as-is.

use crate::context::Context;
use crate::error::{CloudError, ErrorKind, Result};
use crate::waiter::{ParentWait, default_retry_interval};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Runs `op`, retrying on 409 until `timeout` or the context deadline,
/// whichever comes first. Running out of time after a conflict returns that
/// conflict, not the expiry.
pub async fn retry_on_conflict<T, F, Fut>(
    ctx: &Context,
    timeout: Duration,
    parent: &dyn ParentWait,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let own = Instant::now() + timeout;
    let deadline = match ctx.deadline() {
        Some(ctx_deadline) if ctx_deadline < own => ctx_deadline,
        _ => own,
    };
    let mut attempt: u32 = 1;
    let mut last_conflict: Option<CloudError> = None;

    loop {
        let err = match ctx.run(op()).await {
            Ok(out) => return Ok(out),
            Err(err) => err,
        };

        if !err.is_conflict() {
            return Err(out_of_time(ctx, err, last_conflict));
        }
        if Instant::now() >= deadline {
            tracing::warn!("Giving up after {} conflicting attempt(s): {}", attempt, err);
            return Err(err);
        }

        tracing::info!(
            "Attempt {} conflicted on {}, waiting for it to settle",
            attempt,
            parent.describe()
        );
        last_conflict = Some(err);
        if let Err(e) = parent.wait_ready().await {
            return Err(out_of_time(ctx, e, last_conflict));
        }
        let pause = default_retry_interval().min(deadline.saturating_duration_since(Instant::now()));
        if let Err(e) = ctx.sleep(pause).await {
            return Err(out_of_time(ctx, e, last_conflict));
        }
        attempt += 1;
    }
}

/// Replaces a deadline expiry with the conflict that kept us retrying
fn out_of_time(ctx: &Context, err: CloudError, last_conflict: Option<CloudError>) -> CloudError {
    match last_conflict {
        Some(conflict)
            if err.kind() == ErrorKind::Cancelled && ctx.is_expired() && !ctx.is_cancelled() =>
        {
            tracing::warn!("Deadline passed while retrying: {}", conflict);
            conflict
        }
        _ => err,
    }
}
