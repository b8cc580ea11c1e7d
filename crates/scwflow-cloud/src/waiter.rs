//! Waiting for resources to settle
//!
//! A waiter polls a resource until its status is terminal (ready or one of
//! the failure states) or the timeout expires. A 404 while polling surfaces
//! as [`CloudError::NotFound`] so callers can treat the resource as gone.

use crate::config::WaitConfig;
use crate::context::Context;
use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Process-wide override of [`DEFAULT_RETRY_INTERVAL`], 0 = unset
static RETRY_INTERVAL_OVERRIDE_MS: AtomicU64 = AtomicU64::new(0);

/// Overrides the default poll interval for the whole process (tests only)
pub fn set_default_retry_interval(interval: Duration) {
    let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
    RETRY_INTERVAL_OVERRIDE_MS.store(ms, Ordering::SeqCst);
}

pub fn reset_default_retry_interval() {
    RETRY_INTERVAL_OVERRIDE_MS.store(0, Ordering::SeqCst);
}

pub fn default_retry_interval() -> Duration {
    match RETRY_INTERVAL_OVERRIDE_MS.load(Ordering::SeqCst) {
        0 => DEFAULT_RETRY_INTERVAL,
        ms => Duration::from_millis(ms),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub retry_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            retry_interval: default_retry_interval(),
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl WaitOptions {
    /// Options for one operation: the configured interval (or the process
    /// default) and the operation's own timeout
    pub fn for_operation(config: &WaitConfig, timeout: Duration) -> Self {
        Self {
            retry_interval: config.retry_interval().unwrap_or_else(default_retry_interval),
            timeout,
        }
    }
}

/// Anything a waiter can poll
pub trait Lifecycle {
    /// Human readable status, for logs
    fn status_label(&self) -> String;

    /// True once the resource is ready or has failed for good
    fn is_terminal(&self) -> bool;
}

/// Polls `fetch` until the returned resource is terminal
pub async fn wait_for<T, F, Fut>(
    ctx: &Context,
    options: &WaitOptions,
    resource: &str,
    mut fetch: F,
) -> Result<T>
where
    T: Lifecycle,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempt: u32 = 0;

    loop {
        let current = ctx.run(fetch()).await?;
        if current.is_terminal() {
            tracing::debug!(
                "{} settled in status {} after {} poll(s)",
                resource,
                current.status_label(),
                attempt + 1
            );
            return Ok(current);
        }

        if Instant::now() + options.retry_interval > deadline {
            return Err(CloudError::WaitTimeout {
                resource: format!("{} (last status: {})", resource, current.status_label()),
                timeout: options.timeout,
            });
        }

        tracing::debug!("{} is {}, polling again", resource, current.status_label());
        attempt += 1;
        ctx.sleep(options.retry_interval).await?;
    }
}

/// A parent resource that child operations serialize on
#[async_trait]
pub trait ParentWait: Send + Sync {
    /// Blocks until the parent is in a stable state
    async fn wait_ready(&self) -> Result<()>;

    fn describe(&self) -> String;
}

/// Waits for the parent, runs `f`, then waits for the parent again
pub async fn with_parent_ready<T, F, Fut>(parent: &dyn ParentWait, f: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    parent.wait_ready().await?;
    let out = f().await?;
    parent.wait_ready().await?;
    Ok(out)
}
