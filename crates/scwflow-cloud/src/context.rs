//! Cancellation context passed into every controller operation
//!
//! Every backend call and every sleep goes through [`Context::run`] or
//! [`Context::sleep`], so cancelling the context or passing its deadline
//! stops the operation at the next suspension point. An in-flight request may
//! still complete server-side; nothing is rolled back.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Handle used by the host to cancel operations sharing a [`Context`]
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct Context {
    cancelled: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl Context {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self {
            cancelled: rx,
            deadline: None,
        }
    }

    /// Context paired with a [`Canceller`]
    pub fn with_cancel() -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                cancelled: rx,
                deadline: None,
            },
            Canceller {
                tx: std::sync::Arc::new(tx),
            },
        )
    }

    /// Child context expiring after `timeout`, or earlier if the parent does
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            cancelled: self.cancelled.clone(),
            deadline: Some(match self.deadline {
                Some(existing) if existing < deadline => existing,
                _ => deadline,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// True once the deadline, if any, has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone: nobody can cancel anymore.
                std::future::pending::<()>().await;
            }
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Runs `fut` unless the context is cancelled or its deadline passes first
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<CloudError>,
    {
        if self.is_cancelled() {
            return Err(CloudError::Cancelled("context cancelled".to_string()));
        }
        tokio::select! {
            res = fut => res.map_err(Into::into),
            _ = self.cancelled() => Err(CloudError::Cancelled("context cancelled".to_string())),
            _ = self.expired() => Err(CloudError::Cancelled("context deadline exceeded".to_string())),
        }
    }

    /// Cancellable sleep
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok::<(), CloudError>(())
        })
        .await
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
