//! Per-call cancellation and deadline.
//!
//! Every network await made on behalf of a call runs under [`RequestContext::run`],
//! so cancelling the token or hitting the deadline returns promptly with
//! [`ClientError::Cancelled`] or [`ClientError::Timeout`] instead of blocking.

use crate::error::{ClientError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline for one client call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context bound to an existing cancellation token.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Default::default()
        }
    }

    /// Set a deadline `timeout` from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        match (self.deadline, self.timeout) {
            (Some(deadline), Some(timeout)) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(ClientError::Timeout(timeout)),
                    res = fut => res,
                }
            }
            _ => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
                    res = fut => res,
                }
            }
        }
    }
}
