//! Per-request context
//!
//! Carries cancellation and an optional deadline into every remote call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{GmailApiError, Result};

/// Cancellation and deadline for one provider operation
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled together with `token`
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Derive a context that also expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            cancel: self.cancel.child_token(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    /// Derive a context cancelled with this one but cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and its children
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until this context is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(GmailApiError::Cancelled.into());
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(GmailApiError::DeadlineExceeded.into());
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(GmailApiError::DeadlineExceeded.into()),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GmailApiError::Cancelled.into()),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn test_run_completes() {
        let ctx = RequestContext::background();
        let value = tokio_test::block_on(ctx.run(async { Ok::<_, ProviderError>(42) })).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_cancelled_before_start() {
        let ctx = RequestContext::background();
        ctx.cancel();
        let err = tokio_test::block_on(ctx.run(async { Ok::<_, ProviderError>(()) })).unwrap_err();
        assert!(matches!(err, ProviderError::Gmail(GmailApiError::Cancelled)));
    }

    #[test]
    fn test_parent_cancels_child() {
        let parent = RequestContext::background();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_does_not_cancel_parent() {
        let parent = RequestContext::background();
        let child = parent.with_timeout(Duration::from_secs(5));
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(10));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ProviderError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Gmail(GmailApiError::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_in_flight() {
        let ctx = RequestContext::background();
        let handle = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ProviderError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Gmail(GmailApiError::Cancelled)));
    }

    #[test]
    fn test_nested_timeout_keeps_earliest_deadline() {
        tokio_test::block_on(async {
            let outer = RequestContext::background().with_timeout(Duration::from_secs(1));
            let inner = outer.with_timeout(Duration::from_secs(60));
            assert_eq!(inner.deadline(), outer.deadline());
        });
    }
}
