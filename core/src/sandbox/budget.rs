use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// External stop signal for a run in progress.
///
/// Clones share the same flag; cancelling any of them stops the run at its
/// next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a checkpoint stopped the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetExceeded {
    Timeout { limit: Duration },
    Cancelled,
}

/// Limits for one run, checked cooperatively.
#[derive(Debug, Clone)]
pub struct Budget {
    timeout: Duration,
    /// `None` when the timeout is too large to represent.
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
    pub max_call_depth: usize,
    pub max_collection_len: usize,
}

impl Budget {
    pub fn new(
        timeout: Duration,
        max_call_depth: usize,
        max_collection_len: usize,
        cancel: Option<CancelToken>,
    ) -> Self {
        Self {
            timeout,
            deadline: Instant::now().checked_add(timeout),
            cancel,
            max_call_depth,
            max_collection_len,
        }
    }

    /// Called at every statement, loop iteration and function call.
    pub fn checkpoint(&self) -> Result<(), BudgetExceeded> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(BudgetExceeded::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(BudgetExceeded::Timeout { limit: self.timeout });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let budget = Budget::new(Duration::from_secs(60), 10, 10, Some(token.clone()));
        assert_eq!(budget.checkpoint(), Ok(()));
        token.cancel();
        assert_eq!(budget.checkpoint(), Err(BudgetExceeded::Cancelled));
    }

    #[test]
    fn test_zero_timeout_expires() {
        let budget = Budget::new(Duration::ZERO, 10, 10, None);
        assert_eq!(
            budget.checkpoint(),
            Err(BudgetExceeded::Timeout { limit: Duration::ZERO })
        );
    }
}
