//! Cooperative cancellation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::SearchError;

/// A cheaply cloneable cancellation flag shared between a search and its caller.
///
/// Cancellation is polled, never preemptive: the dispatcher checks the flag before
/// opening each container and before each decoded index entry.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Set once cancellation has been requested.
    cancelled: Arc<AtomicBool>,
    /// Token whose cancellation this one observes.
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token cancelled along with this one.
    ///
    /// Cancelling the child leaves this token untouched.
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::default(),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Requests cancellation. Every clone and child of this token observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.parent.as_ref().is_some_and(|parent| parent.is_cancelled())
    }

    /// Returns [`SearchError::Cancelled`] if cancellation has been requested.
    pub fn check(&self) -> Result<(), SearchError> {
        if self.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(clone.check().is_ok());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.check().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_child_observes_parent_but_not_the_reverse() {
        let parent = CancellationToken::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let sibling = parent.child();
        assert!(!sibling.is_cancelled());
        parent.cancel();
        assert!(sibling.check().unwrap_err().is_cancelled());
    }
}
