//! Commit hooks: the sole bridge between source-record mutations and
//! event side-effects.
//!
//! Observers are notified while a transaction stages writes; anything
//! they want to happen as a consequence goes into the hook queue. The
//! queue runs only after the transaction commits, so an aborted
//! transaction produces no side-effects and a failing side-effect can
//! never abort the transaction that triggered it.

use crate::core::SourceRecord;

/// A deferred side-effect, executed after commit.
pub type CommitHook = Box<dyn FnOnce() + Send>;

/// Queue of side-effects attached to one transaction.
#[derive(Default)]
pub struct CommitQueue {
    hooks: Vec<CommitHook>,
}

impl CommitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `hook` until the enclosing transaction commits.
    pub fn defer(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run all queued hooks in registration order.
    pub(crate) fn run(self) {
        for hook in self.hooks {
            hook();
        }
    }
}

/// Observer of source-record lifecycle transitions.
///
/// Implementations must not touch the repository synchronously from
/// these callbacks; they enqueue work on the commit queue instead.
pub trait SourceObserver: Send + Sync {
    /// A record is being inserted by the current transaction.
    fn source_created(&self, record: &SourceRecord, queue: &mut CommitQueue);

    /// A record is being updated; `old` is the pre-transaction state.
    fn source_updated(&self, old: &SourceRecord, new: &SourceRecord, queue: &mut CommitQueue);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_queue_runs_hooks_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut queue = CommitQueue::new();

        for expected in 0..3usize {
            let counter = Arc::clone(&counter);
            queue.defer(move || {
                assert_eq!(counter.fetch_add(1, Ordering::SeqCst), expected);
            });
        }

        assert_eq!(queue.len(), 3);
        queue.run();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dropped_queue_runs_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut queue = CommitQueue::new();
        let hook_counter = Arc::clone(&counter);
        queue.defer(move || {
            hook_counter.fetch_add(1, Ordering::SeqCst);
        });

        drop(queue);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
