//! Bounded undo/redo sequencing over two stacks.
//!
//! [`HistoryStore`] owns the `done` and `undone` stacks and the two
//! in-flight flags. It is pure sequencing — it runs whatever closures the
//! recorded actions carry and has no awareness of what they talk to.
//!
//! | operation | effect |
//! |---|---|
//! | `push` | append to `done`, evict oldest past capacity, clear `undone` |
//! | `undo` | run tail-of-`done` closure, then move it to head of `undone` |
//! | `redo` | run head-of-`undone` closure, then move it to tail of `done` |
//!
//! Reversals are **peek-then-remove-on-success**: the action stays on its
//! stack while its closure is in flight, so a transient network failure can
//! never lose it. The only ways an action leaves `done` are a successful
//! reversal and capacity eviction.
//!
//! While a closure is awaited the corresponding flag blocks *any* further
//! reversal attempt (either direction, from any caller), but never blocks
//! forward pushes. The internal lock is held only for stack bookkeeping and
//! is never held across an await.

use crate::config::EngineConfig;
use crate::error::ReversalError;
use crate::model::{Action, ReversalFuture};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default bound on retained history.
pub const MAX_HISTORY: usize = 50;

/// How a reversal request resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReversalOutcome {
    /// The closure ran and the action changed stacks.
    Applied,
    /// Nothing to do: empty stack, or another reversal was in flight.
    Skipped,
}

struct Stacks {
    /// Applied actions, oldest first; undo candidates are at the back.
    done: VecDeque<Arc<Action>>,
    /// Undone actions, most recently undone at the front.
    undone: VecDeque<Arc<Action>>,
    undoing: bool,
    redoing: bool,
    last_action_ms: i64,
    capacity: usize,
}

/// The reversible-operation coordinator's history state.
///
/// One explicitly owned instance per session; every subscriber (UI button,
/// keyboard dispatcher, notice click path) holds a reference to the same
/// store rather than reaching into ambient globals.
pub struct HistoryStore {
    inner: Mutex<Stacks>,
    timeout: Option<Duration>,
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(cfg: &EngineConfig) -> Self {
        Self {
            inner: Mutex::new(Stacks {
                done: VecDeque::new(),
                undone: VecDeque::new(),
                undoing: false,
                redoing: false,
                last_action_ms: 0,
                capacity: cfg.max_history,
            }),
            timeout: cfg.reversal_timeout(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Stacks> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a freshly applied forward mutation.
    ///
    /// Evicts the oldest action once past capacity and discards the redo
    /// branch: once a new forward action lands, previously undone actions
    /// are permanently unreachable. Cannot fail.
    pub fn push(&self, action: Action) -> Arc<Action> {
        let action = Arc::new(action);
        let mut s = self.lock();
        s.done.push_back(Arc::clone(&action));
        while s.done.len() > s.capacity {
            if let Some(evicted) = s.done.pop_front() {
                tracing::debug!(action = %evicted.id, "history at capacity, evicted oldest");
            }
        }
        s.undone.clear();
        s.last_action_ms = now_ms();
        action
    }

    /// Reverse the most recent applied action.
    ///
    /// Resolves immediately with [`ReversalOutcome::Skipped`] when there is
    /// nothing to undo or any reversal is already in flight. On closure
    /// failure the stacks are untouched, the flag is cleared, and the error
    /// is surfaced so the same action can be retried.
    ///
    /// # Errors
    ///
    /// [`ReversalError::Failed`] when the stored closure rejects,
    /// [`ReversalError::TimedOut`] when the configured budget elapses first.
    pub async fn undo(&self) -> Result<ReversalOutcome, ReversalError> {
        let action = {
            let mut s = self.lock();
            if s.undoing || s.redoing {
                return Ok(ReversalOutcome::Skipped);
            }
            let Some(tail) = s.done.back() else {
                return Ok(ReversalOutcome::Skipped);
            };
            let tail = Arc::clone(tail);
            s.undoing = true;
            tail
        };

        let result = self.run_budgeted(action.undo()).await;

        let mut s = self.lock();
        s.undoing = false;
        match result {
            Ok(()) => {
                // Remove the action we actually reversed, not a blind tail
                // pop — a forward push may have landed while we awaited.
                if let Some(pos) = s.done.iter().rposition(|a| Arc::ptr_eq(a, &action)) {
                    s.done.remove(pos);
                    s.undone.push_front(Arc::clone(&action));
                }
                s.last_action_ms = now_ms();
                tracing::debug!(action = %action.id, "undo applied");
                Ok(ReversalOutcome::Applied)
            }
            Err(err) => {
                tracing::warn!(action = %action.id, "undo failed: {err}");
                Err(err)
            }
        }
    }

    /// Reapply the most recently undone action. Symmetric to [`undo`].
    ///
    /// # Errors
    ///
    /// Same failure surface as [`undo`].
    ///
    /// [`undo`]: HistoryStore::undo
    pub async fn redo(&self) -> Result<ReversalOutcome, ReversalError> {
        let action = {
            let mut s = self.lock();
            if s.undoing || s.redoing {
                return Ok(ReversalOutcome::Skipped);
            }
            let Some(head) = s.undone.front() else {
                return Ok(ReversalOutcome::Skipped);
            };
            let head = Arc::clone(head);
            s.redoing = true;
            head
        };

        let result = self.run_budgeted(action.redo()).await;

        let mut s = self.lock();
        s.redoing = false;
        match result {
            Ok(()) => {
                if let Some(pos) = s.undone.iter().position(|a| Arc::ptr_eq(a, &action)) {
                    s.undone.remove(pos);
                    s.done.push_back(Arc::clone(&action));
                }
                s.last_action_ms = now_ms();
                tracing::debug!(action = %action.id, "redo applied");
                Ok(ReversalOutcome::Applied)
            }
            Err(err) => {
                tracing::warn!(action = %action.id, "redo failed: {err}");
                Err(err)
            }
        }
    }

    async fn run_budgeted(&self, fut: ReversalFuture) -> Result<(), ReversalError> {
        match self.timeout {
            Some(budget) => match tokio::time::timeout(budget, fut).await {
                Ok(done) => done.map_err(ReversalError::Failed),
                Err(_) => Err(ReversalError::TimedOut { budget }),
            },
            None => fut.await.map_err(ReversalError::Failed),
        }
    }

    /// True iff `done` is non-empty and no reversal is in flight. The flag
    /// check couples both directions on purpose: a stuck undo also reports
    /// `can_redo() == false`, absorbing rapid double key-presses.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        let s = self.lock();
        !s.done.is_empty() && !s.undoing && !s.redoing
    }

    /// Symmetric predicate over `undone`.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        let s = self.lock();
        !s.undone.is_empty() && !s.undoing && !s.redoing
    }

    /// Peek at the next undo candidate.
    #[must_use]
    pub fn last_action(&self) -> Option<Arc<Action>> {
        self.lock().done.back().cloned()
    }

    /// Epoch milliseconds of the last push or successful reversal.
    #[must_use]
    pub fn last_action_ms(&self) -> i64 {
        self.lock().last_action_ms
    }

    /// Current `(done, undone)` stack depths.
    #[must_use]
    pub fn depths(&self) -> (usize, usize) {
        let s = self.lock();
        (s.done.len(), s.undone.len())
    }

    /// Drop all retained history.
    pub fn clear(&self) {
        let mut s = self.lock();
        s.done.clear();
        s.undone.clear();
        s.last_action_ms = 0;
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
