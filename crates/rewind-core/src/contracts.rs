//! Collaborator contracts consumed by the coordinator, never implemented
//! here: the audit sink, the transient notice surface, and the query-cache
//! invalidation hook. Feature surfaces plug real implementations in; tests
//! plug recorders in.

use crate::error::ReversalError;
use crate::history::{HistoryStore, ReversalOutcome};
use crate::model::{ActionKind, EntityId, EntityKind};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// One audit entry describing a tracked mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub kind: ActionKind,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub entity_name: String,
    pub description: String,
    pub recorded_at_ms: i64,
}

impl ActivityRecord {
    /// Notification title, e.g. `"Delete story"`.
    #[must_use]
    pub fn title(&self) -> String {
        let kind = self.kind.as_str();
        let mut title = String::with_capacity(kind.len() + 1 + self.entity_kind.as_str().len());
        let mut chars = kind.chars();
        if let Some(first) = chars.next() {
            title.extend(first.to_uppercase());
            title.push_str(chars.as_str());
        }
        title.push(' ');
        title.push_str(self.entity_kind.as_str());
        title
    }
}

/// Best-effort audit sink. The tracker fires reports on a detached task and
/// swallows every error, so implementations may fail freely; they must not
/// block interactive work.
#[async_trait]
pub trait ActivityReporter: Send + Sync {
    async fn report(&self, record: ActivityRecord) -> anyhow::Result<()>;

    /// Batch variant; the default just loops, sinks with a bulk endpoint
    /// can override.
    async fn report_batch(&self, records: Vec<ActivityRecord>) -> anyhow::Result<()> {
        for record in records {
            self.report(record).await?;
        }
        Ok(())
    }
}

/// Idempotent invalidation of one cached query partition. Always safe to
/// call, even when nothing under the key changed.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, partition: &str);
}

/// Severity of a transient outcome notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// Payload for the transient "Undo" affordance shown after a tracked
/// mutation. `auto_dismiss` only bounds the notice: the action stays
/// undoable from the keyboard long after the notice is gone.
pub struct UndoNotice {
    pub description: String,
    pub auto_dismiss: Duration,
    pub undo: UndoHandle,
}

impl fmt::Debug for UndoNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoNotice")
            .field("description", &self.description)
            .field("auto_dismiss", &self.auto_dismiss)
            .finish_non_exhaustive()
    }
}

/// Transient notice surface.
pub trait NotificationPresenter: Send + Sync {
    /// Show the undo affordance for a freshly tracked mutation.
    fn present_undo(&self, notice: UndoNotice);

    /// Show a short-lived outcome message ("Undone …", "Failed to redo").
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Non-owning trigger for the notice click path.
///
/// Holds a `Weak` reference so a notice that outlives the session (or a
/// test fixture) degrades to a no-op instead of keeping the store alive.
#[derive(Clone)]
pub struct UndoHandle {
    store: Weak<HistoryStore>,
}

impl UndoHandle {
    #[must_use]
    pub fn new(store: &Arc<HistoryStore>) -> Self {
        Self {
            store: Arc::downgrade(store),
        }
    }

    /// Run one undo through the shared store.
    ///
    /// # Errors
    ///
    /// Propagates the store's [`ReversalError`]; a dropped store resolves
    /// as [`ReversalOutcome::Skipped`].
    pub async fn trigger(&self) -> Result<ReversalOutcome, ReversalError> {
        match self.store.upgrade() {
            Some(store) => store.undo().await,
            None => Ok(ReversalOutcome::Skipped),
        }
    }
}

impl fmt::Debug for UndoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHandle")
            .field("alive", &(self.store.strong_count() > 0))
            .finish()
    }
}
