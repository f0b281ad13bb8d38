//! The recorded unit of reversible work.
//!
//! An [`Action`] pairs a forward mutation that already happened with two
//! stored closures: `undo_fn` reverses it, `redo_fn` reapplies it. Each
//! closure performs one network round trip against the remote store and may
//! reject. Everything on the record is frozen at recording time except
//! [`RecreatedIdCell`], the single mutable cell that tracks identity drift
//! across delete/re-create cycles.

use crate::model::entity::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

/// Future returned by a stored reversal closure.
pub type ReversalFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A stored, repeatable reversal operation. Invoked once per undo or redo;
/// must be callable any number of times because an action can cycle between
/// the stacks indefinitely.
pub type ReversalFn = Box<dyn Fn() -> ReversalFuture + Send + Sync>;

/// What a recorded mutation did to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Best-effort kind inference from a human-readable description.
    ///
    /// Substring match, "deleted" winning over "created", defaulting to
    /// update. This is a convenience for callers that phrase descriptions
    /// the usual way ("Deleted story …"), not a strict classifier.
    #[must_use]
    pub fn infer(description: &str) -> Self {
        let lower = description.to_lowercase();
        if lower.contains("deleted") {
            Self::Delete
        } else if lower.contains("created") {
            Self::Create
        } else {
            Self::Update
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mutable cell that tracks a moving server identifier.
///
/// Undoing a deletion re-creates the record under a *new* server-assigned
/// id. The undo closure of a delete action writes that id here; the redo
/// closure reads it back to target the record that is actually live. The
/// cell is shared between the [`Action`] record (for inspection) and the
/// closures that read and write it, and is re-stamped on every cycle, so
/// delete↔undo↔redo chains stay correct indefinitely.
#[derive(Clone, Default)]
pub struct RecreatedIdCell(Arc<Mutex<Option<EntityId>>>);

impl RecreatedIdCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identifier minted by the most recent re-creation.
    pub fn set(&self, id: EntityId) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    /// The currently live identifier, if a re-creation has happened.
    #[must_use]
    pub fn get(&self) -> Option<EntityId> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for RecreatedIdCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecreatedIdCell").field(&self.get()).finish()
    }
}

/// One recorded, reversible unit of work.
pub struct Action {
    /// Opaque correlation id, `{entity}-{id}-{recorded_at_ms}`.
    pub id: String,
    pub kind: ActionKind,
    pub entity_kind: EntityKind,
    /// Identifier of the subject at recording time. May go stale — redo
    /// paths must prefer `recreated_id` when it is populated.
    pub entity_id: EntityId,
    pub entity_name: Option<String>,
    /// Snapshots used to build descriptions and to feed the closures.
    /// Presence depends on `kind`; never validated at construction.
    pub previous_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
    pub description: String,
    pub recreated_id: RecreatedIdCell,
    pub undo_fn: ReversalFn,
    pub redo_fn: ReversalFn,
    pub recorded_at_ms: i64,
}

impl Action {
    /// Start the stored undo round trip.
    #[must_use]
    pub fn undo(&self) -> ReversalFuture {
        (self.undo_fn)()
    }

    /// Start the stored redo round trip.
    #[must_use]
    pub fn redo(&self) -> ReversalFuture {
        (self.redo_fn)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("entity_kind", &self.entity_kind)
            .field("entity_id", &self.entity_id)
            .field("description", &self.description)
            .field("recreated_id", &self.recreated_id)
            .field("recorded_at_ms", &self.recorded_at_ms)
            .finish_non_exhaustive()
    }
}
