//! Reversible-operation coordinator.
//!
//! Lets a client undo and redo create/update/delete operations performed
//! against a remote, network-backed store. Each recorded action wraps two
//! independent asynchronous round trips: the forward effect (already
//! executed by the time it is tracked) and the inverse effect, executed
//! later on demand. The engine protects a small set of hard invariants:
//! bounded history with silent eviction, mutual exclusion between
//! concurrent reversals, strict LIFO with branch discard, and identity
//! drift — undoing a deletion re-creates the record under a *new*
//! server-assigned identifier, so later reversals must chase a moving
//! target.
//!
//! # Module layout
//!
//! - [`model`] — entity tags, server ids, [`Action`](model::Action), and
//!   the [`RecreatedIdCell`](model::RecreatedIdCell) drift cell.
//! - [`history`] — [`HistoryStore`](history::HistoryStore): the two
//!   bounded stacks and the in-flight flags.
//! - [`tracker`] — [`MutationTracker`](tracker::MutationTracker): records
//!   actions, wraps closures with cache invalidation, fires detached audit
//!   reports, presents the undo notice.
//! - [`patterns`] — reversal closure pairs for the delete/create/update
//!   shapes over an [`EntityGateway`](patterns::EntityGateway).
//! - [`contracts`] — collaborator traits consumed, not implemented here.
//! - [`config`], [`error`] — tunables and the reversal failure surface.
//!
//! History lives in memory only: nothing survives the session, and there
//! is no cross-tab coordination.

pub mod config;
pub mod contracts;
pub mod error;
pub mod history;
pub mod model;
pub mod patterns;
pub mod tracker;

pub use config::EngineConfig;
pub use contracts::{
    ActivityRecord, ActivityReporter, CacheInvalidator, NoticeLevel, NotificationPresenter,
    UndoHandle, UndoNotice,
};
pub use error::ReversalError;
pub use history::{HistoryStore, MAX_HISTORY, ReversalOutcome};
pub use model::{Action, ActionKind, EntityId, EntityKind, RecreatedIdCell, ReversalFn};
pub use patterns::EntityGateway;
pub use tracker::{MutationTracker, TrackMutation};
