//! Reversal closure pairs for the three mutation shapes.
//!
//! Server-assigned identifiers are not preserved across a delete/re-create
//! cycle, so the three patterns are *not* symmetric:
//!
//! | pattern | undo | redo |
//! |---|---|---|
//! | delete | re-create from snapshot, stamp the cell | delete the cell's id, falling back to the original |
//! | create | delete the original id | re-create from snapshot (minted id discarded) |
//! | update | send previous snapshot to the fixed id | send new snapshot to the fixed id |
//!
//! The delete pattern re-stamps [`RecreatedIdCell`] on every undo, so
//! delete↔undo↔redo chains track the live identifier indefinitely. The
//! create pattern keeps the inherited one-cycle limitation: a second undo
//! after a redo targets the original, by-then-stale identifier. See
//! [`create_reversal`] before relying on repeated create cycles.

use crate::model::{EntityId, EntityKind, RecreatedIdCell, ReversalFn};
use async_trait::async_trait;
use std::sync::Arc;

/// The remote store's CRUD surface, as seen by stored reversal closures.
/// One implementation per transport; tests use in-memory fakes.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    /// Create a record and return the identifier the server minted for it.
    async fn create(&self, kind: EntityKind, state: &serde_json::Value)
    -> anyhow::Result<EntityId>;

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        state: &serde_json::Value,
    ) -> anyhow::Result<()>;

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> anyhow::Result<()>;
}

/// Closure pair reversing a deletion.
///
/// `cell` must be the same cell handed to
/// [`TrackMutation::with_recreated_id`](crate::tracker::TrackMutation::with_recreated_id)
/// so the recorded action exposes the drift for inspection. Undo re-creates
/// the record from `snapshot` and stamps whatever id the server minted;
/// redo deletes the stamped id, or the original when no undo has run yet.
#[must_use]
pub fn delete_reversal(
    gateway: Arc<dyn EntityGateway>,
    kind: EntityKind,
    original_id: EntityId,
    snapshot: serde_json::Value,
    cell: RecreatedIdCell,
) -> (ReversalFn, ReversalFn) {
    let undo: ReversalFn = {
        let gateway = Arc::clone(&gateway);
        let cell = cell.clone();
        Box::new(move || {
            let gateway = Arc::clone(&gateway);
            let snapshot = snapshot.clone();
            let cell = cell.clone();
            Box::pin(async move {
                let minted = gateway.create(kind, &snapshot).await?;
                cell.set(minted);
                Ok(())
            })
        })
    };

    let redo: ReversalFn = Box::new(move || {
        let gateway = Arc::clone(&gateway);
        let cell = cell.clone();
        let original_id = original_id.clone();
        Box::pin(async move {
            // The original id is only reachable when no undo has run yet,
            // which the stack discipline rules out; kept as a fallback.
            let target = cell.get().unwrap_or(original_id);
            gateway.delete(kind, &target).await
        })
    });

    (undo, redo)
}

/// Closure pair reversing a creation.
///
/// Safe for a single undo→redo cycle only: redo re-creates from
/// `new_state` but discards the minted identifier, so a *second* undo
/// deletes the stale `created_id`. Inherited behavior, kept deliberately —
/// extending the delete pattern's cell here would change observable
/// semantics for existing callers.
#[must_use]
pub fn create_reversal(
    gateway: Arc<dyn EntityGateway>,
    kind: EntityKind,
    created_id: EntityId,
    new_state: serde_json::Value,
) -> (ReversalFn, ReversalFn) {
    let undo: ReversalFn = {
        let gateway = Arc::clone(&gateway);
        let created_id = created_id.clone();
        Box::new(move || {
            let gateway = Arc::clone(&gateway);
            let created_id = created_id.clone();
            Box::pin(async move { gateway.delete(kind, &created_id).await })
        })
    };

    let redo: ReversalFn = Box::new(move || {
        let gateway = Arc::clone(&gateway);
        let new_state = new_state.clone();
        Box::pin(async move {
            gateway.create(kind, &new_state).await?;
            Ok(())
        })
    });

    (undo, redo)
}

/// Closure pair reversing an in-place update. The identifier never drifts.
#[must_use]
pub fn update_reversal(
    gateway: Arc<dyn EntityGateway>,
    kind: EntityKind,
    id: EntityId,
    previous_state: serde_json::Value,
    new_state: serde_json::Value,
) -> (ReversalFn, ReversalFn) {
    let undo: ReversalFn = {
        let gateway = Arc::clone(&gateway);
        let id = id.clone();
        Box::new(move || {
            let gateway = Arc::clone(&gateway);
            let id = id.clone();
            let previous_state = previous_state.clone();
            Box::pin(async move { gateway.update(kind, &id, &previous_state).await })
        })
    };

    let redo: ReversalFn = Box::new(move || {
        let gateway = Arc::clone(&gateway);
        let id = id.clone();
        let new_state = new_state.clone();
        Box::pin(async move { gateway.update(kind, &id, &new_state).await })
    });

    (undo, redo)
}
