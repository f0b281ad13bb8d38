//! Builds reversible actions out of forward mutations.
//!
//! A feature surface performs its forward mutation first, then hands the
//! already-known previous/new state and the two inverse closures to
//! [`MutationTracker::track_mutation`]. The tracker wraps the closures with
//! cache invalidation, pushes the action into the shared
//! [`HistoryStore`], fires a detached audit report, and surfaces the
//! transient undo notice. It never waits for any reversal.

use crate::config::EngineConfig;
use crate::contracts::{
    ActivityRecord, ActivityReporter, CacheInvalidator, NoticeLevel, NotificationPresenter,
    UndoHandle, UndoNotice,
};
use crate::error::ReversalError;
use crate::history::{HistoryStore, ReversalOutcome};
use crate::model::{Action, ActionKind, EntityId, EntityKind, RecreatedIdCell, ReversalFn};
use std::sync::Arc;
use std::time::Duration;

/// Everything a caller declares about a forward mutation it just performed.
///
/// `on_undo` and `on_redo` are the inverse and re-apply round trips; the
/// tracker wraps both so the listed cache partitions are invalidated after
/// each success. `recreated_id` defaults to an empty cell — delete-pattern
/// callers pass the cell their closures share (see
/// [`patterns::delete_reversal`](crate::patterns::delete_reversal)).
pub struct TrackMutation {
    pub kind: Option<ActionKind>,
    pub description: String,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub entity_name: Option<String>,
    pub previous_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
    pub on_undo: ReversalFn,
    pub on_redo: ReversalFn,
    pub invalidate_keys: Vec<String>,
    pub recreated_id: RecreatedIdCell,
}

impl TrackMutation {
    pub fn new(
        description: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: impl Into<EntityId>,
        on_undo: ReversalFn,
        on_redo: ReversalFn,
    ) -> Self {
        Self {
            kind: None,
            description: description.into(),
            entity_kind,
            entity_id: entity_id.into(),
            entity_name: None,
            previous_state: None,
            new_state: None,
            on_undo,
            on_redo,
            invalidate_keys: Vec::new(),
            recreated_id: RecreatedIdCell::new(),
        }
    }

    /// Declare the kind explicitly instead of inferring it from the
    /// description.
    #[must_use]
    pub fn with_kind(mut self, kind: ActionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_previous_state(mut self, state: serde_json::Value) -> Self {
        self.previous_state = Some(state);
        self
    }

    #[must_use]
    pub fn with_new_state(mut self, state: serde_json::Value) -> Self {
        self.new_state = Some(state);
        self
    }

    #[must_use]
    pub fn invalidating(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.invalidate_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_recreated_id(mut self, cell: RecreatedIdCell) -> Self {
        self.recreated_id = cell;
        self
    }
}

/// Records reversible actions and owns the tracker-side collaborators.
pub struct MutationTracker {
    history: Arc<HistoryStore>,
    reporter: Arc<dyn ActivityReporter>,
    presenter: Arc<dyn NotificationPresenter>,
    cache: Arc<dyn CacheInvalidator>,
    notice_window: Duration,
}

impl MutationTracker {
    pub fn new(
        history: Arc<HistoryStore>,
        reporter: Arc<dyn ActivityReporter>,
        presenter: Arc<dyn NotificationPresenter>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self::with_config(history, reporter, presenter, cache, &EngineConfig::default())
    }

    pub fn with_config(
        history: Arc<HistoryStore>,
        reporter: Arc<dyn ActivityReporter>,
        presenter: Arc<dyn NotificationPresenter>,
        cache: Arc<dyn CacheInvalidator>,
        cfg: &EngineConfig,
    ) -> Self {
        Self {
            history,
            reporter,
            presenter,
            cache,
            notice_window: cfg.notice_window(),
        }
    }

    #[must_use]
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Record a reversible action for a forward mutation that already
    /// succeeded. Returns once the action is on the done stack; the audit
    /// report runs detached and can neither delay nor fail this call.
    pub async fn track_mutation(&self, mutation: TrackMutation) -> Arc<Action> {
        let TrackMutation {
            kind,
            description,
            entity_kind,
            entity_id,
            entity_name,
            previous_state,
            new_state,
            on_undo,
            on_redo,
            invalidate_keys,
            recreated_id,
        } = mutation;

        let kind = kind.unwrap_or_else(|| ActionKind::infer(&description));
        let recorded_at_ms = chrono::Utc::now().timestamp_millis();
        let id = format!("{entity_kind}-{entity_id}-{recorded_at_ms}");

        let undo_fn = with_invalidation(
            on_undo,
            invalidate_keys.clone(),
            Arc::clone(&self.cache),
            "undo",
        );
        let redo_fn = with_invalidation(on_redo, invalidate_keys, Arc::clone(&self.cache), "redo");

        let record = ActivityRecord {
            kind,
            entity_kind,
            entity_id: entity_id.clone(),
            entity_name: entity_name
                .clone()
                .unwrap_or_else(|| description.clone()),
            description: description.clone(),
            recorded_at_ms,
        };

        let action = self.history.push(Action {
            id,
            kind,
            entity_kind,
            entity_id,
            entity_name,
            previous_state,
            new_state,
            description: description.clone(),
            recreated_id,
            undo_fn,
            redo_fn,
            recorded_at_ms,
        });

        // Detached, never joined: the audit sink has its own error
        // boundary and no ordering relationship with the action.
        let reporter = Arc::clone(&self.reporter);
        tokio::spawn(async move {
            if let Err(err) = reporter.report(record).await {
                tracing::warn!("activity report dropped: {err:#}");
            }
        });

        self.presenter.present_undo(UndoNotice {
            description,
            auto_dismiss: self.notice_window,
            undo: UndoHandle::new(&self.history),
        });

        action
    }

    /// Undo through the shared store, surfacing the outcome as a notice.
    ///
    /// # Errors
    ///
    /// Propagates the store's [`ReversalError`] after presenting the
    /// failure notice.
    pub async fn undo(&self) -> Result<ReversalOutcome, ReversalError> {
        match self.history.undo().await {
            Ok(ReversalOutcome::Applied) => {
                self.presenter
                    .notify(NoticeLevel::Success, "Undone (Ctrl+Y to redo)");
                Ok(ReversalOutcome::Applied)
            }
            Ok(ReversalOutcome::Skipped) => Ok(ReversalOutcome::Skipped),
            Err(err) => {
                self.presenter.notify(NoticeLevel::Failure, "Failed to undo");
                Err(err)
            }
        }
    }

    /// Redo counterpart of [`undo`](MutationTracker::undo).
    ///
    /// # Errors
    ///
    /// Propagates the store's [`ReversalError`] after presenting the
    /// failure notice.
    pub async fn redo(&self) -> Result<ReversalOutcome, ReversalError> {
        match self.history.redo().await {
            Ok(ReversalOutcome::Applied) => {
                self.presenter
                    .notify(NoticeLevel::Success, "Redone (Ctrl+Z to undo)");
                Ok(ReversalOutcome::Applied)
            }
            Ok(ReversalOutcome::Skipped) => Ok(ReversalOutcome::Skipped),
            Err(err) => {
                self.presenter.notify(NoticeLevel::Failure, "Failed to redo");
                Err(err)
            }
        }
    }
}

/// Wrap a reversal closure so the declared cache partitions are invalidated
/// after every success. Failures are logged and re-propagated untouched;
/// nothing is invalidated for a round trip that did not land.
fn with_invalidation(
    inner: ReversalFn,
    keys: Vec<String>,
    cache: Arc<dyn CacheInvalidator>,
    direction: &'static str,
) -> ReversalFn {
    Box::new(move || {
        let fut = inner();
        let keys = keys.clone();
        let cache = Arc::clone(&cache);
        Box::pin(async move {
            if let Err(err) = fut.await {
                tracing::warn!("{direction} round trip failed: {err:#}");
                return Err(err);
            }
            for key in &keys {
                cache.invalidate(key);
            }
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> ReversalFn {
        Box::new(|| Box::pin(async { Ok(()) }))
    }

    struct Recorder {
        invalidated: Mutex<Vec<String>>,
        notices: Mutex<Vec<(NoticeLevel, String)>>,
        undo_notices: AtomicUsize,
        reports: AtomicUsize,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                invalidated: Mutex::new(Vec::new()),
                notices: Mutex::new(Vec::new()),
                undo_notices: AtomicUsize::new(0),
                reports: AtomicUsize::new(0),
            })
        }
    }

    impl CacheInvalidator for Recorder {
        fn invalidate(&self, partition: &str) {
            self.invalidated
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(partition.to_string());
        }
    }

    impl NotificationPresenter for Recorder {
        fn present_undo(&self, _notice: UndoNotice) {
            self.undo_notices.fetch_add(1, Ordering::SeqCst);
        }

        fn notify(&self, level: NoticeLevel, message: &str) {
            self.notices
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((level, message.to_string()));
        }
    }

    #[async_trait::async_trait]
    impl ActivityReporter for Recorder {
        async fn report(&self, _record: ActivityRecord) -> anyhow::Result<()> {
            self.reports.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn tracker(recorder: &Arc<Recorder>) -> MutationTracker {
        MutationTracker::new(
            Arc::new(HistoryStore::new()),
            Arc::clone(recorder) as Arc<dyn ActivityReporter>,
            Arc::clone(recorder) as Arc<dyn NotificationPresenter>,
            Arc::clone(recorder) as Arc<dyn CacheInvalidator>,
        )
    }

    #[tokio::test]
    async fn track_mutation_infers_kind_and_pushes() {
        let recorder = Recorder::new();
        let tracker = tracker(&recorder);

        let action = tracker
            .track_mutation(TrackMutation::new(
                "Deleted story \"Checkout flow\"",
                EntityKind::Story,
                10,
                noop(),
                noop(),
            ))
            .await;

        assert_eq!(action.kind, ActionKind::Delete);
        assert_eq!(tracker.history().depths(), (1, 0));
        assert_eq!(recorder.undo_notices.load(Ordering::SeqCst), 1);
        assert!(action.id.starts_with("story-10-"));
    }

    #[tokio::test]
    async fn explicit_kind_wins_over_inference() {
        let recorder = Recorder::new();
        let tracker = tracker(&recorder);

        let action = tracker
            .track_mutation(
                TrackMutation::new(
                    "Deleted fields rolled back",
                    EntityKind::Project,
                    3,
                    noop(),
                    noop(),
                )
                .with_kind(ActionKind::Update),
            )
            .await;

        assert_eq!(action.kind, ActionKind::Update);
    }

    #[tokio::test]
    async fn cache_invalidation_runs_after_successful_undo_only() {
        let recorder = Recorder::new();
        let tracker = tracker(&recorder);

        let attempts = Arc::new(AtomicUsize::new(0));
        let undo: ReversalFn = {
            let attempts = Arc::clone(&attempts);
            Box::new(move || {
                let attempts = Arc::clone(&attempts);
                Box::pin(async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("502 from gateway");
                    }
                    Ok(())
                })
            })
        };

        tracker
            .track_mutation(
                TrackMutation::new("Updated story \"x\"", EntityKind::Story, 4, undo, noop())
                    .invalidating(["stories"]),
            )
            .await;

        assert!(tracker.undo().await.is_err());
        assert!(
            recorder
                .invalidated
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_empty(),
            "failed round trip must not invalidate"
        );

        tracker.undo().await.unwrap();
        assert_eq!(
            *recorder
                .invalidated
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
            vec!["stories".to_string()]
        );
    }

    #[tokio::test]
    async fn undo_wrapper_presents_outcome_notices() {
        let recorder = Recorder::new();
        let tracker = tracker(&recorder);

        tracker
            .track_mutation(TrackMutation::new(
                "Updated epic \"Q3\"",
                EntityKind::Epic,
                8,
                noop(),
                noop(),
            ))
            .await;

        tracker.undo().await.unwrap();
        tracker.redo().await.unwrap();
        // Skipped reversals stay silent.
        tracker.redo().await.unwrap();

        let notices = recorder
            .notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert_eq!(
            notices,
            vec![
                (NoticeLevel::Success, "Undone (Ctrl+Y to redo)".to_string()),
                (NoticeLevel::Success, "Redone (Ctrl+Z to undo)".to_string()),
            ]
        );
    }
}
