//! Property tests for the stack discipline: capacity eviction, branch
//! discard, and predicate coupling hold under arbitrary operation
//! sequences, checked against a trivial reference model.

use proptest::prelude::*;
use rewind_core::config::EngineConfig;
use rewind_core::history::HistoryStore;
use rewind_core::model::{Action, ActionKind, EntityId, EntityKind, RecreatedIdCell, ReversalFn};

fn noop() -> ReversalFn {
    Box::new(|| Box::pin(async { Ok(()) }))
}

fn numbered_action(n: i64) -> Action {
    Action {
        id: format!("story-{n}-0"),
        kind: ActionKind::Update,
        entity_kind: EntityKind::Story,
        entity_id: EntityId::from(n),
        entity_name: None,
        previous_state: None,
        new_state: None,
        description: format!("Updated story #{n}"),
        recreated_id: RecreatedIdCell::new(),
        undo_fn: noop(),
        redo_fn: noop(),
        recorded_at_ms: 0,
    }
}

fn bounded_store(capacity: usize) -> HistoryStore {
    HistoryStore::with_config(&EngineConfig {
        max_history: capacity,
        ..EngineConfig::default()
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("build test runtime")
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Push,
    Undo,
    Redo,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Push), Just(Op::Undo), Just(Op::Redo)]
}

/// Reference model: the same discipline over two plain vectors.
#[derive(Debug, Default)]
struct Model {
    done: Vec<i64>,
    undone: Vec<i64>,
    next: i64,
}

impl Model {
    fn push(&mut self, capacity: usize) -> i64 {
        let id = self.next;
        self.next += 1;
        self.done.push(id);
        if self.done.len() > capacity {
            self.done.remove(0);
        }
        self.undone.clear();
        id
    }

    fn undo(&mut self) {
        if let Some(id) = self.done.pop() {
            self.undone.insert(0, id);
        }
    }

    fn redo(&mut self) {
        if !self.undone.is_empty() {
            let id = self.undone.remove(0);
            self.done.push(id);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn eviction_keeps_only_the_newest(capacity in 1usize..8, pushes in 0usize..40) {
        let rt = runtime();
        rt.block_on(async {
            let store = bounded_store(capacity);
            for n in 0..pushes {
                store.push(numbered_action(n as i64));
            }
            let expected = pushes.min(capacity);
            prop_assert_eq!(store.depths(), (expected, 0));

            // Unwind the whole stack: ids must come back newest-first and
            // cover exactly the `expected` most recent pushes.
            for offset in 0..expected {
                let tail = store.last_action().expect("non-empty while unwinding");
                prop_assert_eq!(
                    tail.entity_id.clone(),
                    EntityId::from((pushes - 1 - offset) as i64)
                );
                store.undo().await.expect("noop undo succeeds");
            }
            prop_assert!(!store.can_undo());
            Ok(())
        })?;
    }

    #[test]
    fn stack_discipline_matches_reference_model(
        capacity in 1usize..6,
        ops in proptest::collection::vec(arb_op(), 0..60),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = bounded_store(capacity);
            let mut model = Model::default();

            for op in ops {
                match op {
                    Op::Push => {
                        let id = model.push(capacity);
                        store.push(numbered_action(id));
                        let (_, undone) = store.depths();
                        prop_assert_eq!(undone, 0, "push must clear the redo branch");
                    }
                    Op::Undo => {
                        model.undo();
                        store.undo().await.expect("noop undo succeeds");
                    }
                    Op::Redo => {
                        model.redo();
                        store.redo().await.expect("noop redo succeeds");
                    }
                }

                prop_assert_eq!(store.depths(), (model.done.len(), model.undone.len()));
                prop_assert_eq!(store.can_undo(), !model.done.is_empty());
                prop_assert_eq!(store.can_redo(), !model.undone.is_empty());
                match model.done.last() {
                    Some(&id) => {
                        let tail = store.last_action().expect("model says non-empty");
                        prop_assert_eq!(tail.entity_id.clone(), EntityId::from(id));
                    }
                    None => prop_assert!(store.last_action().is_none()),
                }
            }
            Ok(())
        })?;
    }
}
