//! Keyboard shortcut routing into the history engine.
//!
//! Global, capture-phase in spirit: the embedding surface feeds every key
//! event through [`InputDispatcher::dispatch`] before its own handling and
//! stops propagation when the dispatcher reports the event consumed.
//! Events landing while an editable text widget has focus are passed
//! through untouched so shortcuts never interfere with typing.
//!
//! Bindings: `primary+z` undoes, `primary+shift+z` and `primary+y` redo,
//! where the primary modifier is Command on Apple platforms and Control
//! everywhere else. A shortcut whose predicate is currently false (empty
//! stack, reversal in flight) is absorbed silently — consumed, no error,
//! no store call.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rewind_core::HistoryStore;
use std::sync::Arc;

/// What a key event asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

/// Where the event was headed when it reached the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    /// A text-input-like element owns focus; shortcuts are suppressed.
    EditableText,
    /// Anything else.
    General,
}

/// Which modifier plays the primary role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Command-key platforms (macOS, iOS).
    MacLike,
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::MacLike
        } else {
            Self::Other
        }
    }

    const fn primary(self) -> KeyModifiers {
        match self {
            Self::MacLike => KeyModifiers::SUPER,
            Self::Other => KeyModifiers::CONTROL,
        }
    }
}

/// Whether the embedder should stop propagating the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The event matched a shortcut; do not forward it further.
    Consumed,
    /// Not ours; handle normally.
    Pass,
}

/// Routes undo/redo shortcuts into a shared [`HistoryStore`].
pub struct InputDispatcher {
    history: Arc<HistoryStore>,
    platform: Platform,
}

impl InputDispatcher {
    #[must_use]
    pub fn new(history: Arc<HistoryStore>) -> Self {
        Self::with_platform(history, Platform::detect())
    }

    #[must_use]
    pub fn with_platform(history: Arc<HistoryStore>, platform: Platform) -> Self {
        Self { history, platform }
    }

    /// Pure interpretation: which shortcut, if any, does this event name.
    #[must_use]
    pub fn interpret(&self, key: &KeyEvent, target: KeyTarget) -> Option<Shortcut> {
        if target == KeyTarget::EditableText {
            return None;
        }
        if !key.modifiers.contains(self.platform.primary()) {
            return None;
        }
        match key.code {
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'z') => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    Some(Shortcut::Redo)
                } else {
                    Some(Shortcut::Undo)
                }
            }
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'y') => Some(Shortcut::Redo),
            _ => None,
        }
    }

    /// Interpret and execute. A matching shortcut is always consumed; it
    /// only reaches the store when the corresponding predicate holds, and
    /// a reversal failure is logged rather than surfaced — the failure
    /// notice is the tracker's job, not the key handler's.
    pub async fn dispatch(&self, key: &KeyEvent, target: KeyTarget) -> Dispatch {
        let Some(shortcut) = self.interpret(key, target) else {
            return Dispatch::Pass;
        };
        match shortcut {
            Shortcut::Undo if self.history.can_undo() => {
                if let Err(err) = self.history.undo().await {
                    tracing::warn!("undo shortcut failed: {err}");
                }
            }
            Shortcut::Redo if self.history.can_redo() => {
                if let Err(err) = self.history.redo().await {
                    tracing::warn!("redo shortcut failed: {err}");
                }
            }
            Shortcut::Undo | Shortcut::Redo => {}
        }
        Dispatch::Consumed
    }
}
