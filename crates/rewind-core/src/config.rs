use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine tunables. Every field has a serde default so a partial TOML
/// document (or an empty one) is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on the done stack; the oldest action is evicted silently
    /// once a push exceeds it.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// How long the transient undo notice stays on screen. The action
    /// itself is retained until eviction regardless.
    #[serde(default = "default_notice_window_ms")]
    pub notice_window_ms: u64,
    /// Budget for a single undo/redo round trip. `0` disables the budget,
    /// restoring the legacy behavior where a hung call wedges the
    /// reversal subsystem until it resolves.
    #[serde(default = "default_reversal_timeout_ms")]
    pub reversal_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            notice_window_ms: default_notice_window_ms(),
            reversal_timeout_ms: default_reversal_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing fields fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid TOML or a field has
    /// the wrong type.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parse engine config")
    }

    #[must_use]
    pub const fn notice_window(&self) -> Duration {
        Duration::from_millis(self.notice_window_ms)
    }

    /// `None` when the budget is disabled.
    #[must_use]
    pub const fn reversal_timeout(&self) -> Option<Duration> {
        if self.reversal_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.reversal_timeout_ms))
        }
    }
}

const fn default_max_history() -> usize {
    crate::history::MAX_HISTORY
}

const fn default_notice_window_ms() -> u64 {
    10_000
}

const fn default_reversal_timeout_ms() -> u64 {
    30_000
}
