// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Editor preferences persisted through the config service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Config key the editor preferences live under.
pub const EDITOR_PREFS_KEY: &str = "authoring_editor";

/// Largest commit log page the editor will request.
pub const MAX_HISTORY_PAGE: usize = 100;

/// Saved settings for the editor and its tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPrefs {
    /// Base URL of the authoring server.
    pub api_base_url: String,
    /// CSRF token sent on mutating requests, when the server issued one.
    pub csrf_token: Option<String>,
    /// Quiet period after the last keystroke before autosave fires.
    pub autosave_debounce_ms: u64,
    /// Commit log page size.
    pub history_page_size: usize,
    /// Lifetime of transient toasts.
    pub toast_ttl_ms: u64,
    /// Maximum queued toasts.
    pub max_toasts: usize,
}

impl Default for EditorPrefs {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            csrf_token: None,
            autosave_debounce_ms: 1_500,
            history_page_size: 20,
            toast_ttl_ms: 6_000,
            max_toasts: 8,
        }
    }
}

impl EditorPrefs {
    /// Autosave quiet period.
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Transient toast lifetime.
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    /// History page size clamped to `1..=MAX_HISTORY_PAGE`.
    pub fn page_size(&self) -> usize {
        self.history_page_size.clamp(1, MAX_HISTORY_PAGE)
    }
}
