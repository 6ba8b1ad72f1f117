// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use authoring_app_core::config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory implementation of [`ConfigStore`] that counts calls and can be
/// told to fail.
///
/// # Example
///
/// ```
/// use authoring_dry_tests::InMemoryConfigStore;
/// use authoring_app_core::config::ConfigService;
/// use authoring_app_core::prefs::{EditorPrefs, EDITOR_PREFS_KEY};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// let prefs: EditorPrefs = service.load_or_init(EDITOR_PREFS_KEY).unwrap();
/// assert_eq!(prefs, EditorPrefs::default());
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw entries.
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                ..Inner::default()
            })),
        }
    }

    /// Store holding one JSON document under `key`.
    pub fn with_json(key: &str, value: &serde_json::Value) -> Self {
        let mut data = HashMap::new();
        data.insert(key.to_string(), value.to_string().into_bytes());
        Self::with_data(data)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every load fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Make every save fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Attempted loads, including failed ones.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Attempted saves, including failed ones.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Raw bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().data.get(key).cloned()
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use authoring_app_core::config::ConfigService;
    use authoring_app_core::prefs::{EditorPrefs, EDITOR_PREFS_KEY};
    use serde_json::json;

    #[test]
    fn missing_key_is_not_found() {
        let store = InMemoryConfigStore::new();
        assert!(matches!(store.load_raw("prefs"), Err(ConfigError::NotFound)));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn stored_prefs_override_defaults() {
        let store =
            InMemoryConfigStore::with_json(EDITOR_PREFS_KEY, &json!({"history_page_size": 5}));
        let prefs: EditorPrefs = ConfigService::new(store.clone())
            .load_or_init(EDITOR_PREFS_KEY)
            .unwrap();
        assert_eq!(prefs.history_page_size, 5);
        assert_eq!(prefs.max_toasts, EditorPrefs::default().max_toasts);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn save_failure_is_reported_and_counted() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        assert!(matches!(
            store.save_raw("prefs", b"{}"),
            Err(ConfigError::Other(_))
        ));
        assert_eq!(store.save_count(), 1);
        assert!(!store.contains_key("prefs"));
    }
}
