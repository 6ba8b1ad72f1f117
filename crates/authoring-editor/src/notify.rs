// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared toast queue handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use authoring_app_core::prefs::EditorPrefs;
use authoring_app_core::toast::{ToastId, ToastKind, ToastService, ToastStyle, ToastView};

/// Cloneable handle on one [`ToastService`], shared by the edit service,
/// the history view and whatever renders the toasts.
#[derive(Clone, Debug)]
pub struct Notifier {
    inner: Arc<Mutex<ToastService>>,
}

impl Notifier {
    /// Wrap an existing service.
    pub fn new(service: ToastService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Queue sized and timed from preferences.
    pub fn from_prefs(prefs: &EditorPrefs) -> Self {
        Self::new(ToastService::new(prefs.max_toasts, prefs.toast_ttl()))
    }

    fn lock(&self) -> MutexGuard<'_, ToastService> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise a toast now.
    pub fn raise(
        &self,
        kind: ToastKind,
        style: ToastStyle,
        title: impl Into<String>,
        body: Option<String>,
    ) -> ToastId {
        self.lock().push(kind, style, title, body, Instant::now())
    }

    /// Short-lived error toast.
    pub fn transient_error(&self, title: impl Into<String>, body: impl ToString) -> ToastId {
        self.raise(
            ToastKind::Error,
            ToastStyle::Transient,
            title,
            Some(body.to_string()),
        )
    }

    /// Error toast that stays until dismissed.
    pub fn blocking_error(&self, title: impl Into<String>, body: impl ToString) -> ToastId {
        self.raise(
            ToastKind::Error,
            ToastStyle::Blocking,
            title,
            Some(body.to_string()),
        )
    }

    /// Dismiss a toast.
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.lock().dismiss(id)
    }

    /// Drop expired toasts and return what remains visible.
    pub fn visible(&self) -> Vec<ToastView> {
        let now = Instant::now();
        let mut service = self.lock();
        service.retain_visible(now);
        service.visible(now)
    }
}
