// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Toast queue: transient notices expire after a TTL, blocking notices stay
//! until dismissed. Identical toasts raised in quick succession collapse.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Informational note.
    Info,
    /// Operation finished.
    Success,
    /// Something may need attention.
    Warn,
    /// Operation failed.
    Error,
}

/// How a toast leaves the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStyle {
    /// Expires after the service TTL.
    Transient,
    /// Stays until [`ToastService::dismiss`].
    Blocking,
}

/// Identifier for a toast entry.
pub type ToastId = u64;

#[derive(Debug, Clone)]
struct Toast {
    id: ToastId,
    kind: ToastKind,
    style: ToastStyle,
    title: String,
    body: Option<String>,
    created: Instant,
}

/// Render-ready view of a toast.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastView {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Expiry behaviour.
    pub style: ToastStyle,
    /// Short title line.
    pub title: String,
    /// Optional detail.
    pub body: Option<String>,
    /// Remaining lifetime (1.0 fresh, 0.0 expired); `None` for blocking toasts.
    pub remaining: Option<f32>,
}

/// Bounded in-memory toast queue.
#[derive(Debug)]
pub struct ToastService {
    queue: VecDeque<Toast>,
    max: usize,
    ttl: Duration,
    dedupe_window: Duration,
    next_id: ToastId,
}

impl ToastService {
    /// Queue holding at most `max` toasts; transient ones live for `ttl`.
    pub fn new(max: usize, ttl: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            ttl,
            dedupe_window: Duration::from_millis(500),
            next_id: 1,
        }
    }

    /// Raise a toast. A toast equal in kind/style/title/body to one raised
    /// within the dedupe window refreshes that entry instead.
    ///
    /// When full, the oldest transient toast is evicted; blocking toasts are
    /// only evicted when nothing else is left.
    pub fn push<S, B>(
        &mut self,
        kind: ToastKind,
        style: ToastStyle,
        title: S,
        body: B,
        now: Instant,
    ) -> ToastId
    where
        S: Into<String>,
        B: Into<Option<String>>,
    {
        let title = title.into();
        let body = body.into();
        let window = self.dedupe_window;

        if let Some(existing) = self.queue.iter_mut().find(|t| {
            t.kind == kind
                && t.style == style
                && t.title == title
                && t.body == body
                && now.saturating_duration_since(t.created) <= window
        }) {
            existing.created = now;
            return existing.id;
        }

        if self.queue.len() >= self.max {
            let victim = self
                .queue
                .iter()
                .position(|t| t.style == ToastStyle::Transient)
                .unwrap_or(0);
            self.queue.remove(victim);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.queue.push_back(Toast {
            id,
            kind,
            style,
            title,
            body,
            created: now,
        });
        id
    }

    /// Remove a toast. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|t| t.id != id);
        self.queue.len() != before
    }

    /// Drop expired transient toasts (call once per tick).
    pub fn retain_visible(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.queue.retain(|t| is_live(t, ttl, now));
    }

    /// Render-ready toasts, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<ToastView> {
        self.queue
            .iter()
            .filter(|t| is_live(t, self.ttl, now))
            .map(|t| ToastView {
                id: t.id,
                kind: t.kind,
                style: t.style,
                title: t.title.clone(),
                body: t.body.clone(),
                remaining: match t.style {
                    ToastStyle::Blocking => None,
                    ToastStyle::Transient => Some(
                        1.0 - now.saturating_duration_since(t.created).as_secs_f32()
                            / self.ttl.as_secs_f32().max(f32::EPSILON),
                    ),
                },
            })
            .collect()
    }

    /// Whether a blocking toast is waiting for dismissal.
    pub fn has_blocking(&self) -> bool {
        self.queue.iter().any(|t| t.style == ToastStyle::Blocking)
    }

    /// Number of queued toasts, expired or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn is_live(t: &Toast, ttl: Duration, now: Instant) -> bool {
    match t.style {
        ToastStyle::Blocking => true,
        ToastStyle::Transient => now.saturating_duration_since(t.created) < ttl,
    }
}
