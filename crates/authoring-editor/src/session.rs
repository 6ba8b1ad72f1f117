// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Named edit sessions.
//!
//! A session groups the fine-grained edits of one user gesture ("Edit
//! title", "Reorder elements") under a label and a token. Re-entering with
//! the same token continues the session; anything else closes it first.

use std::collections::VecDeque;
use std::time::Instant;

use uuid::Uuid;

/// Label used when an edit arrives with no session open.
pub const IMPLICIT_LABEL: &str = "Edit";

const CLOSED_LOG_CAP: usize = 64;

/// One edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    label: String,
    token: String,
    started: Instant,
    edits: usize,
}

impl EditSession {
    fn open(label: impl Into<String>, token: String, started: Instant) -> Self {
        Self {
            label: label.into(),
            token,
            started,
            edits: 0,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Continuation token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// When the session opened.
    pub const fn started(&self) -> Instant {
        self.started
    }

    /// Number of edits recorded so far.
    pub const fn edits(&self) -> usize {
        self.edits
    }
}

/// Open session plus a bounded log of closed ones.
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Option<EditSession>,
    closed: VecDeque<EditSession>,
}

impl SessionTracker {
    /// No session open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or continue a session and return its token.
    pub fn begin(&mut self, label: &str, token: Option<&str>, now: Instant) -> String {
        if let (Some(current), Some(token)) = (&self.current, token) {
            if current.token == token {
                return current.token.clone();
            }
        }
        self.close();
        let token = token.map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);
        self.current = Some(EditSession::open(label, token.clone(), now));
        token
    }

    /// Close the open session, if any.
    pub fn close(&mut self) -> Option<EditSession> {
        let session = self.current.take()?;
        if self.closed.len() == CLOSED_LOG_CAP {
            self.closed.pop_front();
        }
        self.closed.push_back(session.clone());
        Some(session)
    }

    /// Count an edit against the open session, opening an implicit one
    /// when needed.
    pub fn record_edit(&mut self, now: Instant) {
        let session = self.current.get_or_insert_with(|| {
            EditSession::open(IMPLICIT_LABEL, Uuid::new_v4().to_string(), now)
        });
        session.edits += 1;
    }

    /// The open session.
    pub const fn current(&self) -> Option<&EditSession> {
        self.current.as_ref()
    }

    /// Closed sessions, oldest first.
    pub fn closed(&self) -> impl Iterator<Item = &EditSession> {
        self.closed.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn same_token_continues() {
        let now = Instant::now();
        let mut tracker = SessionTracker::new();
        let token = tracker.begin("Edit title", Some("t1"), now);
        tracker.record_edit(now);
        assert_eq!(tracker.begin("Edit title", Some(&token), now), "t1");
        tracker.record_edit(now);
        assert_eq!(tracker.current().map(EditSession::edits), Some(2));
        assert_eq!(tracker.closed().count(), 0);
    }

    #[test]
    fn different_token_closes_previous() {
        let now = Instant::now();
        let mut tracker = SessionTracker::new();
        tracker.begin("Edit title", Some("t1"), now);
        tracker.begin("Reorder", Some("t2"), now);
        let closed: Vec<&str> = tracker.closed().map(EditSession::label).collect();
        assert_eq!(closed, ["Edit title"]);
        assert_eq!(tracker.current().map(EditSession::token), Some("t2"));
    }

    #[test]
    fn missing_token_always_opens_fresh() {
        let now = Instant::now();
        let mut tracker = SessionTracker::new();
        let a = tracker.begin("A", None, now);
        let b = tracker.begin("A", None, now);
        assert_ne!(a, b);
        assert_eq!(tracker.closed().count(), 1);
    }

    #[test]
    fn edit_without_session_opens_implicit_one() {
        let now = Instant::now();
        let mut tracker = SessionTracker::new();
        tracker.record_edit(now);
        let current = tracker.current().expect("implicit session");
        assert_eq!(current.label(), IMPLICIT_LABEL);
        assert_eq!(current.edits(), 1);
    }

    #[test]
    fn closed_log_is_bounded() {
        let now = Instant::now();
        let mut tracker = SessionTracker::new();
        for i in 0..(CLOSED_LOG_CAP + 5) {
            tracker.begin(&format!("s{i}"), None, now);
        }
        tracker.close();
        assert_eq!(tracker.closed().count(), CLOSED_LOG_CAP);
    }
}
