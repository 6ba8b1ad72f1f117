// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asset editor core for the course authoring graph.
//!
//! - [`reduce`] is the pure state machine behind the editor UI.
//! - [`EditorStore`] owns the state and broadcasts changes over a
//!   `tokio::sync::watch` channel.
//! - [`GraphEditService`] turns edits into optimistic working-copy changes
//!   and saves them through a [`authoring_api::ProjectApi`].
//! - [`RevisionHistory`] pages the commit log and reverts branches.
#![forbid(unsafe_code)]

mod buffer;
mod error;
mod history;
mod notify;
mod reducer;
mod service;
mod session;
mod state;
mod store;

pub use buffer::{EditBuffer, EditStatus, PendingSave};
pub use error::EditError;
pub use history::{
    collapse_segment, collapse_segments, ops_touching, RevertOutcome, RevertPrompt,
    RevisionHistory,
};
pub use notify::Notifier;
pub use reducer::{reduce, EditorAction};
pub use service::{AutosaveOutcome, GraphEditService};
pub use session::{EditSession, SessionTracker, IMPLICIT_LABEL};
pub use state::{AssetEditorState, PendingCategory};
pub use store::EditorStore;
