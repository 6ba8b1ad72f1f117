// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Owner of the editor state.

use tokio::sync::watch;

use crate::reducer::{reduce, EditorAction};
use crate::state::AssetEditorState;

/// Holds the current [`AssetEditorState`] and broadcasts changes.
///
/// Subscribers are only woken when a dispatch actually changes the state.
#[derive(Debug)]
pub struct EditorStore {
    tx: watch::Sender<AssetEditorState>,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(AssetEditorState::default())
    }
}

impl EditorStore {
    /// Store seeded with `state`.
    pub fn new(state: AssetEditorState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// Run the reducer. Returns whether the state changed.
    pub fn dispatch(&self, action: EditorAction) -> bool {
        tracing::trace!(?action, "editor dispatch");
        self.tx.send_if_modified(|state| {
            let next = reduce(state, action);
            if next == *state {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AssetEditorState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&AssetEditorState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// New change subscription.
    pub fn subscribe(&self) -> watch::Receiver<AssetEditorState> {
        self.tx.subscribe()
    }
}
