// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure state transitions for the asset editor.
//!
//! [`reduce`] is total over [`EditorAction`] and never fails; network and
//! validation failures are translated into actions before they get here.

use authoring_graph::{Asset, AssetName, Edge, EdgeGroup, Includes};

use crate::state::{AssetEditorState, PendingCategory};

/// Everything that can change the editor state.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorAction {
    /// Replace the node under edit; includes are left alone so node and
    /// edges may arrive in either order.
    SetCurrentAssetNode(Asset),
    /// Replace all includes.
    SetCurrentIncludes(Includes),
    /// Replace node and includes together (switching to a new provisional asset).
    SetNewAssetAndIncludes {
        /// New node.
        asset: Asset,
        /// Its includes.
        includes: Includes,
    },
    /// Replace a single group's edges.
    UpdateIncludes {
        /// Group to replace.
        group: EdgeGroup,
        /// New edges, any order.
        edges: Vec<Edge>,
    },
    /// A save started.
    SaveAssetStart,
    /// A save finished.
    SaveAssetsSuccess {
        /// Committed nodes returned by the server.
        updated_asset_nodes: Vec<Asset>,
        /// Asset open in the editor when the save completed.
        current_asset_name: Option<AssetName>,
        /// Edits were made after the save started; stay dirty.
        newer_edits: bool,
    },
    /// A save failed; keep the changes marked unsaved.
    SaveAssetError,
    /// Unsaved changes exist.
    AssetEditorDirty,
    /// No unsaved changes.
    AssetEditorClean,
    /// Force consumers to refetch.
    ReloadAssetEditor,
    /// Set the pending gradebook category override.
    UpdateAssetCategory(PendingCategory),
}

/// Apply one action.
pub fn reduce(state: &AssetEditorState, action: EditorAction) -> AssetEditorState {
    let mut next = state.clone();
    match action {
        EditorAction::SetCurrentAssetNode(asset) => {
            // A pending override belongs to the asset it was made on.
            if next.current_name() != Some(&asset.name) {
                next.category = PendingCategory::Unset;
            }
            next.asset_node = Some(asset);
        }
        EditorAction::SetCurrentIncludes(includes) => next.includes = includes,
        EditorAction::SetNewAssetAndIncludes { asset, includes } => {
            next.asset_node = Some(asset);
            next.includes = includes;
            next.category = PendingCategory::Unset;
        }
        EditorAction::UpdateIncludes { group, edges } => next.includes.replace_group(group, edges),
        EditorAction::SaveAssetStart => next.saving = true,
        EditorAction::SaveAssetsSuccess {
            updated_asset_nodes,
            current_asset_name,
            newer_edits,
        } => {
            next.saving = false;
            next.dirty = newer_edits;
            if !newer_edits {
                next.category = PendingCategory::Unset;
            }
            // Squash: the current asset may have been merged away by the
            // save, in which case the node is kept until the caller navigates.
            if let Some(updated) = current_asset_name
                .and_then(|name| updated_asset_nodes.into_iter().find(|a| a.name == name))
            {
                next.asset_node = Some(updated);
            }
        }
        EditorAction::SaveAssetError => {
            next.saving = false;
            next.dirty = true;
        }
        EditorAction::AssetEditorDirty => next.dirty = true,
        EditorAction::AssetEditorClean => next.dirty = false,
        EditorAction::ReloadAssetEditor => next.reload += 1,
        EditorAction::UpdateAssetCategory(category) => {
            next.category = category;
            next.dirty = true;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use authoring_graph::{AssetTypeId, Data, EdgeName};
    use serde_json::json;

    fn asset(name: &str, title: &str) -> Asset {
        let mut data = Data::new();
        data.insert("title".into(), json!(title));
        Asset::new(AssetName::new(name), AssetTypeId::Lesson, data)
    }

    fn edge(name: &str, position: u32) -> Edge {
        Edge {
            name: EdgeName::new(name),
            source_name: AssetName::new("a"),
            target_name: AssetName::new(format!("t-{name}")),
            target_type: AssetTypeId::Html,
            group: EdgeGroup::Elements,
            position,
            data: None,
        }
    }

    #[test]
    fn save_round_trip_clears_flags_and_takes_server_node() {
        let mut state = AssetEditorState {
            asset_node: Some(asset("a", "Old")),
            dirty: true,
            ..AssetEditorState::default()
        };
        state = reduce(&state, EditorAction::SaveAssetStart);
        assert!(state.saving);
        state = reduce(
            &state,
            EditorAction::SaveAssetsSuccess {
                updated_asset_nodes: vec![asset("a", "X")],
                current_asset_name: Some(AssetName::new("a")),
                newer_edits: false,
            },
        );
        assert!(!state.dirty);
        assert!(!state.saving);
        assert_eq!(state.asset_node.as_ref().and_then(Asset::title), Some("X"));
    }

    #[test]
    fn squash_save_keeps_current_node() {
        let state = AssetEditorState {
            asset_node: Some(asset("a", "Old")),
            dirty: true,
            saving: true,
            ..AssetEditorState::default()
        };
        let next = reduce(
            &state,
            EditorAction::SaveAssetsSuccess {
                updated_asset_nodes: vec![],
                current_asset_name: Some(AssetName::new("a")),
                newer_edits: false,
            },
        );
        assert_eq!(next.asset_node, state.asset_node);
        assert!(!next.dirty && !next.saving);
    }

    #[test]
    fn success_with_newer_edits_stays_dirty() {
        let state = AssetEditorState {
            dirty: true,
            saving: true,
            ..AssetEditorState::default()
        };
        let next = reduce(
            &state,
            EditorAction::SaveAssetsSuccess {
                updated_asset_nodes: vec![],
                current_asset_name: None,
                newer_edits: true,
            },
        );
        assert!(next.dirty);
        assert!(!next.saving);
    }

    #[test]
    fn save_error_rearms_dirty() {
        let state = AssetEditorState {
            saving: true,
            ..AssetEditorState::default()
        };
        let next = reduce(&state, EditorAction::SaveAssetError);
        assert!(next.dirty);
        assert!(!next.saving);
    }

    #[test]
    fn node_and_includes_update_independently() {
        let state = AssetEditorState {
            includes: Includes::from_edges([edge("e1", 0)]),
            ..AssetEditorState::default()
        };
        let next = reduce(&state, EditorAction::SetCurrentAssetNode(asset("b", "B")));
        assert_eq!(next.includes, state.includes);

        let next = reduce(
            &next,
            EditorAction::SetNewAssetAndIncludes {
                asset: asset("c", "C"),
                includes: Includes::new(),
            },
        );
        assert!(next.includes.is_empty());
        assert_eq!(next.current_name().map(AssetName::as_str), Some("c"));
    }

    #[test]
    fn update_includes_sorts_the_group() {
        let next = reduce(
            &AssetEditorState::default(),
            EditorAction::UpdateIncludes {
                group: EdgeGroup::Elements,
                edges: vec![edge("b", 3), edge("a", 1), edge("c", 2)],
            },
        );
        let order: Vec<u32> = next
            .includes
            .group(EdgeGroup::Elements)
            .iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(order, [1, 2, 3]);
    }

    #[test]
    fn category_override_distinguishes_cleared_from_unset() {
        let state = AssetEditorState::default();
        assert_eq!(state.category, PendingCategory::Unset);
        let next = reduce(
            &state,
            EditorAction::UpdateAssetCategory(PendingCategory::Cleared),
        );
        assert_eq!(next.category, PendingCategory::Cleared);
        assert_ne!(next.category, PendingCategory::Unset);
        assert!(next.dirty);
    }

    #[test]
    fn saved_or_abandoned_overrides_stop_pending() {
        let pending = reduce(
            &AssetEditorState::default(),
            EditorAction::UpdateAssetCategory(PendingCategory::Cleared),
        );
        let newer = reduce(
            &pending,
            EditorAction::SaveAssetsSuccess {
                updated_asset_nodes: Vec::new(),
                current_asset_name: None,
                newer_edits: true,
            },
        );
        assert_eq!(newer.category, PendingCategory::Cleared);
        let saved = reduce(
            &pending,
            EditorAction::SaveAssetsSuccess {
                updated_asset_nodes: Vec::new(),
                current_asset_name: None,
                newer_edits: false,
            },
        );
        assert_eq!(saved.category, PendingCategory::Unset);

        let opened = reduce(&pending, EditorAction::SetCurrentAssetNode(asset("b", "B")));
        assert_eq!(opened.category, PendingCategory::Unset);
        let fresh = reduce(
            &pending,
            EditorAction::SetNewAssetAndIncludes {
                asset: asset("n", "New"),
                includes: Includes::new(),
            },
        );
        assert_eq!(fresh.category, PendingCategory::Unset);
    }

    #[test]
    fn dirty_is_idempotent() {
        let once = reduce(&AssetEditorState::default(), EditorAction::AssetEditorDirty);
        let twice = reduce(&once, EditorAction::AssetEditorDirty);
        assert_eq!(once, twice);
        let clean = reduce(&twice, EditorAction::AssetEditorClean);
        assert!(!clean.dirty);
    }
}
