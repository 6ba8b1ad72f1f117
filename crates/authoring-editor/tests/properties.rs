// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used)]
//! Reducer properties over arbitrary action sequences.
//!
//! Seeds are pinned so failures reproduce across machines.

use authoring_editor::{reduce, AssetEditorState, EditorAction, PendingCategory};
use authoring_graph::{AssetName, AssetTypeId, Edge, EdgeGroup, EdgeName};
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

const SEED: [u8; 32] = *b"authoring-editor-reducer-seed-01";

fn edge(i: usize, position: u32) -> Edge {
    Edge {
        name: EdgeName::new(format!("e{i}")),
        source_name: AssetName::new("a"),
        target_name: AssetName::new(format!("t{i}")),
        target_type: AssetTypeId::Html,
        group: EdgeGroup::Elements,
        position,
        data: None,
    }
}

fn action() -> impl Strategy<Value = EditorAction> {
    prop_oneof![
        Just(EditorAction::SaveAssetStart),
        Just(EditorAction::SaveAssetError),
        Just(EditorAction::AssetEditorDirty),
        Just(EditorAction::AssetEditorClean),
        Just(EditorAction::ReloadAssetEditor),
        any::<bool>().prop_map(|newer_edits| EditorAction::SaveAssetsSuccess {
            updated_asset_nodes: vec![],
            current_asset_name: None,
            newer_edits,
        }),
        Just(EditorAction::UpdateAssetCategory(PendingCategory::Cleared)),
        prop::collection::vec(0u32..50, 0..8).prop_map(|positions| {
            EditorAction::UpdateIncludes {
                group: EdgeGroup::Elements,
                edges: positions
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| edge(i, p))
                    .collect(),
            }
        }),
    ]
}

fn runner() -> TestRunner {
    TestRunner::new_with_rng(
        PropConfig::default(),
        TestRng::from_seed(RngAlgorithm::ChaCha, &SEED),
    )
}

#[test]
fn reload_never_decreases_and_includes_stay_sorted() {
    runner()
        .run(&prop::collection::vec(action(), 0..40), |actions| {
            let mut state = AssetEditorState::default();
            for action in actions {
                let is_reload = action == EditorAction::ReloadAssetEditor;
                let next = reduce(&state, action);
                prop_assert!(next.reload >= state.reload);
                if is_reload {
                    prop_assert_eq!(next.reload, state.reload + 1);
                }
                prop_assert!(next.includes.is_sorted());
                state = next;
            }
            Ok(())
        })
        .expect("reducer reload/sort properties");
}

#[test]
fn only_save_outcomes_touch_saving() {
    runner()
        .run(&(any::<bool>(), action()), |(saving, action)| {
            let before = AssetEditorState {
                saving,
                ..AssetEditorState::default()
            };
            let touches = matches!(
                action,
                EditorAction::SaveAssetStart
                    | EditorAction::SaveAssetError
                    | EditorAction::SaveAssetsSuccess { .. }
            );
            let after = reduce(&before, action);
            if !touches {
                prop_assert_eq!(after.saving, saving);
            }
            Ok(())
        })
        .expect("saving flag property");
}
