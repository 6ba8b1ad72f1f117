// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;

use authoring_graph::{
    AssetName, AssetTypeId, Edge, EdgeGroup, EdgeName, EdgeRuleError, EdgeRuleSchema, Includes,
};

fn type_id() -> impl Strategy<Value = AssetTypeId> {
    prop::sample::select(AssetTypeId::ALL.to_vec())
}

fn group() -> impl Strategy<Value = EdgeGroup> {
    prop::sample::select(EdgeGroup::ALL.to_vec())
}

fn edge() -> impl Strategy<Value = Edge> {
    (group(), 0u32..16, "[a-z]{1,6}").prop_map(|(group, position, tag)| Edge {
        name: EdgeName::new(format!("{tag}-{position}")),
        source_name: AssetName::new("source"),
        target_name: AssetName::new(tag),
        target_type: AssetTypeId::Html,
        group,
        position,
        data: None,
    })
}

proptest! {
    #[test]
    fn includes_are_sorted_after_grouping(edges in prop::collection::vec(edge(), 0..40)) {
        let includes = Includes::from_edges(edges.clone());
        prop_assert!(includes.is_sorted());
        prop_assert_eq!(includes.len(), edges.len());
    }

    #[test]
    fn includes_stay_sorted_after_group_replacement(
        initial in prop::collection::vec(edge(), 0..20),
        replacement in prop::collection::vec(edge(), 0..20),
        target in group(),
    ) {
        let mut includes = Includes::from_edges(initial);
        let replacement: Vec<Edge> = replacement
            .into_iter()
            .map(|mut e| { e.group = target; e })
            .collect();
        includes.replace_group(target, replacement.clone());
        prop_assert!(includes.is_sorted());
        prop_assert_eq!(includes.group(target).len(), replacement.len());
    }

    #[test]
    fn schema_accepts_exactly_the_declared_targets(
        source in type_id(),
        group in group(),
        target in type_id(),
    ) {
        let schema = EdgeRuleSchema::standard();
        let verdict = schema.check(source, group, target);
        if !schema.legal_groups(source).contains(&group) {
            let is_invalid_group = matches!(verdict, Err(EdgeRuleError::InvalidEdgeGroup { .. }));
            prop_assert!(is_invalid_group);
        } else {
            let declared = schema.legal_target_types(source, group).unwrap_or(&[]);
            prop_assert_eq!(verdict.is_ok(), declared.contains(&target));
        }
    }
}
