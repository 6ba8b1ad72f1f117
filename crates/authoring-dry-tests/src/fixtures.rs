// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builders for assets, edges and commit segments.

use authoring_graph::{
    Asset, AssetName, AssetTypeId, Author, CommitId, CommitSegment, Data, Edge, EdgeGroup,
    EdgeName, GraphOp,
};
use serde_json::json;

/// Asset with empty data.
pub fn asset(name: &str, type_id: AssetTypeId) -> Asset {
    Asset::new(AssetName::new(name), type_id, Data::new())
}

/// Asset whose data holds only a `title`.
pub fn titled(name: &str, type_id: AssetTypeId, title: &str) -> Asset {
    let mut data = Data::new();
    data.insert("title".into(), json!(title));
    Asset::new(AssetName::new(name), type_id, data)
}

/// Edge named `<source>/<group>/<position>` from `source` to `target`.
pub fn edge(source: &str, group: EdgeGroup, target: &Asset, position: u32) -> Edge {
    Edge {
        name: EdgeName::new(format!("{source}/{group}/{position}")),
        source_name: AssetName::new(source),
        target_name: target.name.clone(),
        target_type: target.type_id,
        group,
        position,
        data: None,
    }
}

/// Segment spanning `first..=last` by a fixed author.
pub fn segment(first: u64, last: u64, ops: Vec<GraphOp>) -> CommitSegment {
    CommitSegment {
        first: CommitId(first),
        last: CommitId(last),
        created_by: Author {
            id: 7,
            given_name: Some("Ada".into()),
            family_name: Some("Lovelace".into()),
        },
        created_ms: 1_700_000_000_000,
        ops,
    }
}
