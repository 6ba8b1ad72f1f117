// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Working copy of loaded nodes and edges plus the edits not yet saved.
//!
//! Every edit is stamped with a monotonically increasing sequence number. A
//! save captures the sequence it covers; when it lands, only entries stamped
//! at or below that sequence become clean, so edits made while the request
//! was in flight stay pending for the next save.

use std::collections::{BTreeMap, BTreeSet};

use authoring_api::SaveRequest;
use authoring_graph::{
    merge_data, Asset, AssetName, AssetTypeId, Data, Edge, EdgeGroup, EdgeName, GraphOp, Includes,
};

use crate::error::EditError;

/// Unsaved status of a node or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    /// Created locally, unknown to the server.
    Added,
    /// Known to the server with local changes.
    Edited,
}

#[derive(Debug, Clone)]
struct Tracked<T> {
    value: T,
    status: Option<EditStatus>,
    seq: u64,
}

impl<T> Tracked<T> {
    const fn clean(value: T) -> Self {
        Self {
            value,
            status: None,
            seq: 0,
        }
    }

    const fn is_pending(&self) -> bool {
        self.status.is_some()
    }

    fn touch(&mut self, seq: u64) {
        self.seq = seq;
        if self.status.is_none() {
            self.status = Some(EditStatus::Edited);
        }
    }
}

#[derive(Debug, Clone)]
struct Deletion {
    source: AssetName,
    seq: u64,
    /// The edge's `addEdge` is riding in the in-flight save.
    unsaved_add: bool,
}

/// What one save sends and which entries it covers.
#[derive(Debug, Clone)]
pub struct PendingSave {
    /// Request body.
    pub request: SaveRequest,
    /// Highest edit sequence included.
    pub seq: u64,
    nodes: Vec<AssetName>,
    edges: Vec<EdgeName>,
    deleted: Vec<EdgeName>,
    reorders: Vec<(AssetName, EdgeGroup)>,
}

/// Nodes, edges and pending edits known to one editor.
#[derive(Debug, Default)]
pub struct EditBuffer {
    nodes: BTreeMap<AssetName, Tracked<Asset>>,
    edges: BTreeMap<EdgeName, Tracked<Edge>>,
    deleted: BTreeMap<EdgeName, Deletion>,
    reorders: BTreeMap<(AssetName, EdgeGroup), u64>,
    in_flight_adds: BTreeSet<EdgeName>,
    seq: u64,
}

impl EditBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the latest edit.
    pub const fn latest_seq(&self) -> u64 {
        self.seq
    }

    fn bump(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// True while any edit is waiting to be saved.
    pub fn has_pending(&self) -> bool {
        self.nodes.values().any(Tracked::is_pending)
            || self.edges.values().any(Tracked::is_pending)
            || !self.deleted.is_empty()
            || !self.reorders.is_empty()
    }

    /// Register a node fetched from the server and return the effective
    /// copy. Local pending edits win over the fetched value.
    pub fn load_node(&mut self, asset: Asset) -> Asset {
        match self.nodes.get_mut(&asset.name) {
            Some(tracked) if tracked.is_pending() => tracked.value.clone(),
            Some(tracked) => {
                tracked.value = asset;
                tracked.value.clone()
            }
            None => {
                self.nodes
                    .insert(asset.name.clone(), Tracked::clean(asset.clone()));
                asset
            }
        }
    }

    /// Register the fetched edges of `source`, restricted to `group` when
    /// given. Clean edges no longer reported by the server are dropped;
    /// pending ones are kept.
    pub fn load_edges(
        &mut self,
        source: &AssetName,
        group: Option<EdgeGroup>,
        fetched: impl IntoIterator<Item = Edge>,
    ) {
        self.edges.retain(|_, tracked| {
            let edge = &tracked.value;
            tracked.is_pending()
                || edge.source_name != *source
                || group.is_some_and(|g| edge.group != g)
        });
        for edge in fetched {
            if self.deleted.contains_key(&edge.name) || self.edges.contains_key(&edge.name) {
                continue;
            }
            self.edges.insert(edge.name.clone(), Tracked::clean(edge));
        }
    }

    /// Working copy of a node.
    pub fn node(&self, name: &AssetName) -> Option<&Asset> {
        self.nodes.get(name).map(|t| &t.value)
    }

    /// Working copy of an edge.
    pub fn edge(&self, name: &EdgeName) -> Option<&Edge> {
        self.edges.get(name).map(|t| &t.value)
    }

    /// Unsaved status of a node; `None` when clean or unknown.
    pub fn node_status(&self, name: &AssetName) -> Option<EditStatus> {
        self.nodes.get(name).and_then(|t| t.status)
    }

    /// Unsaved status of an edge; `None` when clean or unknown.
    pub fn edge_status(&self, name: &EdgeName) -> Option<EditStatus> {
        self.edges.get(name).and_then(|t| t.status)
    }

    /// Outgoing edges of `source` in `group`, sorted by position.
    pub fn group_of(&self, source: &AssetName, group: EdgeGroup) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edges
            .values()
            .map(|t| &t.value)
            .filter(|e| e.source_name == *source && e.group == group)
            .cloned()
            .collect();
        edges.sort_by_key(|e| e.position);
        edges
    }

    /// All outgoing edges of `source`.
    pub fn includes_of(&self, source: &AssetName) -> Includes {
        Includes::from_edges(
            self.edges
                .values()
                .map(|t| &t.value)
                .filter(|e| e.source_name == *source)
                .cloned(),
        )
    }

    /// Create a provisional node.
    pub fn add_node(&mut self, type_id: AssetTypeId, data: Data) -> Asset {
        let seq = self.bump();
        let asset = Asset::new(AssetName::provisional(), type_id, data);
        self.nodes.insert(
            asset.name.clone(),
            Tracked {
                value: asset.clone(),
                status: Some(EditStatus::Added),
                seq,
            },
        );
        asset
    }

    /// Merge `partial` into a node's data.
    pub fn edit_node(&mut self, name: &AssetName, partial: Data) -> Result<Asset, EditError> {
        let seq = self.seq + 1;
        let tracked = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| EditError::UnknownNode(name.clone()))?;
        merge_data(&mut tracked.value.data, partial);
        tracked.touch(seq);
        let asset = tracked.value.clone();
        self.seq = seq;
        Ok(asset)
    }

    /// Append an edge at the end of `(source, group)`. Rule checks are the
    /// caller's job.
    pub fn add_edge(
        &mut self,
        source: &AssetName,
        group: EdgeGroup,
        target: &Asset,
        data: Option<Data>,
    ) -> Edge {
        let position = self
            .group_of(source, group)
            .last()
            .map_or(0, |e| e.position + 1);
        let seq = self.bump();
        let edge = Edge {
            name: EdgeName::provisional(),
            source_name: source.clone(),
            target_name: target.name.clone(),
            target_type: target.type_id,
            group,
            position,
            data,
        };
        self.edges.insert(
            edge.name.clone(),
            Tracked {
                value: edge.clone(),
                status: Some(EditStatus::Added),
                seq,
            },
        );
        edge
    }

    fn owned_edge_mut(
        &mut self,
        source: &AssetName,
        name: &EdgeName,
    ) -> Result<&mut Tracked<Edge>, EditError> {
        let tracked = self
            .edges
            .get_mut(name)
            .ok_or_else(|| EditError::UnknownEdge(name.clone()))?;
        if tracked.value.source_name != *source {
            return Err(EditError::EdgeSourceMismatch {
                edge: name.clone(),
                source_name: source.clone(),
            });
        }
        Ok(tracked)
    }

    /// Merge `partial` into an edge's data.
    pub fn edit_edge(
        &mut self,
        source: &AssetName,
        name: &EdgeName,
        partial: Data,
    ) -> Result<Edge, EditError> {
        let seq = self.seq + 1;
        let tracked = self.owned_edge_mut(source, name)?;
        merge_data(tracked.value.data.get_or_insert_with(Data::new), partial);
        tracked.touch(seq);
        let edge = tracked.value.clone();
        self.seq = seq;
        Ok(edge)
    }

    /// Remove an edge and renumber its siblings densely from zero.
    pub fn remove_edge(&mut self, source: &AssetName, name: &EdgeName) -> Result<Edge, EditError> {
        let group = self.owned_edge_mut(source, name)?.value.group;
        let seq = self.bump();
        let Some(tracked) = self.edges.remove(name) else {
            return Err(EditError::UnknownEdge(name.clone()));
        };
        let unsaved_add = self.in_flight_adds.contains(name);
        if tracked.status != Some(EditStatus::Added) || unsaved_add {
            self.deleted.insert(
                name.clone(),
                Deletion {
                    source: source.clone(),
                    seq,
                    unsaved_add,
                },
            );
        }
        let order: Vec<EdgeName> = self
            .group_of(source, group)
            .into_iter()
            .map(|e| e.name)
            .collect();
        if !order.is_empty() {
            self.renumber(&order);
            self.reorders.insert((source.clone(), group), seq);
        }
        Ok(tracked.value)
    }

    /// Move an edge to `index` within its group and renumber the group
    /// densely from zero. Returns the group touched.
    pub fn move_edge(
        &mut self,
        source: &AssetName,
        name: &EdgeName,
        index: usize,
    ) -> Result<EdgeGroup, EditError> {
        let group = self.owned_edge_mut(source, name)?.value.group;
        let mut order: Vec<EdgeName> = self
            .group_of(source, group)
            .into_iter()
            .map(|e| e.name)
            .collect();
        order.retain(|n| n != name);
        order.insert(index.min(order.len()), name.clone());
        self.renumber(&order);
        let seq = self.bump();
        self.reorders.insert((source.clone(), group), seq);
        Ok(group)
    }

    fn renumber(&mut self, order: &[EdgeName]) {
        for (position, edge_name) in order.iter().enumerate() {
            if let Some(tracked) = self.edges.get_mut(edge_name) {
                tracked.value.position = u32::try_from(position).unwrap_or(u32::MAX);
            }
        }
    }

    /// Build the request for everything pending and mark its edge
    /// additions as in flight.
    pub fn begin_save(&mut self) -> PendingSave {
        let mut added_nodes: Vec<&Tracked<Asset>> = self
            .nodes
            .values()
            .filter(|t| t.status == Some(EditStatus::Added))
            .collect();
        added_nodes.sort_by_key(|t| t.seq);
        let mut added_edges: Vec<&Tracked<Edge>> = self
            .edges
            .values()
            .filter(|t| t.status == Some(EditStatus::Added))
            .collect();
        added_edges.sort_by_key(|t| t.seq);

        let mut ops = Vec::new();
        ops.extend(added_nodes.iter().map(|t| GraphOp::AddNode {
            name: t.value.name.clone(),
            type_id: t.value.type_id,
            data: t.value.data.clone(),
        }));
        ops.extend(
            self.nodes
                .values()
                .filter(|t| t.status == Some(EditStatus::Edited))
                .map(|t| GraphOp::SetNodeData {
                    name: t.value.name.clone(),
                    data: t.value.data.clone(),
                }),
        );
        ops.extend(added_edges.iter().map(|t| GraphOp::AddEdge(t.value.clone())));
        ops.extend(
            self.edges
                .values()
                .filter(|t| t.status == Some(EditStatus::Edited))
                .map(|t| GraphOp::SetEdgeData {
                    name: t.value.name.clone(),
                    source_name: t.value.source_name.clone(),
                    data: t.value.data.clone(),
                }),
        );
        ops.extend(
            self.deleted
                .iter()
                .map(|(name, deletion)| GraphOp::DeleteEdge {
                    name: name.clone(),
                    source_name: deletion.source.clone(),
                }),
        );
        ops.extend(self.reorders.keys().map(|(source, group)| GraphOp::SetEdgeOrder {
            source_name: source.clone(),
            group: *group,
            ordering: self
                .group_of(source, *group)
                .into_iter()
                .map(|e| e.name)
                .collect(),
        }));

        let pending = PendingSave {
            request: SaveRequest { ops },
            seq: self.seq,
            nodes: self
                .nodes
                .iter()
                .filter(|(_, t)| t.is_pending())
                .map(|(n, _)| n.clone())
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|(_, t)| t.is_pending())
                .map(|(n, _)| n.clone())
                .collect(),
            deleted: self.deleted.keys().cloned().collect(),
            reorders: self.reorders.keys().cloned().collect(),
        };
        self.in_flight_adds = added_edges.iter().map(|t| t.value.name.clone()).collect();
        pending
    }

    /// The save landed: clean the entries it covered and adopt the
    /// server's copies of nodes without newer local edits.
    pub fn settle(&mut self, pending: &PendingSave, updated: &[Asset]) {
        let covered = pending.seq;
        for name in &pending.nodes {
            if let Some(tracked) = self.nodes.get_mut(name) {
                settle_entry(tracked, covered);
            }
        }
        for name in &pending.edges {
            if let Some(tracked) = self.edges.get_mut(name) {
                settle_entry(tracked, covered);
            }
        }
        for name in &pending.deleted {
            if self.deleted.get(name).is_some_and(|d| d.seq <= covered) {
                self.deleted.remove(name);
            }
        }
        for deletion in self.deleted.values_mut() {
            deletion.unsaved_add = false;
        }
        for key in &pending.reorders {
            if self.reorders.get(key).is_some_and(|seq| *seq <= covered) {
                self.reorders.remove(key);
            }
        }
        for asset in updated {
            match self.nodes.get_mut(&asset.name) {
                Some(tracked) if tracked.is_pending() => {}
                Some(tracked) => tracked.value = asset.clone(),
                None => {
                    self.nodes
                        .insert(asset.name.clone(), Tracked::clean(asset.clone()));
                }
            }
        }
        self.in_flight_adds.clear();
    }

    /// The save failed: everything stays pending. Deletions of edges whose
    /// creation never reached the server are forgotten.
    pub fn abort_save(&mut self) {
        self.deleted.retain(|_, d| !d.unsaved_add);
        self.in_flight_adds.clear();
    }
}

fn settle_entry<T>(tracked: &mut Tracked<T>, covered: u64) {
    if tracked.seq <= covered {
        tracked.status = None;
    } else if tracked.status == Some(EditStatus::Added) {
        // Creation reached the server; later edits still need sending.
        tracked.status = Some(EditStatus::Edited);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use serde_json::json;

    fn data(key: &str, value: &str) -> Data {
        let mut d = Data::new();
        d.insert(key.into(), json!(value));
        d
    }

    fn loaded_lesson(buffer: &mut EditBuffer, name: &str) -> Asset {
        buffer.load_node(Asset::new(
            AssetName::new(name),
            AssetTypeId::Lesson,
            data("title", name),
        ))
    }

    #[test]
    fn new_node_then_edit_stays_added() {
        let mut buffer = EditBuffer::new();
        let asset = buffer.add_node(AssetTypeId::Html, Data::new());
        buffer
            .edit_node(&asset.name, data("title", "Intro"))
            .expect("edit");
        assert_eq!(buffer.node_status(&asset.name), Some(EditStatus::Added));
        let pending = buffer.begin_save();
        assert_eq!(pending.request.ops.len(), 1);
        assert!(pending.request.ops[0].is_add_node());
    }

    #[test]
    fn edit_merges_and_marks_edited() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let merged = buffer
            .edit_node(&lesson.name, data("subtitle", "s"))
            .expect("edit");
        assert_eq!(merged.title(), Some("l1"));
        assert_eq!(merged.data.get("subtitle"), Some(&json!("s")));
        assert_eq!(buffer.node_status(&lesson.name), Some(EditStatus::Edited));
    }

    #[test]
    fn edits_after_save_start_survive_settle() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        buffer
            .edit_node(&lesson.name, data("title", "A"))
            .expect("edit");
        let pending = buffer.begin_save();
        buffer
            .edit_node(&lesson.name, data("title", "B"))
            .expect("edit");
        buffer.settle(&pending, &[]);
        assert_eq!(buffer.node_status(&lesson.name), Some(EditStatus::Edited));
        assert!(buffer.has_pending());
    }

    #[test]
    fn added_node_edited_in_flight_becomes_edited() {
        let mut buffer = EditBuffer::new();
        let asset = buffer.add_node(AssetTypeId::Html, Data::new());
        let pending = buffer.begin_save();
        buffer
            .edit_node(&asset.name, data("title", "later"))
            .expect("edit");
        buffer.settle(&pending, &[]);
        assert_eq!(buffer.node_status(&asset.name), Some(EditStatus::Edited));
        let next = buffer.begin_save();
        assert!(matches!(next.request.ops[..], [GraphOp::SetNodeData { .. }]));
    }

    #[test]
    fn removing_unsaved_edge_sends_nothing() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let html = buffer.add_node(AssetTypeId::Html, Data::new());
        let edge = buffer.add_edge(&lesson.name, EdgeGroup::Elements, &html, None);
        buffer.remove_edge(&lesson.name, &edge.name).expect("remove");
        let ops = buffer.begin_save().request.ops;
        assert!(ops.iter().all(|op| !op.is_add_edge()));
        assert!(!ops.iter().any(|op| matches!(op, GraphOp::DeleteEdge { .. })));
    }

    #[test]
    fn removing_in_flight_edge_deletes_after_settle() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let html = buffer.add_node(AssetTypeId::Html, Data::new());
        let edge = buffer.add_edge(&lesson.name, EdgeGroup::Elements, &html, None);
        let pending = buffer.begin_save();
        buffer.remove_edge(&lesson.name, &edge.name).expect("remove");
        buffer.settle(&pending, &[]);
        let ops = buffer.begin_save().request.ops;
        assert!(matches!(ops[..], [GraphOp::DeleteEdge { .. }]));
    }

    #[test]
    fn removing_in_flight_edge_is_forgotten_when_save_fails() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let html = buffer.add_node(AssetTypeId::Html, Data::new());
        let edge = buffer.add_edge(&lesson.name, EdgeGroup::Elements, &html, None);
        buffer.begin_save();
        buffer.remove_edge(&lesson.name, &edge.name).expect("remove");
        buffer.abort_save();
        let ops = buffer.begin_save().request.ops;
        assert!(!ops.iter().any(|op| matches!(op, GraphOp::DeleteEdge { .. })));
    }

    #[test]
    fn move_edge_renumbers_densely() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let names: Vec<EdgeName> = (0..3)
            .map(|_| {
                let html = buffer.add_node(AssetTypeId::Html, Data::new());
                buffer
                    .add_edge(&lesson.name, EdgeGroup::Elements, &html, None)
                    .name
            })
            .collect();
        buffer.move_edge(&lesson.name, &names[2], 0).expect("move");
        let order: Vec<(EdgeName, u32)> = buffer
            .group_of(&lesson.name, EdgeGroup::Elements)
            .into_iter()
            .map(|e| (e.name, e.position))
            .collect();
        assert_eq!(
            order,
            vec![
                (names[2].clone(), 0),
                (names[0].clone(), 1),
                (names[1].clone(), 2)
            ]
        );
        let ops = buffer.begin_save().request.ops;
        assert!(matches!(ops.last(), Some(GraphOp::SetEdgeOrder { ordering, .. }) if ordering[0] == names[2]));
    }

    #[test]
    fn remove_edge_closes_the_gap() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let names: Vec<EdgeName> = (0..3)
            .map(|_| {
                let html = buffer.add_node(AssetTypeId::Html, Data::new());
                buffer
                    .add_edge(&lesson.name, EdgeGroup::Elements, &html, None)
                    .name
            })
            .collect();
        let pending = buffer.begin_save();
        buffer.settle(&pending, &[]);

        buffer.remove_edge(&lesson.name, &names[0]).expect("remove");
        let positions: Vec<u32> = buffer
            .group_of(&lesson.name, EdgeGroup::Elements)
            .into_iter()
            .map(|e| e.position)
            .collect();
        assert_eq!(positions, [0, 1]);
        let ops = buffer.begin_save().request.ops;
        assert!(matches!(ops[0], GraphOp::DeleteEdge { .. }));
        assert!(matches!(
            &ops[1],
            GraphOp::SetEdgeOrder { ordering, .. } if *ordering == names[1..]
        ));
    }

    #[test]
    fn failed_node_edit_does_not_advance_sequence() {
        let mut buffer = EditBuffer::new();
        loaded_lesson(&mut buffer, "l1");
        let before = buffer.latest_seq();
        buffer
            .edit_node(&AssetName::new("missing"), data("title", "x"))
            .expect_err("unknown node");
        assert_eq!(buffer.latest_seq(), before);
    }

    #[test]
    fn edge_from_wrong_source_is_rejected() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        let other = loaded_lesson(&mut buffer, "l2");
        let html = buffer.add_node(AssetTypeId::Html, Data::new());
        let edge = buffer.add_edge(&lesson.name, EdgeGroup::Elements, &html, None);
        let err = buffer
            .remove_edge(&other.name, &edge.name)
            .expect_err("wrong source");
        assert!(matches!(err, EditError::EdgeSourceMismatch { .. }));
    }

    #[test]
    fn reload_keeps_local_edits() {
        let mut buffer = EditBuffer::new();
        let lesson = loaded_lesson(&mut buffer, "l1");
        buffer
            .edit_node(&lesson.name, data("title", "local"))
            .expect("edit");
        let effective = loaded_lesson(&mut buffer, "l1");
        assert_eq!(effective.title(), Some("local"));
    }
}
