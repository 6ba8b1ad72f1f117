// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Materialized project graph that [`GraphOp`]s apply to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::Asset;
use crate::edge::{Edge, EdgeGroup, Includes};
use crate::ident::{AssetName, EdgeName};
use crate::ops::GraphOp;

/// Why an op could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphOpError {
    /// `addNode` for a name already in use.
    #[error("node already exists: {0}")]
    DuplicateNode(AssetName),
    /// Op names a node that does not exist.
    #[error("missing node: {0}")]
    MissingNode(AssetName),
    /// `addEdge` for a name already in use.
    #[error("edge already exists: {0}")]
    DuplicateEdge(EdgeName),
    /// Op names an edge that does not exist under the given source.
    #[error("missing edge: {0}")]
    MissingEdge(EdgeName),
    /// `setEdgeOrder` does not list exactly the group's edges.
    #[error("ordering for {source_name}/{group} does not match its edges")]
    OrderingMismatch {
        /// Owning asset.
        source_name: AssetName,
        /// Reordered group.
        group: EdgeGroup,
    },
}

/// Nodes and edges keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectGraph {
    nodes: BTreeMap<AssetName, Asset>,
    edges: BTreeMap<EdgeName, Edge>,
}

impl ProjectGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node.
    pub fn insert_node(&mut self, asset: Asset) {
        self.nodes.insert(asset.name.clone(), asset);
    }

    /// Insert or replace an edge.
    pub fn insert_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.name.clone(), edge);
    }

    /// Node by name.
    pub fn node(&self, name: &AssetName) -> Option<&Asset> {
        self.nodes.get(name)
    }

    /// All nodes, by name.
    pub fn nodes(&self) -> impl Iterator<Item = &Asset> {
        self.nodes.values()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of `source`, grouped and sorted.
    pub fn includes_of(&self, source: &AssetName) -> Includes {
        Includes::from_edges(
            self.edges
                .values()
                .filter(|e| e.source_name == *source)
                .cloned(),
        )
    }

    fn owned_edge_mut(
        &mut self,
        source: &AssetName,
        name: &EdgeName,
    ) -> Result<&mut Edge, GraphOpError> {
        self.edges
            .get_mut(name)
            .filter(|e| e.source_name == *source)
            .ok_or_else(|| GraphOpError::MissingEdge(name.clone()))
    }

    /// Apply one op; errors if names are missing or duplicated.
    pub fn apply_op(&mut self, op: &GraphOp) -> Result<(), GraphOpError> {
        match op {
            GraphOp::AddNode {
                name,
                type_id,
                data,
            } => {
                if self.nodes.contains_key(name) {
                    return Err(GraphOpError::DuplicateNode(name.clone()));
                }
                self.insert_node(Asset::new(name.clone(), *type_id, data.clone()));
            }
            GraphOp::SetNodeData { name, data } => {
                let Some(node) = self.nodes.get_mut(name) else {
                    return Err(GraphOpError::MissingNode(name.clone()));
                };
                node.data.clone_from(data);
            }
            GraphOp::AddEdge(edge) => {
                if self.edges.contains_key(&edge.name) {
                    return Err(GraphOpError::DuplicateEdge(edge.name.clone()));
                }
                for end in [&edge.source_name, &edge.target_name] {
                    if !self.nodes.contains_key(end) {
                        return Err(GraphOpError::MissingNode(end.clone()));
                    }
                }
                self.insert_edge(edge.clone());
            }
            GraphOp::SetEdgeData {
                name,
                source_name,
                data,
            } => {
                self.owned_edge_mut(source_name, name)?.data.clone_from(data);
            }
            GraphOp::DeleteEdge { name, source_name } => {
                self.owned_edge_mut(source_name, name)?;
                self.edges.remove(name);
            }
            GraphOp::SetEdgeOrder {
                source_name,
                group,
                ordering,
            } => {
                let current = self.includes_of(source_name);
                let mut have: Vec<&EdgeName> =
                    current.group(*group).iter().map(|e| &e.name).collect();
                let mut want: Vec<&EdgeName> = ordering.iter().collect();
                have.sort();
                want.sort();
                if have != want {
                    return Err(GraphOpError::OrderingMismatch {
                        source_name: source_name.clone(),
                        group: *group,
                    });
                }
                for (position, name) in ordering.iter().enumerate() {
                    if let Some(edge) = self.edges.get_mut(name) {
                        edge.position = u32::try_from(position).unwrap_or(u32::MAX);
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply a batch atomically: on error the graph is left untouched.
    pub fn apply_all<'a>(
        &mut self,
        ops: impl IntoIterator<Item = &'a GraphOp>,
    ) -> Result<(), GraphOpError> {
        let mut next = self.clone();
        for op in ops {
            next.apply_op(op)?;
        }
        *self = next;
        Ok(())
    }
}
