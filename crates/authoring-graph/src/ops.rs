// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph operations and commit-log segments.
//!
//! The same [`GraphOp`] vocabulary is written by a save and read back from the
//! commit log, so history display and the edit buffer agree on shapes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetTypeId, Data};
use crate::edge::{Edge, EdgeGroup};
use crate::ident::{AssetName, CommitId, EdgeName};

/// One structural or payload change to the project graph.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GraphOp {
    /// Create a node.
    AddNode {
        /// New node name.
        name: AssetName,
        /// Node type.
        type_id: AssetTypeId,
        /// Initial payload.
        data: Data,
    },
    /// Replace a node payload.
    SetNodeData {
        /// Node name.
        name: AssetName,
        /// Full new payload.
        data: Data,
    },
    /// Create an edge.
    AddEdge(Edge),
    /// Replace an edge payload.
    SetEdgeData {
        /// Edge name.
        name: EdgeName,
        /// Owning asset.
        source_name: AssetName,
        /// Full new payload (`None` clears it).
        data: Option<Data>,
    },
    /// Remove an edge.
    DeleteEdge {
        /// Edge name.
        name: EdgeName,
        /// Owning asset.
        source_name: AssetName,
    },
    /// Reorder a group; `ordering` lists every edge of the group.
    SetEdgeOrder {
        /// Owning asset.
        source_name: AssetName,
        /// Reordered group.
        group: EdgeGroup,
        /// Edge names in their new order.
        ordering: Vec<EdgeName>,
    },
}

impl GraphOp {
    /// `true` for [`GraphOp::AddNode`].
    pub fn is_add_node(&self) -> bool {
        matches!(self, Self::AddNode { .. })
    }

    /// `true` for [`GraphOp::AddEdge`].
    pub fn is_add_edge(&self) -> bool {
        matches!(self, Self::AddEdge(_))
    }

    /// Node created by an `AddNode` op.
    pub fn added_node(&self) -> Option<&AssetName> {
        match self {
            Self::AddNode { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Target of an `AddEdge` op.
    pub fn added_edge_target(&self) -> Option<&AssetName> {
        match self {
            Self::AddEdge(edge) => Some(&edge.target_name),
            _ => None,
        }
    }

    /// Short label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "addNode",
            Self::SetNodeData { .. } => "setNodeData",
            Self::AddEdge(_) => "addEdge",
            Self::SetEdgeData { .. } => "setEdgeData",
            Self::DeleteEdge { .. } => "deleteEdge",
            Self::SetEdgeOrder { .. } => "setEdgeOrder",
        }
    }
}

/// Author of a commit segment.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// User id.
    pub id: u64,
    /// Given name, if known.
    #[serde(default)]
    pub given_name: Option<String>,
    /// Family name, if known.
    #[serde(default)]
    pub family_name: Option<String>,
}

impl Author {
    /// "Given Family", falling back to `user <id>`.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            format!("user {}", self.id)
        } else {
            parts.join(" ")
        }
    }
}

/// Contiguous run of ops attributed to one logical save.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSegment {
    /// Oldest commit in the run.
    pub first: CommitId,
    /// Newest commit in the run.
    pub last: CommitId,
    /// Who saved.
    pub created_by: Author,
    /// When the run was saved (epoch millis).
    pub created_ms: i64,
    /// Ops in commit order.
    pub ops: Vec<GraphOp>,
}

impl CommitSegment {
    /// Names targeted by `AddEdge` ops in this segment.
    pub fn added_edge_targets(&self) -> BTreeSet<&AssetName> {
        self.ops.iter().filter_map(GraphOp::added_edge_target).collect()
    }

    /// Whether `commit` falls inside `first..=last`.
    pub fn spans(&self, commit: CommitId) -> bool {
        self.first <= commit && commit <= self.last
    }
}
