// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Course content graph model shared by the authoring tools.
//!
//! Pure data: typed assets, named ordered edges grouped into [`Includes`],
//! the static [`EdgeRuleSchema`], and the [`GraphOp`] vocabulary used by
//! saves and the commit log.
#![forbid(unsafe_code)]

pub mod asset;
pub mod edge;
pub mod graph;
pub mod ident;
pub mod ops;
pub mod rules;

pub use asset::{merge_data, Asset, AssetTypeId, Data, UnknownAssetType};
pub use edge::{Edge, EdgeGroup, Includes, UnknownEdgeGroup};
pub use graph::{GraphOpError, ProjectGraph};
pub use ident::{AssetName, BranchId, CommitId, EdgeName};
pub use ops::{Author, CommitSegment, GraphOp};
pub use rules::{EdgeRuleError, EdgeRuleSchema, GroupRule, TypeRules, STANDARD_SCHEMA};
