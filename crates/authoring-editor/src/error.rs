// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Editor error type.

use authoring_api::ApiError;
use authoring_graph::{AssetName, EdgeName, EdgeRuleError};
use thiserror::Error;

/// Errors surfaced by [`crate::GraphEditService`] operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// The node is not in the editor's working copy.
    #[error("asset {0} is not loaded in the editor")]
    UnknownNode(AssetName),
    /// The edge is not in the editor's working copy.
    #[error("edge {0} is not loaded in the editor")]
    UnknownEdge(EdgeName),
    /// The edge exists but hangs off a different source.
    #[error("edge {edge} does not belong to {source_name}")]
    EdgeSourceMismatch {
        /// Edge that was addressed.
        edge: EdgeName,
        /// Source the caller named.
        source_name: AssetName,
    },
    /// The operation needs an open asset.
    #[error("no asset is open in the editor")]
    NoCurrentAsset,
    /// A category edge is not legal for the asset's type.
    #[error(transparent)]
    Rule(#[from] EdgeRuleError),
    /// The server call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
