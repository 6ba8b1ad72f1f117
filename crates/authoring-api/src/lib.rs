// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the authoring REST boundary and the [`ProjectApi`] port.
//!
//! All payloads are JSON. The editor only talks to the server through
//! [`ProjectApi`], so tests swap in an in-memory server and the HTTP client
//! lives in its own crate.
#![forbid(unsafe_code)]

use std::future::Future;

use authoring_graph::{
    Asset, AssetName, BranchId, CommitId, CommitSegment, EdgeGroup, GraphOp, Includes,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors crossing the REST boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure; no response was read.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Body or reason phrase.
        message: String,
    },
    /// A 2xx response whose body did not match the schema.
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// `true` for a 409 (the branch moved underneath the request).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Status { status: 409, .. })
    }

    /// `true` for a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Batch of edits written as one save.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Ops in application order.
    pub ops: Vec<GraphOp>,
}

impl SaveRequest {
    /// `true` when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of a save.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Committed versions of every node the save touched.
    #[serde(default)]
    pub updated_asset_nodes: Vec<Asset>,
    /// Commit created by the save, when the server reports it.
    #[serde(default)]
    pub commit_id: Option<CommitId>,
}

/// Commit log page request.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LogQuery {
    /// Maximum segments per page.
    pub limit: usize,
    /// Cursor: the `last` commit of the previous page; `None` starts at head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<CommitId>,
}

/// One page of the commit log, newest first.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CommitLogPage {
    /// Segments, newest first.
    #[serde(default)]
    pub objects: Vec<CommitSegment>,
}

/// Published state of a branch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchOffering {
    /// Commit that is live for learners.
    pub commit_id: CommitId,
    /// Commit time (epoch millis).
    pub commit_time: i64,
}

/// Discard every commit after `to`, up to `from` (the branch head).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RevertRequest {
    /// Commit to return to.
    pub to: CommitId,
    /// Head the caller saw; the server rejects the revert if it moved.
    pub from: CommitId,
}

/// The authoring server, as seen by the editor.
pub trait ProjectApi {
    /// `GET` one asset.
    fn fetch_node(
        &self,
        branch: BranchId,
        name: &AssetName,
    ) -> impl Future<Output = Result<Asset, ApiError>> + Send;

    /// `GET` the outgoing edges of an asset, optionally limited to one group.
    /// Edge order in the response is not guaranteed.
    fn fetch_includes(
        &self,
        branch: BranchId,
        name: &AssetName,
        group: Option<EdgeGroup>,
    ) -> impl Future<Output = Result<Includes, ApiError>> + Send;

    /// `POST` a batch of edits.
    fn save(
        &self,
        branch: BranchId,
        request: &SaveRequest,
    ) -> impl Future<Output = Result<SaveResponse, ApiError>> + Send;

    /// `GET` one page of the commit log.
    fn commit_log(
        &self,
        branch: BranchId,
        query: LogQuery,
    ) -> impl Future<Output = Result<CommitLogPage, ApiError>> + Send;

    /// `GET` the published state, `None` when never published.
    fn offering(
        &self,
        branch: BranchId,
    ) -> impl Future<Output = Result<Option<BranchOffering>, ApiError>> + Send;

    /// `POST` a revert.
    fn revert(
        &self,
        branch: BranchId,
        request: RevertRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn log_query_omits_missing_cursor() {
        let q = LogQuery { limit: 20, from: None };
        assert_eq!(serde_json::to_value(q).unwrap(), json!({ "limit": 20 }));
        let q = LogQuery {
            limit: 20,
            from: Some(CommitId(9)),
        };
        assert_eq!(serde_json::to_value(q).unwrap(), json!({ "limit": 20, "from": 9 }));
    }

    #[test]
    fn save_response_tolerates_missing_fields() {
        let r: SaveResponse = serde_json::from_value(json!({})).unwrap();
        assert!(r.updated_asset_nodes.is_empty());
        assert!(r.commit_id.is_none());
    }

    #[test]
    fn offering_reads_null_as_none() {
        let o: Option<BranchOffering> = serde_json::from_value(json!(null)).unwrap();
        assert!(o.is_none());
        let o: Option<BranchOffering> =
            serde_json::from_value(json!({ "commitId": 4, "commitTime": 1000 })).unwrap();
        assert_eq!(o.map(|o| o.commit_id), Some(CommitId(4)));
    }

    #[test]
    fn conflict_detection() {
        let err = ApiError::Status {
            status: 409,
            message: "head moved".into(),
        };
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }
}
