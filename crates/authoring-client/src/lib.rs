// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP implementation of [`ProjectApi`] for the authoring server.
//!
//! JSON over HTTP with a cookie-backed session. Every mutating request
//! carries `X-CSRF: true` and, when configured, the CSRF token.
#![forbid(unsafe_code)]

use std::time::Duration;

use authoring_api::{
    ApiError, BranchOffering, CommitLogPage, LogQuery, ProjectApi, RevertRequest, SaveRequest,
    SaveResponse,
};
use authoring_app_core::prefs::EditorPrefs;
use authoring_graph::{Asset, AssetName, BranchId, EdgeGroup, Includes};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// Header marking a request as coming from the editor.
pub const CSRF_HEADER: &str = "X-CSRF";
/// Header carrying the server-issued CSRF token.
pub const CSRF_TOKEN_HEADER: &str = "X-CSRF-Token";

const API_PREFIX: [&str; 4] = ["api", "v2", "authoring", "branches"];
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the authoring REST API.
#[derive(Debug, Clone)]
pub struct HttpProjectApi {
    http: Client,
    base: Url,
    csrf_token: Option<String>,
}

impl HttpProjectApi {
    /// Client for the server at `base_url`.
    pub fn new(
        base_url: &str,
        csrf_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "base url {base_url} cannot hold a path"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base,
            csrf_token,
        })
    }

    /// Client configured from saved preferences.
    pub fn from_prefs(prefs: &EditorPrefs) -> Result<Self, ApiError> {
        Self::new(&prefs.api_base_url, prefs.csrf_token.clone(), DEFAULT_TIMEOUT)
    }

    /// Server base URL.
    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn branch_url(&self, branch: BranchId, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        let branch = branch.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(API_PREFIX)
                .push(&branch)
                .extend(tail);
        }
        url
    }

    /// `GET` URL of one node.
    pub fn node_url(&self, branch: BranchId, name: &AssetName) -> Url {
        self.branch_url(branch, &["nodes", name.as_str()])
    }

    /// `GET` URL of a node's includes.
    pub fn includes_url(&self, branch: BranchId, name: &AssetName, group: Option<EdgeGroup>) -> Url {
        let mut url = self.branch_url(branch, &["nodes", name.as_str(), "includes"]);
        if let Some(group) = group {
            url.query_pairs_mut().append_pair("group", group.as_str());
        }
        url
    }

    /// `POST` URL for saves.
    pub fn write_url(&self, branch: BranchId) -> Url {
        self.branch_url(branch, &["write"])
    }

    /// `GET` URL of one commit log page.
    pub fn commits_url(&self, branch: BranchId, query: LogQuery) -> Url {
        let mut url = self.branch_url(branch, &["commits"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.to_string());
            if let Some(from) = query.from {
                pairs.append_pair("from", &from.to_string());
            }
        }
        url
    }

    /// `GET` URL of the published state.
    pub fn offering_url(&self, branch: BranchId) -> Url {
        self.branch_url(branch, &["offering"])
    }

    /// `POST` URL for reverts.
    pub fn revert_url(&self, branch: BranchId) -> Url {
        self.branch_url(branch, &["revert"])
    }

    fn mutating(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(CSRF_HEADER, "true");
        match &self.csrf_token {
            Some(token) => request.header(CSRF_TOKEN_HEADER, token),
            None => request,
        }
    }

    fn get_request(&self, url: Url) -> RequestBuilder {
        self.http.get(url)
    }

    fn save_request(&self, branch: BranchId, request: &SaveRequest) -> RequestBuilder {
        self.mutating(self.http.post(self.write_url(branch))).json(request)
    }

    fn revert_request(&self, branch: BranchId, request: RevertRequest) -> RequestBuilder {
        self.mutating(self.http.post(self.revert_url(branch)))
            .json(&request)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = status_error(status.as_u16(), &body);
        warn!(status = status.as_u16(), error = %err, "request rejected");
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self.send(self.get_request(url)).await?;
        decode(response).await
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(transport)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Map a non-2xx status and its body to an [`ApiError`]. Empty bodies fall
/// back to the status reason phrase.
pub fn status_error(status: u16, body: &str) -> ApiError {
    let body = body.trim();
    let message = if body.is_empty() {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.to_string()
    };
    ApiError::Status { status, message }
}

impl ProjectApi for HttpProjectApi {
    async fn fetch_node(&self, branch: BranchId, name: &AssetName) -> Result<Asset, ApiError> {
        self.get_json(self.node_url(branch, name)).await
    }

    async fn fetch_includes(
        &self,
        branch: BranchId,
        name: &AssetName,
        group: Option<EdgeGroup>,
    ) -> Result<Includes, ApiError> {
        self.get_json(self.includes_url(branch, name, group)).await
    }

    #[instrument(skip(self, request), fields(ops = request.ops.len()))]
    async fn save(&self, branch: BranchId, request: &SaveRequest) -> Result<SaveResponse, ApiError> {
        debug!(url = %self.write_url(branch), "POST");
        let response = self.send(self.save_request(branch, request)).await?;
        decode(response).await
    }

    async fn commit_log(
        &self,
        branch: BranchId,
        query: LogQuery,
    ) -> Result<CommitLogPage, ApiError> {
        self.get_json(self.commits_url(branch, query)).await
    }

    async fn offering(&self, branch: BranchId) -> Result<Option<BranchOffering>, ApiError> {
        let url = self.offering_url(branch);
        debug!(%url, "GET");
        let response = self.send(self.get_request(url)).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn revert(&self, branch: BranchId, request: RevertRequest) -> Result<(), ApiError> {
        debug!(url = %self.revert_url(branch), "POST");
        self.send(self.revert_request(branch, request)).await?;
        Ok(())
    }
}
