// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory authoring server.
//!
//! Each accepted save becomes one commit. The branch state is the seeded
//! base graph with every commit replayed on top, so a revert is just
//! truncating the log and replaying.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use authoring_api::{
    ApiError, BranchOffering, CommitLogPage, LogQuery, ProjectApi, RevertRequest, SaveRequest,
    SaveResponse,
};
use authoring_graph::{
    Asset, AssetName, Author, BranchId, CommitId, CommitSegment, Edge, EdgeGroup, GraphOp,
    Includes, ProjectGraph,
};
use tokio::sync::watch;

/// Fake [`ProjectApi`] with failure injection and call recording.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the code under test owns another.
///
/// # Example
///
/// ```
/// use authoring_dry_tests::{titled, FakeProjectApi};
/// use authoring_graph::AssetTypeId;
///
/// let api = FakeProjectApi::new();
/// api.seed_node(titled("course-1", AssetTypeId::Course, "Intro to Rust"));
/// assert_eq!(api.head().0, 0);
/// ```
#[derive(Clone)]
pub struct FakeProjectApi {
    inner: Arc<Mutex<Inner>>,
    hold: Arc<watch::Sender<bool>>,
    save_attempts: Arc<watch::Sender<usize>>,
}

#[derive(Default)]
struct Inner {
    base: ProjectGraph,
    graph: ProjectGraph,
    log: Vec<CommitSegment>,
    author: Author,
    clock_ms: i64,
    offering: Option<BranchOffering>,
    fail_next_save: Option<ApiError>,
    fail_commit_log: Option<ApiError>,
    fail_revert: Option<ApiError>,
    fail_fetch: Option<ApiError>,
    saves: Vec<SaveRequest>,
    reverts: Vec<RevertRequest>,
    log_queries: Vec<LogQuery>,
}

impl Inner {
    fn head(&self) -> CommitId {
        self.log.last().map_or(CommitId(0), |s| s.last)
    }

    fn replay(&mut self) -> Result<(), ApiError> {
        let mut graph = self.base.clone();
        for segment in &self.log {
            graph.apply_all(&segment.ops).map_err(conflict)?;
        }
        self.graph = graph;
        Ok(())
    }
}

fn conflict(err: impl ToString) -> ApiError {
    ApiError::Status {
        status: 409,
        message: err.to_string(),
    }
}

fn not_found(what: impl ToString) -> ApiError {
    ApiError::Status {
        status: 404,
        message: what.to_string(),
    }
}

impl Default for FakeProjectApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProjectApi {
    /// Empty server with no commits.
    pub fn new() -> Self {
        let (hold, _) = watch::channel(false);
        let (save_attempts, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                author: Author {
                    id: 1,
                    given_name: Some("Test".into()),
                    family_name: Some("Author".into()),
                },
                clock_ms: 1_700_000_000_000,
                ..Inner::default()
            })),
            hold: Arc::new(hold),
            save_attempts: Arc::new(save_attempts),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ----- seeding ---------------------------------------------------------

    /// Add a node to the base graph (no commit).
    pub fn seed_node(&self, asset: Asset) {
        let mut inner = self.lock();
        inner.base.insert_node(asset.clone());
        inner.graph.insert_node(asset);
    }

    /// Add an edge to the base graph (no commit).
    pub fn seed_edge(&self, edge: Edge) {
        let mut inner = self.lock();
        inner.base.insert_edge(edge.clone());
        inner.graph.insert_edge(edge);
    }

    /// Record `ops` as one commit, as if another author had saved them.
    pub fn commit(&self, ops: Vec<GraphOp>) -> Result<CommitId, ApiError> {
        let mut inner = self.lock();
        inner.graph.apply_all(&ops).map_err(conflict)?;
        let id = CommitId(inner.head().0 + 1);
        inner.clock_ms += 1_000;
        let segment = CommitSegment {
            first: id,
            last: id,
            created_by: inner.author.clone(),
            created_ms: inner.clock_ms,
            ops,
        };
        inner.log.push(segment);
        Ok(id)
    }

    /// Set the published state.
    pub fn set_offering(&self, offering: Option<BranchOffering>) {
        self.lock().offering = offering;
    }

    // ----- failure injection -----------------------------------------------

    /// Fail the next save with `err`.
    pub fn fail_next_save(&self, err: ApiError) {
        self.lock().fail_next_save = Some(err);
    }

    /// Fail every commit log request with `err` until cleared.
    pub fn fail_commit_log(&self, err: Option<ApiError>) {
        self.lock().fail_commit_log = err;
    }

    /// Fail every revert with `err` until cleared.
    pub fn fail_revert(&self, err: Option<ApiError>) {
        self.lock().fail_revert = err;
    }

    /// Fail every node/includes fetch with `err` until cleared.
    pub fn fail_fetch(&self, err: Option<ApiError>) {
        self.lock().fail_fetch = err;
    }

    /// Park saves at the door until [`release_saves`](Self::release_saves).
    pub fn hold_saves(&self) {
        self.hold.send_replace(true);
    }

    /// Let parked and future saves through.
    pub fn release_saves(&self) {
        self.hold.send_replace(false);
    }

    /// Resolve once `n` saves have reached the server (parked or not).
    pub async fn saves_reached(&self, n: usize) {
        let mut rx = self.save_attempts.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    // ----- inspection ------------------------------------------------------

    /// Current head commit; `0` before any commit.
    pub fn head(&self) -> CommitId {
        self.lock().head()
    }

    /// Node as the server currently has it.
    pub fn node(&self, name: &AssetName) -> Option<Asset> {
        self.lock().graph.node(name).cloned()
    }

    /// Includes as the server currently has them.
    pub fn includes(&self, name: &AssetName) -> Includes {
        self.lock().graph.includes_of(name)
    }

    /// Every save request received, accepted or not.
    pub fn save_requests(&self) -> Vec<SaveRequest> {
        self.lock().saves.clone()
    }

    /// Every revert request received.
    pub fn revert_requests(&self) -> Vec<RevertRequest> {
        self.lock().reverts.clone()
    }

    /// Every commit log query received.
    pub fn log_queries(&self) -> Vec<LogQuery> {
        self.lock().log_queries.clone()
    }

    /// Full commit log, oldest first.
    pub fn log(&self) -> Vec<CommitSegment> {
        self.lock().log.clone()
    }
}

impl ProjectApi for FakeProjectApi {
    async fn fetch_node(&self, _branch: BranchId, name: &AssetName) -> Result<Asset, ApiError> {
        let inner = self.lock();
        if let Some(err) = inner.fail_fetch.clone() {
            return Err(err);
        }
        inner
            .graph
            .node(name)
            .cloned()
            .ok_or_else(|| not_found(format!("no asset {name}")))
    }

    async fn fetch_includes(
        &self,
        _branch: BranchId,
        name: &AssetName,
        group: Option<EdgeGroup>,
    ) -> Result<Includes, ApiError> {
        let inner = self.lock();
        if let Some(err) = inner.fail_fetch.clone() {
            return Err(err);
        }
        if inner.graph.node(name).is_none() {
            return Err(not_found(format!("no asset {name}")));
        }
        let all = inner.graph.includes_of(name);
        Ok(match group {
            Some(group) => Includes::from_edges(all.group(group).iter().cloned()),
            None => all,
        })
    }

    async fn save(&self, _branch: BranchId, request: &SaveRequest) -> Result<SaveResponse, ApiError> {
        self.save_attempts.send_modify(|count| *count += 1);
        let mut hold = self.hold.subscribe();
        let _ = hold.wait_for(|held| !*held).await;

        let mut inner = self.lock();
        inner.saves.push(request.clone());
        if let Some(err) = inner.fail_next_save.take() {
            return Err(err);
        }
        drop(inner);
        let commit_id = self.commit(request.ops.clone())?;

        let inner = self.lock();
        let mut touched: Vec<&AssetName> = request
            .ops
            .iter()
            .filter_map(|op| match op {
                GraphOp::AddNode { name, .. } | GraphOp::SetNodeData { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        touched.sort();
        touched.dedup();
        let updated_asset_nodes = touched
            .into_iter()
            .filter_map(|name| inner.graph.node(name).cloned())
            .collect();
        Ok(SaveResponse {
            updated_asset_nodes,
            commit_id: Some(commit_id),
        })
    }

    async fn commit_log(
        &self,
        _branch: BranchId,
        query: LogQuery,
    ) -> Result<CommitLogPage, ApiError> {
        let mut inner = self.lock();
        inner.log_queries.push(query);
        if let Some(err) = inner.fail_commit_log.clone() {
            return Err(err);
        }
        let objects = inner
            .log
            .iter()
            .rev()
            .filter(|s| query.from.is_none_or(|from| s.last < from))
            .take(query.limit)
            .cloned()
            .collect();
        Ok(CommitLogPage { objects })
    }

    async fn offering(&self, _branch: BranchId) -> Result<Option<BranchOffering>, ApiError> {
        Ok(self.lock().offering)
    }

    async fn revert(&self, _branch: BranchId, request: RevertRequest) -> Result<(), ApiError> {
        let mut inner = self.lock();
        inner.reverts.push(request);
        if let Some(err) = inner.fail_revert.clone() {
            return Err(err);
        }
        let head = inner.head();
        if request.from != head {
            return Err(conflict(format!(
                "branch head is {head}, revert expected {}",
                request.from
            )));
        }
        if request.to > head {
            return Err(not_found(format!("no commit {}", request.to)));
        }
        inner.log.retain(|s| s.last <= request.to);
        inner.replay()
    }
}
