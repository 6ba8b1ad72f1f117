// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Paged commit history for a branch, with revert.

use std::collections::BTreeSet;
use std::sync::Arc;

use authoring_api::{ApiError, BranchOffering, LogQuery, ProjectApi, RevertRequest};
use authoring_app_core::toast::{ToastKind, ToastStyle};
use authoring_graph::{AssetName, BranchId, CommitId, CommitSegment, GraphOp};
use tracing::{debug, info, instrument, warn};

use crate::notify::Notifier;
use crate::reducer::EditorAction;
use crate::store::EditorStore;

/// Drop `addNode` ops whose node is attached by an `addEdge` in the same
/// segment; the attachment already tells the story.
pub fn collapse_segment(segment: CommitSegment) -> CommitSegment {
    let attached: BTreeSet<AssetName> = segment
        .added_edge_targets()
        .into_iter()
        .cloned()
        .collect();
    let ops = segment
        .ops
        .into_iter()
        .filter(|op| !op.added_node().is_some_and(|n| attached.contains(n)))
        .collect();
    CommitSegment { ops, ..segment }
}

/// [`collapse_segment`] over a page.
pub fn collapse_segments(segments: Vec<CommitSegment>) -> Vec<CommitSegment> {
    segments.into_iter().map(collapse_segment).collect()
}

/// What the user is asked before a revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertPrompt {
    /// Commit to return to.
    pub target: CommitId,
    /// Current head.
    pub head: CommitId,
    /// Loaded segments that would be discarded.
    pub discarded: usize,
}

/// Result of [`RevisionHistory::revert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    /// The user declined; nothing was sent.
    Cancelled,
    /// The branch now ends at the target commit.
    Reverted,
}

/// Paged, collapsed view of a branch's commit log.
#[derive(Debug)]
pub struct RevisionHistory<A> {
    api: A,
    branch: BranchId,
    page_size: usize,
    store: Arc<EditorStore>,
    notifier: Notifier,
    segments: Vec<CommitSegment>,
    cursor: Option<CommitId>,
    loading: bool,
    exhausted: bool,
    refresh: u64,
    offering: Option<BranchOffering>,
}

impl<A: ProjectApi> RevisionHistory<A> {
    /// Empty history for `branch`; nothing is fetched until
    /// [`load_more`](Self::load_more).
    pub fn new(
        api: A,
        branch: BranchId,
        page_size: usize,
        store: Arc<EditorStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            api,
            branch,
            page_size: page_size.max(1),
            store,
            notifier,
            segments: Vec::new(),
            cursor: None,
            loading: false,
            exhausted: false,
            refresh: 0,
            offering: None,
        }
    }

    /// Loaded segments, newest first.
    pub fn segments(&self) -> &[CommitSegment] {
        &self.segments
    }

    /// Cursor for the next page.
    pub const fn cursor(&self) -> Option<CommitId> {
        self.cursor
    }

    /// A page fetch is in progress.
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The last page was short; there is nothing older.
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Times the history was reset.
    pub const fn refresh_count(&self) -> u64 {
        self.refresh
    }

    /// Last fetched published state.
    pub const fn offering(&self) -> Option<BranchOffering> {
        self.offering
    }

    /// Newest loaded commit.
    pub fn head(&self) -> Option<CommitId> {
        self.segments.first().map(|s| s.last)
    }

    /// Fetch and append the next page. Returns the number of segments
    /// appended.
    #[instrument(skip(self), fields(branch = %self.branch))]
    pub async fn load_more(&mut self) -> Result<usize, ApiError> {
        if self.exhausted {
            return Ok(0);
        }
        self.loading = true;
        let query = LogQuery {
            limit: self.page_size,
            from: self.cursor,
        };
        let result = self.api.commit_log(self.branch, query).await;
        self.loading = false;
        match result {
            Ok(page) => {
                let fetched = page.objects.len();
                self.exhausted = fetched < self.page_size;
                let page = collapse_segments(page.objects);
                if let Some(oldest) = page.last() {
                    self.cursor = Some(oldest.last);
                }
                self.segments.extend(page);
                debug!(fetched, exhausted = self.exhausted, "history page");
                Ok(fetched)
            }
            Err(err) => {
                warn!(error = %err, "history page failed");
                self.notifier
                    .transient_error("Could not load history", &err);
                Err(err)
            }
        }
    }

    /// Forget everything loaded; the next [`load_more`](Self::load_more)
    /// starts from the head.
    pub fn refresh(&mut self) {
        self.refresh += 1;
        self.segments.clear();
        self.cursor = None;
        self.exhausted = false;
    }

    /// Fetch the branch's published state.
    #[instrument(skip(self), fields(branch = %self.branch))]
    pub async fn load_offering(&mut self) -> Result<Option<BranchOffering>, ApiError> {
        match self.api.offering(self.branch).await {
            Ok(offering) => {
                self.offering = offering;
                Ok(offering)
            }
            Err(err) => {
                warn!(error = %err, "offering fetch failed");
                self.notifier
                    .transient_error("Could not load published version", &err);
                Err(err)
            }
        }
    }

    /// Discard every commit after `target`, after `confirm` agrees.
    #[instrument(skip(self, confirm), fields(branch = %self.branch))]
    pub async fn revert<F>(
        &mut self,
        target: CommitId,
        head: CommitId,
        confirm: F,
    ) -> Result<RevertOutcome, ApiError>
    where
        F: FnOnce(&RevertPrompt) -> bool,
    {
        let prompt = RevertPrompt {
            target,
            head,
            discarded: self.segments.iter().filter(|s| s.last > target).count(),
        };
        if !confirm(&prompt) {
            debug!("revert declined");
            return Ok(RevertOutcome::Cancelled);
        }
        let request = RevertRequest {
            to: target,
            from: head,
        };
        if let Err(err) = self.api.revert(self.branch, request).await {
            warn!(error = %err, "revert failed");
            self.notifier.blocking_error("Revert failed", &err);
            return Err(err);
        }
        self.refresh();
        self.store.dispatch(EditorAction::ReloadAssetEditor);
        self.notifier.raise(
            ToastKind::Success,
            ToastStyle::Transient,
            format!("Reverted to commit {target}"),
            None,
        );
        info!(%target, %head, "branch reverted");
        Ok(RevertOutcome::Reverted)
    }
}

/// Ops of a segment that touch `name`.
pub fn ops_touching<'a>(
    segment: &'a CommitSegment,
    name: &'a AssetName,
) -> impl Iterator<Item = &'a GraphOp> + 'a {
    segment.ops.iter().filter(move |op| match op {
        GraphOp::AddNode { name: n, .. } | GraphOp::SetNodeData { name: n, .. } => n == name,
        GraphOp::AddEdge(edge) => edge.source_name == *name || edge.target_name == *name,
        GraphOp::SetEdgeData { source_name, .. }
        | GraphOp::DeleteEdge { source_name, .. }
        | GraphOp::SetEdgeOrder { source_name, .. } => source_name == name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use authoring_graph::{AssetTypeId, Author, Data, Edge, EdgeGroup, EdgeName};

    fn add_node(name: &str) -> GraphOp {
        GraphOp::AddNode {
            name: AssetName::new(name),
            type_id: AssetTypeId::Html,
            data: Data::new(),
        }
    }

    fn add_edge(source: &str, target: &str) -> GraphOp {
        GraphOp::AddEdge(Edge {
            name: EdgeName::new(format!("{source}-{target}")),
            source_name: AssetName::new(source),
            target_name: AssetName::new(target),
            target_type: AssetTypeId::Html,
            group: EdgeGroup::Elements,
            position: 0,
            data: None,
        })
    }

    fn segment(ops: Vec<GraphOp>) -> CommitSegment {
        CommitSegment {
            first: CommitId(1),
            last: CommitId(2),
            created_by: Author::default(),
            created_ms: 0,
            ops,
        }
    }

    #[test]
    fn attached_node_is_collapsed() {
        let collapsed = collapse_segment(segment(vec![add_node("N"), add_edge("P", "N")]));
        assert_eq!(collapsed.ops, vec![add_edge("P", "N")]);
    }

    #[test]
    fn unattached_node_is_kept() {
        let ops = vec![add_node("N"), add_edge("P", "M")];
        assert_eq!(collapse_segment(segment(ops.clone())).ops, ops);
    }

    #[test]
    fn collapse_never_crosses_segments() {
        let page = collapse_segments(vec![
            segment(vec![add_edge("P", "N")]),
            segment(vec![add_node("N")]),
        ]);
        assert_eq!(page[1].ops, vec![add_node("N")]);
    }

    #[test]
    fn ops_touching_filters_by_name() {
        let seg = segment(vec![add_node("N"), add_edge("P", "N"), add_node("Q")]);
        let name = AssetName::new("N");
        assert_eq!(ops_touching(&seg, &name).count(), 2);
    }
}
