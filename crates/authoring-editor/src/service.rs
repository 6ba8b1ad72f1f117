// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph edit service: edit sessions, structural mutations and autosave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use authoring_api::{ApiError, ProjectApi};
use authoring_app_core::prefs::EditorPrefs;
use authoring_graph::{
    Asset, AssetName, AssetTypeId, BranchId, CommitId, Data, EdgeGroup, EdgeName, EdgeRuleSchema,
    Includes,
};
use tracing::{debug, info, instrument, warn};

use crate::buffer::{EditBuffer, EditStatus};
use crate::error::EditError;
use crate::notify::Notifier;
use crate::reducer::EditorAction;
use crate::session::{EditSession, SessionTracker};
use crate::state::PendingCategory;
use crate::store::EditorStore;

/// Result of one [`GraphEditService::autosave`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveOutcome {
    /// Nothing to save.
    Clean,
    /// The save (and any follow-up it ran) succeeded.
    Saved {
        /// Commit reported by the server for the last save.
        commit: Option<CommitId>,
    },
    /// A save was already in flight; a follow-up is queued behind it.
    Queued,
    /// The save failed; edits stay pending for the next attempt.
    Failed(ApiError),
}

#[derive(Debug, Default)]
struct SaveGate {
    in_flight: bool,
    follow_up: bool,
}

/// Holds the save gate for one [`GraphEditService::autosave`] call.
///
/// Dropping the call mid-save (timeout, `select!`, task abort) puts the
/// pending edits back and reopens the gate.
struct GateGuard<'a, A> {
    service: &'a GraphEditService<A>,
    saving: bool,
    released: bool,
}

impl<A> Drop for GateGuard<'_, A> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        {
            let mut inner = self
                .service
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.saving {
                inner.buffer.abort_save();
            }
            inner.gate = SaveGate::default();
        }
        if self.saving {
            warn!("autosave dropped mid-save, edits kept for the next one");
            self.service.store.dispatch(EditorAction::SaveAssetError);
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    buffer: EditBuffer,
    sessions: SessionTracker,
    gate: SaveGate,
}

/// Applies edits to a working copy of the graph and saves them.
///
/// Edits are optimistic: the working copy and the editor store change
/// immediately, and [`autosave`](Self::autosave) later sends everything
/// pending as one [`authoring_api::SaveRequest`].
#[derive(Debug)]
pub struct GraphEditService<A> {
    api: A,
    branch: BranchId,
    store: Arc<EditorStore>,
    notifier: Notifier,
    schema: &'static EdgeRuleSchema,
    debounce: Duration,
    inner: Mutex<Inner>,
}

impl<A: ProjectApi> GraphEditService<A> {
    /// Service editing `branch` through `api`, reporting into `store`.
    pub fn new(api: A, branch: BranchId, store: Arc<EditorStore>, notifier: Notifier) -> Self {
        Self {
            api,
            branch,
            store,
            notifier,
            schema: EdgeRuleSchema::standard(),
            debounce: EditorPrefs::default().autosave_debounce(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Take the autosave quiet period from saved preferences.
    pub fn with_prefs(mut self, prefs: &EditorPrefs) -> Self {
        self.debounce = prefs.autosave_debounce();
        self
    }

    /// Quiet period used by [`autosave_debounced`](Self::autosave_debounced).
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Editor store this service reports into.
    pub const fn store(&self) -> &Arc<EditorStore> {
        &self.store
    }

    /// Branch under edit.
    pub const fn branch(&self) -> BranchId {
        self.branch
    }

    /// Server port.
    pub const fn api(&self) -> &A {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, name: &AssetName) -> bool {
        self.store.read(|s| s.current_name() == Some(name))
    }

    // ----- sessions --------------------------------------------------------

    /// Open a session labelled `label`, or continue the open one when
    /// `token` matches it. Returns the session token.
    pub fn begin_edit(&self, label: &str, token: Option<&str>) -> String {
        let token = self.lock().sessions.begin(label, token, Instant::now());
        debug!(label, %token, "edit session");
        token
    }

    /// Close the open session.
    pub fn close_session(&self) -> Option<EditSession> {
        self.lock().sessions.close()
    }

    /// The open session.
    pub fn current_session(&self) -> Option<EditSession> {
        self.lock().sessions.current().cloned()
    }

    /// Closed sessions, oldest first.
    pub fn closed_sessions(&self) -> Vec<EditSession> {
        self.lock().sessions.closed().cloned().collect()
    }

    // ----- loading ---------------------------------------------------------

    /// Fetch an asset and its includes and make it the asset under edit.
    #[instrument(skip(self), fields(branch = %self.branch))]
    pub async fn open_asset(&self, name: &AssetName) -> Result<(), EditError> {
        let (node, includes) = tokio::join!(
            self.api.fetch_node(self.branch, name),
            self.api.fetch_includes(self.branch, name, None),
        );
        let (node, includes) = match (node, includes) {
            (Ok(node), Ok(includes)) => (node, includes),
            (Err(err), _) | (_, Err(err)) => {
                warn!(%name, error = %err, "could not load asset");
                self.notifier
                    .transient_error(format!("Could not load {name}"), &err);
                return Err(err.into());
            }
        };
        let (node, includes) = {
            let mut inner = self.lock();
            let node = inner.buffer.load_node(node);
            inner.buffer.load_edges(name, None, includes.edges().cloned());
            (node, inner.buffer.includes_of(name))
        };
        self.store.dispatch(EditorAction::SetCurrentAssetNode(node));
        self.store.dispatch(EditorAction::SetCurrentIncludes(includes));
        info!(%name, "asset opened");
        Ok(())
    }

    /// Refetch one edge group of `source` from the server.
    #[instrument(skip(self), fields(branch = %self.branch))]
    pub async fn refresh_group(&self, source: &AssetName, group: EdgeGroup) -> Result<(), EditError> {
        let fetched = match self
            .api
            .fetch_includes(self.branch, source, Some(group))
            .await
        {
            Ok(includes) => includes,
            Err(err) => {
                warn!(%source, %group, error = %err, "could not refresh group");
                self.notifier
                    .transient_error(format!("Could not refresh {group}"), &err);
                return Err(err.into());
            }
        };
        self.lock()
            .buffer
            .load_edges(source, Some(group), fetched.group(group).iter().cloned());
        self.sync_group(source, group);
        Ok(())
    }

    /// Register a node obtained elsewhere (a search result, say) so edges
    /// can target it.
    pub fn track_node(&self, asset: Asset) -> Asset {
        self.lock().buffer.load_node(asset)
    }

    /// Working copy of a node.
    pub fn node(&self, name: &AssetName) -> Option<Asset> {
        self.lock().buffer.node(name).cloned()
    }

    /// Unsaved status of a node.
    pub fn node_status(&self, name: &AssetName) -> Option<EditStatus> {
        self.lock().buffer.node_status(name)
    }

    /// Unsaved status of an edge.
    pub fn edge_status(&self, name: &EdgeName) -> Option<EditStatus> {
        self.lock().buffer.edge_status(name)
    }

    /// Working copy of all outgoing edges of `source`.
    pub fn includes_of(&self, source: &AssetName) -> Includes {
        self.lock().buffer.includes_of(source)
    }

    /// Whether any edit is waiting to be saved.
    pub fn has_pending(&self) -> bool {
        self.lock().buffer.has_pending()
    }

    // ----- mutations -------------------------------------------------------

    /// Create a provisional asset and make it the asset under edit.
    pub fn new_asset(&self, type_id: AssetTypeId, data: Data) -> AssetName {
        let asset = {
            let mut inner = self.lock();
            inner.sessions.record_edit(Instant::now());
            inner.buffer.add_node(type_id, data)
        };
        let name = asset.name.clone();
        self.store.dispatch(EditorAction::SetNewAssetAndIncludes {
            asset,
            includes: Includes::new(),
        });
        self.trigger_dirty();
        debug!(%name, %type_id, "new asset");
        name
    }

    /// Create a provisional asset without opening it.
    pub fn add_node(&self, type_id: AssetTypeId, data: Data) -> AssetName {
        let name = {
            let mut inner = self.lock();
            inner.sessions.record_edit(Instant::now());
            inner.buffer.add_node(type_id, data).name
        };
        self.trigger_dirty();
        name
    }

    /// Shallow-merge `partial` into a node's data.
    pub fn edit_node_data(&self, name: &AssetName, partial: Data) -> Result<(), EditError> {
        let asset = {
            let mut inner = self.lock();
            let asset = inner.buffer.edit_node(name, partial)?;
            inner.sessions.record_edit(Instant::now());
            asset
        };
        if self.is_current(name) {
            self.store.dispatch(EditorAction::SetCurrentAssetNode(asset));
        }
        self.trigger_dirty();
        Ok(())
    }

    /// Shallow-merge `partial` into an edge's data.
    pub fn edit_edge_data(
        &self,
        source: &AssetName,
        edge: &EdgeName,
        partial: Data,
    ) -> Result<(), EditError> {
        let group = {
            let mut inner = self.lock();
            let edge = inner.buffer.edit_edge(source, edge, partial)?;
            inner.sessions.record_edit(Instant::now());
            edge.group
        };
        self.sync_group(source, group);
        self.trigger_dirty();
        Ok(())
    }

    /// Attach `target` to `source` at the end of `group`.
    ///
    /// # Panics
    /// If the schema does not allow `target`'s type in `group` of
    /// `source`'s type.
    pub fn add_edge(
        &self,
        source: &AssetName,
        group: EdgeGroup,
        target: &AssetName,
        data: Option<Data>,
    ) -> Result<EdgeName, EditError> {
        let name = {
            let mut inner = self.lock();
            let source_type = inner
                .buffer
                .node(source)
                .ok_or_else(|| EditError::UnknownNode(source.clone()))?
                .type_id;
            let target = inner
                .buffer
                .node(target)
                .cloned()
                .ok_or_else(|| EditError::UnknownNode(target.clone()))?;
            self.schema.assert_legal(source_type, group, target.type_id);
            inner.sessions.record_edit(Instant::now());
            inner.buffer.add_edge(source, group, &target, data).name
        };
        self.sync_group(source, group);
        self.trigger_dirty();
        Ok(name)
    }

    /// Create a provisional asset and attach it under `source` in one step.
    pub fn add_child(
        &self,
        source: &AssetName,
        group: EdgeGroup,
        type_id: AssetTypeId,
        data: Data,
    ) -> Result<(AssetName, EdgeName), EditError> {
        let child = self.add_node(type_id, data);
        let edge = self.add_edge(source, group, &child, None)?;
        Ok((child, edge))
    }

    /// Detach an edge from `source`.
    pub fn remove_edge(&self, source: &AssetName, edge: &EdgeName) -> Result<(), EditError> {
        let group = {
            let mut inner = self.lock();
            let removed = inner.buffer.remove_edge(source, edge)?;
            inner.sessions.record_edit(Instant::now());
            removed.group
        };
        self.sync_group(source, group);
        self.trigger_dirty();
        Ok(())
    }

    /// Move an edge to `index` within its group.
    pub fn move_edge(
        &self,
        source: &AssetName,
        edge: &EdgeName,
        index: usize,
    ) -> Result<(), EditError> {
        let group = {
            let mut inner = self.lock();
            let group = inner.buffer.move_edge(source, edge, index)?;
            inner.sessions.record_edit(Instant::now());
            group
        };
        self.sync_group(source, group);
        self.trigger_dirty();
        Ok(())
    }

    /// Set the gradebook category of the asset under edit.
    ///
    /// The override is written as edge edits on the `gradebookCategory`
    /// group, so it rides along with the next save.
    pub fn set_category(&self, category: PendingCategory) -> Result<(), EditError> {
        let current = self
            .store
            .read(|s| s.asset_node.as_ref().map(|a| (a.name.clone(), a.type_id)))
            .ok_or(EditError::NoCurrentAsset)?;
        let (source, source_type) = current;
        let group = EdgeGroup::GradebookCategory;
        {
            let mut inner = self.lock();
            let target = match &category {
                PendingCategory::Set(name) => {
                    let target = inner
                        .buffer
                        .node(name)
                        .cloned()
                        .ok_or_else(|| EditError::UnknownNode(name.clone()))?;
                    self.schema.check(source_type, group, target.type_id)?;
                    Some(target)
                }
                PendingCategory::Cleared | PendingCategory::Unset => None,
            };
            if category != PendingCategory::Unset {
                for edge in inner.buffer.group_of(&source, group) {
                    inner.buffer.remove_edge(&source, &edge.name)?;
                }
                if let Some(target) = target {
                    inner.buffer.add_edge(&source, group, &target, None);
                }
                inner.sessions.record_edit(Instant::now());
            }
        }
        self.sync_group(&source, group);
        self.store
            .dispatch(EditorAction::UpdateAssetCategory(category));
        Ok(())
    }

    /// Mark the editor dirty unless it already is.
    pub fn trigger_dirty(&self) {
        if !self.store.read(|s| s.dirty) {
            self.store.dispatch(EditorAction::AssetEditorDirty);
        }
    }

    /// Ask consumers to refetch.
    pub fn reload(&self) {
        self.store.dispatch(EditorAction::ReloadAssetEditor);
    }

    fn sync_group(&self, source: &AssetName, group: EdgeGroup) {
        if self.is_current(source) {
            let edges = self.lock().buffer.group_of(source, group);
            self.store
                .dispatch(EditorAction::UpdateIncludes { group, edges });
        }
    }

    // ----- saving ----------------------------------------------------------

    /// Save everything pending.
    ///
    /// At most one save is in flight. Calls made meanwhile queue a single
    /// follow-up, which the in-flight caller runs once its save succeeds.
    #[instrument(skip(self), fields(branch = %self.branch))]
    pub async fn autosave(&self) -> AutosaveOutcome {
        {
            let mut inner = self.lock();
            if inner.gate.in_flight {
                inner.gate.follow_up = true;
                debug!("save in flight, follow-up queued");
                return AutosaveOutcome::Queued;
            }
            if !self.store.read(|s| s.dirty) && !inner.buffer.has_pending() {
                return AutosaveOutcome::Clean;
            }
            inner.gate.in_flight = true;
        }

        let mut guard = GateGuard {
            service: self,
            saving: false,
            released: false,
        };
        let mut outcome = self.save_once(&mut guard).await;
        loop {
            let again = {
                let mut inner = self.lock();
                let again = inner.gate.follow_up
                    && matches!(outcome, AutosaveOutcome::Saved { .. })
                    && inner.buffer.has_pending();
                inner.gate.follow_up = false;
                if !again {
                    inner.gate.in_flight = false;
                    guard.released = true;
                }
                again
            };
            if !again {
                break;
            }
            debug!("running queued follow-up save");
            outcome = self.save_once(&mut guard).await;
        }
        outcome
    }

    /// Wait until no edit has arrived for `quiet`, then autosave.
    pub async fn autosave_when_idle(&self, quiet: Duration) -> AutosaveOutcome {
        loop {
            let seen = self.lock().buffer.latest_seq();
            tokio::time::sleep(quiet).await;
            if self.lock().buffer.latest_seq() == seen {
                return self.autosave().await;
            }
        }
    }

    /// [`autosave_when_idle`](Self::autosave_when_idle) with the configured
    /// quiet period.
    pub async fn autosave_debounced(&self) -> AutosaveOutcome {
        self.autosave_when_idle(self.debounce).await
    }

    async fn save_once(&self, guard: &mut GateGuard<'_, A>) -> AutosaveOutcome {
        let pending = self.lock().buffer.begin_save();
        if pending.request.is_empty() {
            // Dirty without edits: nothing the server needs to hear about.
            self.store.dispatch(EditorAction::AssetEditorClean);
            return AutosaveOutcome::Clean;
        }
        guard.saving = true;
        self.store.dispatch(EditorAction::SaveAssetStart);
        debug!(ops = pending.request.ops.len(), seq = pending.seq, "saving");

        let result = self.api.save(self.branch, &pending.request).await;
        guard.saving = false;
        match result {
            Ok(response) => {
                let (updated, newer_edits) = {
                    let mut inner = self.lock();
                    inner
                        .buffer
                        .settle(&pending, &response.updated_asset_nodes);
                    let updated: Vec<Asset> = response
                        .updated_asset_nodes
                        .iter()
                        .filter_map(|a| inner.buffer.node(&a.name).cloned())
                        .collect();
                    (updated, inner.buffer.latest_seq() > pending.seq)
                };
                let current_asset_name = self.store.read(|s| s.current_name().cloned());
                self.store.dispatch(EditorAction::SaveAssetsSuccess {
                    updated_asset_nodes: updated,
                    current_asset_name,
                    newer_edits,
                });
                info!(commit = ?response.commit_id, newer_edits, "saved");
                AutosaveOutcome::Saved {
                    commit: response.commit_id,
                }
            }
            Err(err) => {
                self.lock().buffer.abort_save();
                self.store.dispatch(EditorAction::SaveAssetError);
                warn!(error = %err, "save failed");
                self.notifier.transient_error("Changes not saved", &err);
                AutosaveOutcome::Failed(err)
            }
        }
    }
}
