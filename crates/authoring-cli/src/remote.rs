// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Commands that talk to the authoring server.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use authoring_app_core::prefs::EditorPrefs;
use authoring_client::HttpProjectApi;
use authoring_editor::{
    ops_touching, AutosaveOutcome, EditorStore, GraphEditService, Notifier, RevertOutcome,
    RevertPrompt, RevisionHistory,
};
use authoring_graph::{AssetName, BranchId, CommitId, CommitSegment, Data, GraphOp};
use serde_json::{json, Value};

use crate::cli::Format;
use crate::output;

/// Server handle plus the editor plumbing every command shares.
pub struct Session {
    api: HttpProjectApi,
    branch: BranchId,
    prefs: EditorPrefs,
    store: Arc<EditorStore>,
    notifier: Notifier,
}

impl Session {
    pub fn connect(prefs: EditorPrefs, branch: BranchId) -> Result<Self> {
        let api = HttpProjectApi::from_prefs(&prefs)
            .with_context(|| format!("configure client for {}", prefs.api_base_url))?;
        let notifier = Notifier::from_prefs(&prefs);
        Ok(Self {
            api,
            branch,
            prefs,
            store: Arc::new(EditorStore::default()),
            notifier,
        })
    }

    fn editor(&self) -> GraphEditService<HttpProjectApi> {
        GraphEditService::new(
            self.api.clone(),
            self.branch,
            self.store.clone(),
            self.notifier.clone(),
        )
        .with_prefs(&self.prefs)
    }

    fn revisions(&self, page_size: Option<usize>) -> RevisionHistory<HttpProjectApi> {
        RevisionHistory::new(
            self.api.clone(),
            self.branch,
            page_size.unwrap_or_else(|| self.prefs.page_size()),
            self.store.clone(),
            self.notifier.clone(),
        )
    }

    pub async fn show(&self, out: &mut impl Write, asset: &str, format: Format) -> Result<()> {
        let name = AssetName::new(asset);
        self.editor()
            .open_asset(&name)
            .await
            .with_context(|| format!("could not load {name}"))?;
        let state = self.store.snapshot();
        let Some(node) = state.asset_node else {
            bail!("{name} did not load");
        };

        if format == Format::Json {
            return output::json(out, &json!({ "asset": node, "includes": state.includes }));
        }
        writeln!(
            out,
            "{} ({}): {}",
            node.name,
            node.type_id,
            node.title().unwrap_or("untitled")
        )?;
        if state.includes.is_empty() {
            writeln!(out, "no includes")?;
            return Ok(());
        }
        let mut table = output::table(["Group", "#", "Edge", "Target", "Target type"]);
        for (group, edges) in state.includes.groups() {
            for edge in edges {
                table.add_row(vec![
                    group.to_string(),
                    edge.position.to_string(),
                    edge.name.to_string(),
                    edge.target_name.to_string(),
                    edge.target_type.to_string(),
                ]);
            }
        }
        writeln!(out, "{table}")?;
        Ok(())
    }

    pub async fn edit(
        &self,
        out: &mut impl Write,
        asset: &str,
        label: &str,
        set: Vec<(String, Value)>,
    ) -> Result<()> {
        let name = AssetName::new(asset);
        let editor = self.editor();
        editor
            .open_asset(&name)
            .await
            .with_context(|| format!("could not load {name}"))?;
        editor.begin_edit(label, None);
        let partial: Data = set.into_iter().collect();
        editor.edit_node_data(&name, partial)?;
        editor.close_session();
        match editor.autosave_debounced().await {
            AutosaveOutcome::Saved { commit: Some(commit) } => {
                writeln!(out, "saved {name} as commit {commit}")?;
            }
            AutosaveOutcome::Saved { commit: None } => writeln!(out, "saved {name}")?,
            AutosaveOutcome::Clean | AutosaveOutcome::Queued => {
                writeln!(out, "nothing to save")?;
            }
            AutosaveOutcome::Failed(err) => {
                return Err(err).with_context(|| format!("could not save {name}"));
            }
        }
        Ok(())
    }

    pub async fn history(
        &self,
        out: &mut impl Write,
        pages: usize,
        limit: Option<usize>,
        asset: Option<&str>,
        format: Format,
    ) -> Result<()> {
        let mut history = self.revisions(limit);
        for _ in 0..pages.max(1) {
            history.load_more().await.context("could not load history")?;
            if history.is_exhausted() {
                break;
            }
        }
        let live = history
            .load_offering()
            .await
            .context("could not load published version")?
            .map(|o| o.commit_id);

        let filter = asset.map(AssetName::new);
        let rows: Vec<(&CommitSegment, Vec<&GraphOp>)> = history
            .segments()
            .iter()
            .map(|s| {
                let ops: Vec<&GraphOp> = match &filter {
                    Some(name) => ops_touching(s, name).collect(),
                    None => s.ops.iter().collect(),
                };
                (s, ops)
            })
            .filter(|(_, ops)| !ops.is_empty())
            .collect();

        if format == Format::Json {
            let values: Vec<Value> = rows
                .iter()
                .map(|(s, ops)| {
                    json!({
                        "first": s.first,
                        "last": s.last,
                        "author": s.created_by.display_name(),
                        "createdMs": s.created_ms,
                        "live": live.is_some_and(|c| s.spans(c)),
                        "ops": ops,
                    })
                })
                .collect();
            return output::json(out, &values);
        }

        if rows.is_empty() {
            writeln!(out, "no history")?;
            return Ok(());
        }
        let mut table = output::table(["Commits", "Author", "When", "Changes", ""]);
        for (segment, ops) in rows {
            table.add_row(vec![
                commit_range(segment.first, segment.last),
                segment.created_by.display_name(),
                output::timestamp(segment.created_ms),
                summarize(&ops),
                if live.is_some_and(|c| segment.spans(c)) {
                    "live".to_string()
                } else {
                    String::new()
                },
            ]);
        }
        writeln!(out, "{table}")?;
        if !history.is_exhausted() {
            writeln!(out, "more history available (use --pages)")?;
        }
        Ok(())
    }

    pub async fn offering(&self, out: &mut impl Write, format: Format) -> Result<()> {
        let offering = self
            .revisions(None)
            .load_offering()
            .await
            .context("could not load published version")?;
        if format == Format::Json {
            return output::json(out, &offering);
        }
        match offering {
            Some(o) => writeln!(
                out,
                "commit {} published {}",
                o.commit_id,
                output::timestamp(o.commit_time)
            )?,
            None => writeln!(out, "not published")?,
        }
        Ok(())
    }

    pub async fn revert(&self, out: &mut impl Write, to: CommitId, yes: bool) -> Result<()> {
        let mut history = self.revisions(None);
        history.load_more().await.context("could not load history")?;
        let Some(head) = history.head() else {
            bail!("branch {} has no commits", self.branch);
        };
        if to >= head {
            bail!("commit {to} is not older than the head ({head})");
        }
        let outcome = history
            .revert(to, head, |prompt| yes || confirm(prompt))
            .await
            .with_context(|| format!("could not revert to commit {to}"))?;
        match outcome {
            RevertOutcome::Reverted => {
                writeln!(out, "reverted branch {} to commit {to}", self.branch)?;
            }
            RevertOutcome::Cancelled => writeln!(out, "revert cancelled")?,
        }
        Ok(())
    }
}

fn confirm(prompt: &RevertPrompt) -> bool {
    let mut err = io::stderr().lock();
    let asked = writeln!(
        err,
        "Revert to commit {}? This discards every change after it up to commit {} \
         ({} loaded history entries). [y/N]",
        prompt.target, prompt.head, prompt.discarded
    );
    if asked.is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn commit_range(first: CommitId, last: CommitId) -> String {
    if first == last {
        first.to_string()
    } else {
        format!("{first}-{last}")
    }
}

/// "2 setNodeData, 1 addEdge" in first-seen order.
fn summarize(ops: &[&GraphOp]) -> String {
    let mut order = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for op in ops {
        let kind = op.kind();
        let count = counts.entry(kind).or_insert(0);
        if *count == 0 {
            order.push(kind);
        }
        *count += 1;
    }
    order
        .into_iter()
        .map(|kind| format!("{} {kind}", counts[kind]))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use authoring_graph::EdgeName;

    #[test]
    fn summary_counts_in_first_seen_order() {
        let set = GraphOp::SetNodeData {
            name: AssetName::new("a"),
            data: Data::new(),
        };
        let delete = GraphOp::DeleteEdge {
            name: EdgeName::new("e"),
            source_name: AssetName::new("a"),
        };
        assert_eq!(summarize(&[&set, &delete, &set]), "2 setNodeData, 1 deleteEdge");
        assert_eq!(summarize(&[]), "");
    }

    #[test]
    fn single_commit_ranges_collapse() {
        assert_eq!(commit_range(CommitId(4), CommitId(4)), "4");
        assert_eq!(commit_range(CommitId(4), CommitId(6)), "4-6");
    }
}
