// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preference loading with command-line overrides.

use std::io::Write;

use anyhow::{Context, Result};
use authoring_app_core::config::ConfigService;
use authoring_app_core::prefs::{EditorPrefs, EDITOR_PREFS_KEY};
use authoring_config_fs::FsConfigStore;

use crate::cli::{Cli, Format};
use crate::output;

/// Saved preferences (written on first use) with flags applied on top.
pub fn resolve(cli: &Cli) -> Result<EditorPrefs> {
    let store = match &cli.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("open config directory")?;
    let service = ConfigService::new(store);
    let mut prefs: EditorPrefs = service
        .load_or_init(EDITOR_PREFS_KEY)
        .context("load editor preferences")?;
    if let Some(api) = &cli.api {
        prefs.api_base_url.clone_from(api);
    }
    if let Some(token) = &cli.csrf_token {
        prefs.csrf_token = Some(token.clone());
    }
    tracing::debug!(api = %prefs.api_base_url, "preferences resolved");
    Ok(prefs)
}

pub fn show(out: &mut impl Write, prefs: &EditorPrefs, format: Format) -> Result<()> {
    if format == Format::Json {
        return output::json(out, prefs);
    }
    let mut table = output::table(["Setting", "Value"]);
    let token = prefs.csrf_token.as_ref().map_or("(none)", |_| "(set)");
    table
        .add_row(vec!["api_base_url", prefs.api_base_url.as_str()])
        .add_row(vec!["csrf_token", token])
        .add_row(vec![
            "autosave_debounce_ms".to_string(),
            prefs.autosave_debounce_ms.to_string(),
        ])
        .add_row(vec![
            "history_page_size".to_string(),
            prefs.page_size().to_string(),
        ])
        .add_row(vec!["toast_ttl_ms".to_string(), prefs.toast_ttl_ms.to_string()])
        .add_row(vec!["max_toasts".to_string(), prefs.max_toasts.to_string()]);
    writeln!(out, "{table}")?;
    Ok(())
}
