// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use authoring_graph::{AssetTypeId, BranchId};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(author, version, about = "Course authoring graph tools")]
pub struct Cli {
    /// Directory holding saved preferences (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
    /// Authoring server base URL; overrides saved preferences
    #[arg(long, global = true, value_name = "URL")]
    pub api: Option<String>,
    /// CSRF token for mutating requests; overrides saved preferences
    #[arg(long, global = true)]
    pub csrf_token: Option<String>,
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct Branch {
    /// Branch to work on
    #[arg(short, long)]
    branch: u64,
}

impl Branch {
    pub const fn id(&self) -> BranchId {
        BranchId(self.branch)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the edge rule table
    Schema {
        /// Only this source type (`lesson` or `lesson.1`)
        #[arg(long = "type", value_name = "TYPE")]
        type_id: Option<AssetTypeId>,
        /// List every edge group name instead
        #[arg(long, conflicts_with = "type_id")]
        groups: bool,
    },

    /// Print the resolved editor preferences
    Prefs,

    /// Show an asset and its includes
    Show {
        #[command(flatten)]
        branch: Branch,
        /// Asset name
        asset: String,
    },

    /// Merge fields into an asset's data and save
    Edit {
        #[command(flatten)]
        branch: Branch,
        /// Asset name
        asset: String,
        /// Field assignment; the value is parsed as JSON, falling back to a string
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment, required = true)]
        set: Vec<(String, Value)>,
        /// Edit session label
        #[arg(long, default_value = "Edit")]
        label: String,
    },

    /// List the branch's commit history, newest first
    History {
        #[command(flatten)]
        branch: Branch,
        /// Pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Segments per page; defaults to the saved preference
        #[arg(long)]
        limit: Option<usize>,
        /// Only show ops touching this asset
        #[arg(long)]
        asset: Option<String>,
    },

    /// Print the published commit of a branch
    Offering {
        #[command(flatten)]
        branch: Branch,
    },

    /// Discard every commit after the given one
    Revert {
        #[command(flatten)]
        branch: Branch,
        /// Commit to return to
        to: u64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("empty key in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
