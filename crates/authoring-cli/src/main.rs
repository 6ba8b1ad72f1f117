// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `authoring`: inspect and edit a course authoring branch from the terminal.
//!
//! `schema` and `prefs` work offline; every other command talks to the
//! server configured in the saved preferences (or `--api`).

mod cli;
mod output;
mod prefs;
mod remote;
mod schema;

use std::io;

use anyhow::Result;
use authoring_graph::CommitId;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::remote::Session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(io::stderr)
        .init();

    let mut out = io::stdout().lock();
    match &cli.command {
        Command::Schema { type_id, groups } => schema::run(&mut out, cli.format, *type_id, *groups),
        Command::Prefs => prefs::show(&mut out, &prefs::resolve(&cli)?, cli.format),
        Command::Show { branch, asset } => {
            let session = Session::connect(prefs::resolve(&cli)?, branch.id())?;
            session.show(&mut out, asset, cli.format).await
        }
        Command::Edit {
            branch,
            asset,
            set,
            label,
        } => {
            let session = Session::connect(prefs::resolve(&cli)?, branch.id())?;
            session.edit(&mut out, asset, label, set.clone()).await
        }
        Command::History {
            branch,
            pages,
            limit,
            asset,
        } => {
            let session = Session::connect(prefs::resolve(&cli)?, branch.id())?;
            session
                .history(&mut out, *pages, *limit, asset.as_deref(), cli.format)
                .await
        }
        Command::Offering { branch } => {
            let session = Session::connect(prefs::resolve(&cli)?, branch.id())?;
            session.offering(&mut out, cli.format).await
        }
        Command::Revert { branch, to, yes } => {
            let session = Session::connect(prefs::resolve(&cli)?, branch.id())?;
            session.revert(&mut out, CommitId(*to), *yes).await
        }
    }
}
