// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the authoring crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Asset, edge and commit segment builders
//! - [`server`] - In-memory authoring server implementing `ProjectApi`

pub mod config;
pub mod fixtures;
pub mod server;

pub use config::InMemoryConfigStore;
pub use fixtures::{asset, edge, segment, titled};
pub use server::FakeProjectApi;
