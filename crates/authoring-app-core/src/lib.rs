// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the authoring tools (config, prefs, toasts).
//! Framework-agnostic; adapters (filesystem, terminal, UI) stay thin.

pub mod config;
pub mod prefs;
pub mod toast;
