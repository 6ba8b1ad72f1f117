// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for assets, edges, commits and branches.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable, opaque identifier of an asset.
///
/// Names assigned by the server are opaque strings. Assets created locally
/// before their first save get a fresh UUID via [`AssetName::provisional`];
/// the server keeps that name when it commits the asset.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetName(String);

impl AssetName {
    /// Wraps an existing name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Allocates a fresh name for a locally created asset.
    pub fn provisional() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrows the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stable, opaque identifier of an edge.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeName(String);

impl EdgeName {
    /// Wraps an existing name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Allocates a fresh name for a locally created edge.
    pub fn provisional() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrows the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Commit identifier. Commit ids increase along a branch.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub u64);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch identifier (a project's line of commits).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub u64);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn provisional_names_are_unique() {
        let a = AssetName::provisional();
        let b = AssetName::provisional();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn names_serialize_as_plain_strings() {
        let name = AssetName::new("lesson-1");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"lesson-1\"");
        let commit: CommitId = serde_json::from_str("42").unwrap();
        assert_eq!(commit, CommitId(42));
    }
}
