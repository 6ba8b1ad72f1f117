// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The asset editor's state record.

use authoring_graph::{Asset, AssetName, Includes};

/// Pending gradebook category override for the asset under edit.
///
/// `Unset` (no override requested) and `Cleared` (override requested: no
/// category) are different states.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum PendingCategory {
    /// Nothing pending.
    #[default]
    Unset,
    /// Remove the asset's category.
    Cleared,
    /// Assign the named gradebook category.
    Set(AssetName),
}

/// Node under edit plus its resolved includes and save flags.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct AssetEditorState {
    /// Asset currently open in the editor.
    pub asset_node: Option<Asset>,
    /// Outgoing edges of `asset_node`, grouped and sorted.
    pub includes: Includes,
    /// Pending gradebook category override.
    pub category: PendingCategory,
    /// Unsaved changes exist.
    pub dirty: bool,
    /// A save is in flight.
    pub saving: bool,
    /// Generation counter; consumers refetch when it changes.
    pub reload: u64,
}

impl AssetEditorState {
    /// Name of the asset under edit.
    pub fn current_name(&self) -> Option<&AssetName> {
        self.asset_node.as_ref().map(|a| &a.name)
    }
}
