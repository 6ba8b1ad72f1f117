// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed, ordered edges and the per-asset `Includes` view.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetTypeId, Data};
use crate::ident::{AssetName, EdgeName};

macro_rules! edge_groups {
    ($($(#[$doc:meta])* $variant:ident => $tag:literal,)+) => {
        /// Name of an outgoing relation slot on a source type.
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub enum EdgeGroup {
            $(
                $(#[$doc])*
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl EdgeGroup {
            /// Every group, in declaration order.
            pub const ALL: &'static [EdgeGroup] = &[$(EdgeGroup::$variant,)+];

            /// Wire name, e.g. `"elements"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(EdgeGroup::$variant => $tag,)+
                }
            }
        }
    };
}

edge_groups! {
    /// Ordered structural children (modules, lessons, activities).
    Elements => "elements",
    /// Questions of an assessment.
    Questions => "questions",
    /// Supporting media and files.
    Resources => "resources",
    /// Gradebook category assignment.
    GradebookCategory => "gradebookCategory",
    /// Attached survey.
    Survey => "survey",
    /// Items of a survey.
    SurveyQuestions => "surveyQuestions",
    /// In-content links to other assets.
    Hyperlinks => "hyperlinks",
    /// Competencies taught.
    Teaches => "teaches",
    /// Competencies assessed.
    Assesses => "assesses",
    /// Rubric used for grading.
    CblRubric => "cblRubric",
    /// Criteria of a rubric.
    Criteria => "criteria",
    /// Display image.
    Image => "image",
    /// Poster frame of a video.
    Poster => "poster",
    /// Caption tracks.
    Captions => "captions",
    /// Transcript document.
    Transcript => "transcript",
    /// Competency sets aligned with a course.
    Competencies => "competencies",
}

impl fmt::Display for EdgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an [`EdgeGroup`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edge group: {0}")]
pub struct UnknownEdgeGroup(pub String);

impl FromStr for EdgeGroup {
    type Err = UnknownEdgeGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeGroup::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownEdgeGroup(s.to_string()))
    }
}

/// Directed, named, ordered relation from a source asset to a target asset.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Stable identifier.
    pub name: EdgeName,
    /// Owning asset.
    pub source_name: AssetName,
    /// Referenced asset.
    pub target_name: AssetName,
    /// Type of the referenced asset.
    pub target_type: AssetTypeId,
    /// Relation slot.
    pub group: EdgeGroup,
    /// Sibling order within `(source_name, group)`.
    pub position: u32,
    /// Edge-scoped metadata (e.g. a release gate offset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Outgoing edges of the asset under edit, grouped by edge group.
///
/// Every group is kept sorted by `position` ascending; server payloads are
/// sorted on the way in, never trusted.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<EdgeGroup, Vec<Edge>>", into = "BTreeMap<EdgeGroup, Vec<Edge>>")]
pub struct Includes {
    groups: BTreeMap<EdgeGroup, Vec<Edge>>,
}

impl Includes {
    /// Empty includes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups a flat edge list by group name.
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut groups: BTreeMap<EdgeGroup, Vec<Edge>> = BTreeMap::new();
        for edge in edges {
            groups.entry(edge.group).or_default().push(edge);
        }
        Self::from(groups)
    }

    /// Edges of one group, in position order. Empty for absent groups.
    pub fn group(&self, group: EdgeGroup) -> &[Edge] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    /// Iterates non-empty groups.
    pub fn groups(&self) -> impl Iterator<Item = (EdgeGroup, &[Edge])> {
        self.groups.iter().map(|(g, edges)| (*g, edges.as_slice()))
    }

    /// Iterates every edge across all groups.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.groups.values().flatten()
    }

    /// Replaces one group's edges (sorted). An empty list removes the group.
    pub fn replace_group(&mut self, group: EdgeGroup, mut edges: Vec<Edge>) {
        if edges.is_empty() {
            self.groups.remove(&group);
            return;
        }
        sort_by_position(&mut edges);
        self.groups.insert(group, edges);
    }

    /// Looks up an edge by name in any group.
    pub fn find(&self, name: &EdgeName) -> Option<&Edge> {
        self.edges().find(|e| &e.name == name)
    }

    /// Total edge count.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// `true` when no group holds an edge.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    /// Whether every group is non-decreasing in `position`.
    pub fn is_sorted(&self) -> bool {
        self.groups
            .values()
            .all(|edges| edges.windows(2).all(|w| w[0].position <= w[1].position))
    }
}

impl From<BTreeMap<EdgeGroup, Vec<Edge>>> for Includes {
    fn from(mut groups: BTreeMap<EdgeGroup, Vec<Edge>>) -> Self {
        groups.retain(|_, edges| !edges.is_empty());
        for edges in groups.values_mut() {
            sort_by_position(edges);
        }
        Self { groups }
    }
}

impl From<Includes> for BTreeMap<EdgeGroup, Vec<Edge>> {
    fn from(includes: Includes) -> Self {
        includes.groups
    }
}

fn sort_by_position(edges: &mut [Edge]) {
    edges.sort_by_key(|e| e.position);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn edge(name: &str, group: EdgeGroup, position: u32) -> Edge {
        Edge {
            name: EdgeName::new(name),
            source_name: AssetName::new("src"),
            target_name: AssetName::new(format!("t-{name}")),
            target_type: AssetTypeId::Lesson,
            group,
            position,
            data: None,
        }
    }

    #[test]
    fn from_edges_sorts_each_group() {
        let inc = Includes::from_edges([
            edge("c", EdgeGroup::Elements, 2),
            edge("a", EdgeGroup::Elements, 0),
            edge("r", EdgeGroup::Resources, 9),
            edge("b", EdgeGroup::Elements, 1),
        ]);
        let names: Vec<_> = inc
            .group(EdgeGroup::Elements)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(inc.len(), 4);
        assert!(inc.is_sorted());
    }

    #[test]
    fn deserialize_sorts_unsorted_server_payload() {
        let inc: Includes = serde_json::from_value(json!({
            "elements": [
                { "name": "e2", "sourceName": "m", "targetName": "l2",
                  "targetType": "lesson.1", "group": "elements", "position": 5 },
                { "name": "e1", "sourceName": "m", "targetName": "l1",
                  "targetType": "lesson.1", "group": "elements", "position": 1,
                  "data": { "gate": 3 } }
            ]
        }))
        .unwrap();
        let group = inc.group(EdgeGroup::Elements);
        assert_eq!(group[0].name.as_str(), "e1");
        assert_eq!(group[1].name.as_str(), "e2");
        assert!(group[0].data.is_some());
    }

    #[test]
    fn replace_group_with_empty_removes_it() {
        let mut inc = Includes::from_edges([edge("a", EdgeGroup::Questions, 0)]);
        inc.replace_group(EdgeGroup::Questions, Vec::new());
        assert!(inc.is_empty());
        assert!(inc.group(EdgeGroup::Questions).is_empty());
    }

    #[test]
    fn group_names_parse() {
        for g in EdgeGroup::ALL {
            assert_eq!(g.as_str().parse::<EdgeGroup>().unwrap(), *g);
        }
        assert!("element".parse::<EdgeGroup>().is_err());
    }
}
