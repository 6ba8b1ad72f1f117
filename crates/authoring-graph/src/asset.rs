// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Assets (typed content nodes) and the closed set of content type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ident::AssetName;

/// JSON object payload carried by assets and edges.
pub type Data = Map<String, Value>;

macro_rules! asset_types {
    ($($(#[$doc:meta])* $variant:ident => $tag:literal,)+) => {
        /// Content type tag of an asset. Immutable once the asset exists.
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub enum AssetTypeId {
            $(
                $(#[$doc])*
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl AssetTypeId {
            /// Every type tag, in declaration order.
            pub const ALL: &'static [AssetTypeId] = &[$(AssetTypeId::$variant,)+];

            /// Wire tag, e.g. `"lesson.1"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(AssetTypeId::$variant => $tag,)+
                }
            }
        }
    };
}

asset_types! {
    /// Root of a project.
    Course => "course.1",
    /// Grouping of modules.
    Unit => "unit.1",
    /// Grouping of lessons and activities.
    Module => "module.1",
    /// Grouping of activities.
    Lesson => "lesson.1",
    /// Authored HTML page.
    Html => "html.1",
    /// Uploaded file.
    File => "file.1",
    /// Image blob.
    Image => "image.1",
    /// Video blob.
    Video => "video.1",
    /// Audio blob.
    Audio => "audio.1",
    /// Linked or embedded resource.
    Resource => "resource.1",
    /// Graded assessment.
    Assessment => "assessment.1",
    /// Ungraded knowledge check.
    Checkpoint => "checkpoint.1",
    /// Placement diagnostic.
    Diagnostic => "diagnostic.1",
    /// Assessment drawing from a question pool.
    PoolAssessment => "poolAssessment.1",
    /// Submitted assignment.
    Assignment => "assignment.1",
    /// Discussion board.
    Discussion => "discussion.1",
    /// Single-answer choice question.
    MultipleChoiceQuestion => "multipleChoiceQuestion.1",
    /// Multi-answer choice question.
    MultipleSelectQuestion => "multipleSelectQuestion.1",
    /// True/false question.
    TrueFalseQuestion => "trueFalseQuestion.1",
    /// Free-text question.
    EssayQuestion => "essayQuestion.1",
    /// Cloze question.
    FillInTheBlankQuestion => "fillInTheBlankQuestion.1",
    /// Pairing question.
    MatchingQuestion => "matchingQuestion.1",
    /// Short free-text question.
    ShortAnswerQuestion => "shortAnswerQuestion.1",
    /// Learner survey.
    Survey => "survey.1",
    /// Survey choice item.
    SurveyChoiceQuestion => "surveyChoiceQuestion.1",
    /// Survey free-text item.
    SurveyEssayQuestion => "surveyEssayQuestion.1",
    /// Grading rubric.
    Rubric => "rubric.1",
    /// Rubric criterion.
    RubricCriterion => "rubricCriterion.1",
    /// Gradebook category.
    GradebookCategory => "gradebookCategory.1",
    /// Set of competencies.
    CompetencySet => "competencySet.1",
    /// Single competency.
    Competency => "competency.1",
}

impl AssetTypeId {
    /// Whether the type is one of the graded question variants.
    pub const fn is_question(self) -> bool {
        matches!(
            self,
            Self::MultipleChoiceQuestion
                | Self::MultipleSelectQuestion
                | Self::TrueFalseQuestion
                | Self::EssayQuestion
                | Self::FillInTheBlankQuestion
                | Self::MatchingQuestion
                | Self::ShortAnswerQuestion
        )
    }
}

impl fmt::Display for AssetTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an [`AssetTypeId`] tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset type: {0}")]
pub struct UnknownAssetType(pub String);

impl FromStr for AssetTypeId {
    type Err = UnknownAssetType;

    /// Accepts the wire tag (`lesson.1`) or the bare kind (`lesson`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetTypeId::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s || t.as_str().strip_suffix(".1") == Some(s))
            .ok_or_else(|| UnknownAssetType(s.to_string()))
    }
}

/// A typed content node.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Stable identifier.
    pub name: AssetName,
    /// Content type tag; never changes after creation.
    pub type_id: AssetTypeId,
    /// Type-specific payload (title, html parts, file source, choices, ...).
    #[serde(default)]
    pub data: Data,
}

impl Asset {
    /// Builds an asset from its parts.
    pub fn new(name: AssetName, type_id: AssetTypeId, data: Data) -> Self {
        Self {
            name,
            type_id,
            data,
        }
    }

    /// `data.title`, when present and a string.
    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }
}

/// Shallow-merges `partial` into `data`: keys in `partial` overwrite, all
/// other keys are kept.
pub fn merge_data(data: &mut Data, partial: Data) {
    for (key, value) in partial {
        data.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Data {
        match v {
            Value::Object(m) => m,
            _ => Data::new(),
        }
    }

    #[test]
    fn type_tags_round_trip_through_from_str() {
        for ty in AssetTypeId::ALL {
            assert_eq!(ty.as_str().parse::<AssetTypeId>().unwrap(), *ty);
        }
        assert_eq!("lesson".parse::<AssetTypeId>().unwrap(), AssetTypeId::Lesson);
        assert!("lessons".parse::<AssetTypeId>().is_err());
    }

    #[test]
    fn asset_deserializes_from_wire_shape() {
        let asset: Asset = serde_json::from_value(json!({
            "name": "a1",
            "typeId": "multipleChoiceQuestion.1",
            "data": { "title": "Q1" }
        }))
        .unwrap();
        assert_eq!(asset.type_id, AssetTypeId::MultipleChoiceQuestion);
        assert!(asset.type_id.is_question());
        assert_eq!(asset.title(), Some("Q1"));
    }

    #[test]
    fn merge_keeps_untouched_keys() {
        let mut data = obj(json!({ "title": "Old", "subtitle": "Keep" }));
        merge_data(&mut data, obj(json!({ "title": "New", "duration": 5 })));
        assert_eq!(
            Value::Object(data),
            json!({ "title": "New", "subtitle": "Keep", "duration": 5 })
        );
    }
}
