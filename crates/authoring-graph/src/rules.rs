// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Static edge rules: which groups each asset type holds and which target
//! types each group accepts.
//!
//! The table is fixed at build time. Edge-creating code checks every new
//! edge against it and treats a violation as a programming error
//! ([`EdgeRuleSchema::assert_legal`]); [`EdgeRuleSchema::check`] is the
//! non-panicking form for callers that validate user input first.

use std::collections::BTreeSet;

use thiserror::Error;

#[allow(clippy::enum_glob_use)]
use crate::asset::AssetTypeId::{self, *};
use crate::edge::EdgeGroup;

/// Rule lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeRuleError {
    /// The source type does not declare the group at all.
    #[error("{source_type} declares no `{group}` edge group")]
    InvalidEdgeGroup {
        /// Source asset type.
        source_type: AssetTypeId,
        /// Requested group.
        group: EdgeGroup,
    },
    /// The group exists but does not accept the target type.
    #[error("{target_type} is not a legal `{group}` target of {source_type}")]
    IllegalTarget {
        /// Source asset type.
        source_type: AssetTypeId,
        /// Requested group.
        group: EdgeGroup,
        /// Rejected target type.
        target_type: AssetTypeId,
    },
}

/// Targets allowed in one group.
#[derive(Debug)]
pub struct GroupRule {
    /// Group name.
    pub group: EdgeGroup,
    /// Accepted target types.
    pub targets: &'static [AssetTypeId],
}

/// All groups declared by one source type.
#[derive(Debug)]
pub struct TypeRules {
    /// Source asset type.
    pub source: AssetTypeId,
    /// Declared groups.
    pub groups: &'static [GroupRule],
}

const QUESTIONS: &[AssetTypeId] = &[
    MultipleChoiceQuestion,
    MultipleSelectQuestion,
    TrueFalseQuestion,
    EssayQuestion,
    FillInTheBlankQuestion,
    MatchingQuestion,
    ShortAnswerQuestion,
];

const ACTIVITIES: &[AssetTypeId] = &[
    Html,
    File,
    Resource,
    Assessment,
    Checkpoint,
    Diagnostic,
    PoolAssessment,
    Assignment,
    Discussion,
];

const MODULE_ELEMENTS: &[AssetTypeId] = &[
    Lesson,
    Html,
    File,
    Resource,
    Assessment,
    Checkpoint,
    Diagnostic,
    PoolAssessment,
    Assignment,
    Discussion,
];

const MEDIA: &[AssetTypeId] = &[Image, Video, Audio, File];
const LINKABLE: &[AssetTypeId] = &[Html, Lesson, Module, Resource, File];

const fn rule(group: EdgeGroup, targets: &'static [AssetTypeId]) -> GroupRule {
    GroupRule { group, targets }
}

const GRADED: &[GroupRule] = &[
    rule(EdgeGroup::Questions, QUESTIONS),
    rule(EdgeGroup::GradebookCategory, &[GradebookCategory]),
    rule(EdgeGroup::Assesses, &[Competency]),
    rule(EdgeGroup::Survey, &[Survey]),
];

const QUESTION_RULES: &[GroupRule] = &[
    rule(EdgeGroup::Assesses, &[Competency]),
    rule(EdgeGroup::Resources, MEDIA),
];

const RULES: &[TypeRules] = &[
    TypeRules {
        source: Course,
        groups: &[
            rule(EdgeGroup::Elements, &[Unit, Module]),
            rule(EdgeGroup::GradebookCategory, &[GradebookCategory]),
            rule(EdgeGroup::Competencies, &[CompetencySet]),
            rule(EdgeGroup::Survey, &[Survey]),
            rule(EdgeGroup::Image, &[Image]),
        ],
    },
    TypeRules {
        source: Unit,
        groups: &[rule(EdgeGroup::Elements, &[Module])],
    },
    TypeRules {
        source: Module,
        groups: &[
            rule(EdgeGroup::Elements, MODULE_ELEMENTS),
            rule(EdgeGroup::Survey, &[Survey]),
            rule(EdgeGroup::Teaches, &[Competency]),
        ],
    },
    TypeRules {
        source: Lesson,
        groups: &[
            rule(EdgeGroup::Elements, ACTIVITIES),
            rule(EdgeGroup::Survey, &[Survey]),
            rule(EdgeGroup::Teaches, &[Competency]),
        ],
    },
    TypeRules {
        source: Html,
        groups: &[
            rule(EdgeGroup::Resources, MEDIA),
            rule(EdgeGroup::Hyperlinks, LINKABLE),
            rule(EdgeGroup::Teaches, &[Competency]),
            rule(EdgeGroup::Survey, &[Survey]),
        ],
    },
    TypeRules {
        source: Resource,
        groups: &[rule(EdgeGroup::Resources, MEDIA)],
    },
    TypeRules {
        source: Video,
        groups: &[
            rule(EdgeGroup::Captions, &[File]),
            rule(EdgeGroup::Transcript, &[File]),
            rule(EdgeGroup::Poster, &[Image]),
        ],
    },
    TypeRules {
        source: Audio,
        groups: &[rule(EdgeGroup::Transcript, &[File])],
    },
    TypeRules {
        source: Assessment,
        groups: GRADED,
    },
    TypeRules {
        source: Checkpoint,
        groups: &[
            rule(EdgeGroup::Questions, QUESTIONS),
            rule(EdgeGroup::Assesses, &[Competency]),
        ],
    },
    TypeRules {
        source: Diagnostic,
        groups: GRADED,
    },
    TypeRules {
        source: PoolAssessment,
        groups: GRADED,
    },
    TypeRules {
        source: Assignment,
        groups: &[
            rule(EdgeGroup::CblRubric, &[Rubric]),
            rule(EdgeGroup::GradebookCategory, &[GradebookCategory]),
            rule(EdgeGroup::Assesses, &[Competency]),
            rule(EdgeGroup::Resources, MEDIA),
        ],
    },
    TypeRules {
        source: Discussion,
        groups: &[
            rule(EdgeGroup::CblRubric, &[Rubric]),
            rule(EdgeGroup::GradebookCategory, &[GradebookCategory]),
        ],
    },
    TypeRules {
        source: MultipleChoiceQuestion,
        groups: QUESTION_RULES,
    },
    TypeRules {
        source: MultipleSelectQuestion,
        groups: QUESTION_RULES,
    },
    TypeRules {
        source: TrueFalseQuestion,
        groups: QUESTION_RULES,
    },
    TypeRules {
        source: EssayQuestion,
        groups: &[
            rule(EdgeGroup::Assesses, &[Competency]),
            rule(EdgeGroup::Resources, MEDIA),
            rule(EdgeGroup::CblRubric, &[Rubric]),
        ],
    },
    TypeRules {
        source: FillInTheBlankQuestion,
        groups: QUESTION_RULES,
    },
    TypeRules {
        source: MatchingQuestion,
        groups: QUESTION_RULES,
    },
    TypeRules {
        source: ShortAnswerQuestion,
        groups: QUESTION_RULES,
    },
    TypeRules {
        source: Survey,
        groups: &[rule(
            EdgeGroup::SurveyQuestions,
            &[SurveyChoiceQuestion, SurveyEssayQuestion],
        )],
    },
    TypeRules {
        source: Rubric,
        groups: &[rule(EdgeGroup::Criteria, &[RubricCriterion])],
    },
    TypeRules {
        source: RubricCriterion,
        groups: &[rule(EdgeGroup::Assesses, &[Competency])],
    },
    TypeRules {
        source: CompetencySet,
        groups: &[rule(EdgeGroup::Elements, &[Competency])],
    },
];

/// Read-only view over a static rule table.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRuleSchema {
    rules: &'static [TypeRules],
}

/// The platform's rule table.
pub static STANDARD_SCHEMA: EdgeRuleSchema = EdgeRuleSchema { rules: RULES };

impl EdgeRuleSchema {
    /// The platform's rule table.
    pub fn standard() -> &'static EdgeRuleSchema {
        &STANDARD_SCHEMA
    }

    /// Raw table entries, one per source type with at least one group.
    pub fn entries(&self) -> &'static [TypeRules] {
        self.rules
    }

    fn groups_of(&self, source: AssetTypeId) -> &'static [GroupRule] {
        self.rules
            .iter()
            .find(|r| r.source == source)
            .map_or(&[], |r| r.groups)
    }

    /// Groups declared for `source`; empty if it declares none.
    pub fn legal_groups(&self, source: AssetTypeId) -> BTreeSet<EdgeGroup> {
        self.groups_of(source).iter().map(|r| r.group).collect()
    }

    /// Target types accepted by `group` on `source`.
    pub fn legal_target_types(
        &self,
        source: AssetTypeId,
        group: EdgeGroup,
    ) -> Result<&'static [AssetTypeId], EdgeRuleError> {
        self.groups_of(source)
            .iter()
            .find(|r| r.group == group)
            .map(|r| r.targets)
            .ok_or(EdgeRuleError::InvalidEdgeGroup {
                source_type: source,
                group,
            })
    }

    /// Every group used anywhere in the table, sorted by name.
    pub fn all_group_names(&self) -> Vec<EdgeGroup> {
        let mut groups: Vec<EdgeGroup> = self
            .rules
            .iter()
            .flat_map(|r| r.groups.iter().map(|g| g.group))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        groups.sort_by_key(|g| g.as_str());
        groups
    }

    /// Validates a prospective `(source, group) -> target` edge.
    pub fn check(
        &self,
        source: AssetTypeId,
        group: EdgeGroup,
        target: AssetTypeId,
    ) -> Result<(), EdgeRuleError> {
        if self.legal_target_types(source, group)?.contains(&target) {
            Ok(())
        } else {
            Err(EdgeRuleError::IllegalTarget {
                source_type: source,
                group,
                target_type: target,
            })
        }
    }

    /// Fail-fast form of [`check`](Self::check).
    ///
    /// # Panics
    ///
    /// Panics when the edge is not declared by the table.
    #[allow(clippy::panic)]
    pub fn assert_legal(&self, source: AssetTypeId, group: EdgeGroup, target: AssetTypeId) {
        if let Err(err) = self.check(source, group, target) {
            panic!("edge rule violation: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_type_has_no_groups() {
        let schema = EdgeRuleSchema::standard();
        assert!(schema.legal_groups(Competency).is_empty());
        assert_eq!(
            schema.legal_target_types(Competency, EdgeGroup::Elements),
            Err(EdgeRuleError::InvalidEdgeGroup {
                source_type: Competency,
                group: EdgeGroup::Elements,
            })
        );
    }

    #[test]
    fn module_accepts_lessons_but_not_courses() {
        let schema = EdgeRuleSchema::standard();
        assert!(schema.check(Module, EdgeGroup::Elements, Lesson).is_ok());
        assert!(matches!(
            schema.check(Module, EdgeGroup::Elements, Course),
            Err(EdgeRuleError::IllegalTarget { .. })
        ));
        assert!(matches!(
            schema.check(Module, EdgeGroup::Questions, MultipleChoiceQuestion),
            Err(EdgeRuleError::InvalidEdgeGroup { .. })
        ));
    }

    #[test]
    fn all_group_names_is_sorted_and_unique() {
        let names: Vec<&str> = EdgeRuleSchema::standard()
            .all_group_names()
            .into_iter()
            .map(EdgeGroup::as_str)
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
        assert!(names.contains(&"elements"));
        assert!(names.contains(&"questions"));
    }

    #[test]
    fn each_type_appears_at_most_once() {
        let mut seen = BTreeSet::new();
        for entry in EdgeRuleSchema::standard().entries() {
            assert!(seen.insert(entry.source), "duplicate {}", entry.source);
        }
    }

    #[test]
    #[should_panic(expected = "edge rule violation")]
    fn assert_legal_fails_fast() {
        EdgeRuleSchema::standard().assert_legal(Survey, EdgeGroup::Questions, EssayQuestion);
    }
}
