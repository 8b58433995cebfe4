//! Pre-submission checks for anamnesis templates.
//!
//! # Responsibility
//! - Decide whether a template may be sent to the store.
//! - Report every violation individually so callers can display each one.
//!
//! # Invariants
//! - Validation never mutates the template.
//! - Intermediate editing states are allowed to fail these checks.

use crate::model::template::AnamnesisTemplate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One violated submission rule. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingName,
    MissingType,
    NoGroups,
    NoQuestions,
    BlankGroupName {
        group: usize,
    },
    BlankQuestionText {
        group: usize,
        question: usize,
    },
    BlankOptionText {
        group: usize,
        question: usize,
        option: usize,
    },
}

impl ValidationIssue {
    /// Stable machine-readable code for this issue.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingType => "missing_type",
            Self::NoGroups => "no_groups",
            Self::NoQuestions => "no_questions",
            Self::BlankGroupName { .. } => "blank_group_name",
            Self::BlankQuestionText { .. } => "blank_question_text",
            Self::BlankOptionText { .. } => "blank_option_text",
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "template name is required"),
            Self::MissingType => write!(f, "template type is required"),
            Self::NoGroups => write!(f, "template must have at least one group"),
            Self::NoQuestions => write!(f, "each group must have at least one question"),
            Self::BlankGroupName { group } => {
                write!(f, "group {group}: group name must not be blank")
            }
            Self::BlankQuestionText { group, question } => write!(
                f,
                "group {group}, question {question}: question text must not be blank"
            ),
            Self::BlankOptionText {
                group,
                question,
                option,
            } => write!(
                f,
                "group {group}, question {question}, option {option}: option text must not be blank"
            ),
        }
    }
}

/// Template rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailed {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailed {
    /// Human-readable messages, one per issue.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.issues.contains(issue)
    }
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "template validation failed: {}", self.messages().join("; "))
    }
}

impl Error for ValidationFailed {}

/// Checks every submission rule and collects all violations.
///
/// # Errors
/// Returns `ValidationFailed` with one issue per violated rule when:
/// - name or type is blank;
/// - there are no groups;
/// - no group has any question;
/// - a group name, question text or option text is blank.
pub fn validate_for_submission(template: &AnamnesisTemplate) -> Result<(), ValidationFailed> {
    let mut issues = Vec::new();

    if is_blank(&template.name) {
        issues.push(ValidationIssue::MissingName);
    }
    if is_blank(&template.category) {
        issues.push(ValidationIssue::MissingType);
    }

    if template.groups.is_empty() {
        issues.push(ValidationIssue::NoGroups);
    } else if template.groups.iter().all(|group| group.questions.is_empty()) {
        issues.push(ValidationIssue::NoQuestions);
    }

    for (group_index, group) in template.groups.iter().enumerate() {
        let group_pos = group_index + 1;
        if is_blank(&group.name) {
            issues.push(ValidationIssue::BlankGroupName { group: group_pos });
        }

        for (question_index, question) in group.questions.iter().enumerate() {
            let question_pos = question_index + 1;
            if is_blank(&question.text) {
                issues.push(ValidationIssue::BlankQuestionText {
                    group: group_pos,
                    question: question_pos,
                });
            }

            for (option_index, option) in question.options().iter().enumerate() {
                if is_blank(&option.text) {
                    issues.push(ValidationIssue::BlankOptionText {
                        group: group_pos,
                        question: question_pos,
                        option: option_index + 1,
                    });
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailed { issues })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
