//! Anamnesis template domain model.
//!
//! # Responsibility
//! - Define the template document shared by editor, validator and store.
//! - Provide lossless JSON conversion for the persistence wire shape.
//! - Check id uniqueness of hydrated documents.
//!
//! # Invariants
//! - `options` is `None` when absent on the wire and `Some(vec![])` when
//!   present but empty; both survive a round trip unchanged.
//! - `AnamnesisTemplate::id` is `None` until the store assigns one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type TemplateId = String;
pub type GroupId = String;
pub type QuestionId = String;
pub type OptionId = String;

/// Category labels offered by the template form. `type` stays free-form.
pub const KNOWN_TEMPLATE_TYPES: &[&str] = &["Geral", "Facial", "Corporal", "Capilar"];

/// Generates a fresh opaque id for a group, question or option.
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Input widget kind of a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "yesno")]
    YesNo,
    #[default]
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "multiple_choice")]
    MultipleChoice,
    #[serde(rename = "dropdown")]
    Dropdown,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "textarea")]
    Textarea,
}

impl QuestionType {
    pub const ALL: [QuestionType; 7] = [
        QuestionType::YesNo,
        QuestionType::Text,
        QuestionType::Number,
        QuestionType::MultipleChoice,
        QuestionType::Dropdown,
        QuestionType::Date,
        QuestionType::Textarea,
    ];

    /// Wire name used in JSON documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YesNo => "yesno",
            Self::Text => "text",
            Self::Number => "number",
            Self::MultipleChoice => "multiple_choice",
            Self::Dropdown => "dropdown",
            Self::Date => "date",
            Self::Textarea => "textarea",
        }
    }

    /// Returns whether questions of this type carry selectable options.
    pub fn has_options(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Dropdown)
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| DocumentError::UnknownQuestionType(value.to_string()))
    }
}

/// One selectable choice of a multiple-choice or dropdown question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: OptionId,
    pub text: String,
}

impl ChoiceOption {
    /// Creates an option with a fresh id and empty text.
    pub fn blank() -> Self {
        Self {
            id: new_item_id(),
            text: String::new(),
        }
    }
}

/// Single prompt inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Serialized as `type` to match the stored document.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub text: String,
    pub required: bool,
    /// 1-based rank, kept equal to position + 1 by the editor.
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
}

impl Question {
    /// Creates a blank, optional `text` question at the given rank.
    pub fn blank(order: u32) -> Self {
        Self {
            id: new_item_id(),
            kind: QuestionType::Text,
            text: String::new(),
            required: false,
            order,
            options: None,
        }
    }

    /// Options as a slice, empty when absent.
    pub fn options(&self) -> &[ChoiceOption] {
        self.options.as_deref().unwrap_or_default()
    }
}

/// Named, ordered collection of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub id: GroupId,
    pub name: String,
    pub questions: Vec<Question>,
}

impl QuestionGroup {
    /// Creates an unnamed group with no questions.
    pub fn blank() -> Self {
        Self {
            id: new_item_id(),
            name: String::new(),
            questions: Vec::new(),
        }
    }
}

/// Reusable anamnesis questionnaire definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnamnesisTemplate {
    /// Store-assigned id; absent while the template has never been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateId>,
    pub name: String,
    /// Free-form clinical category label (see `KNOWN_TEMPLATE_TYPES`).
    #[serde(rename = "type")]
    pub category: String,
    pub groups: Vec<QuestionGroup>,
}

impl AnamnesisTemplate {
    /// Creates an unsaved template with the given header and no groups.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            category: category.into(),
            groups: Vec::new(),
        }
    }

    /// Parses a template from its JSON wire document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(DocumentError::Json)
    }

    /// Serializes the template to its compact JSON wire document.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(DocumentError::Json)
    }

    /// Serializes the template to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Json)
    }

    pub fn group(&self, group_id: &str) -> Option<&QuestionGroup> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn question_count(&self) -> usize {
        self.groups.iter().map(|group| group.questions.len()).sum()
    }

    /// Returns whether `category` is one of the labels offered by the form.
    pub fn has_known_type(&self) -> bool {
        KNOWN_TEMPLATE_TYPES.contains(&self.category.as_str())
    }

    /// Checks the id invariants of a document about to be edited.
    ///
    /// Question ranks are not checked here; `TemplateEditor::hydrate`
    /// repairs them.
    ///
    /// # Errors
    /// - `EmptyId` when any item id is blank.
    /// - `Duplicate*Id` when a collection repeats an id.
    pub fn check_structure(&self) -> Result<(), DocumentError> {
        let mut group_ids = HashSet::new();
        for group in &self.groups {
            ensure_id(&group.id)?;
            if !group_ids.insert(group.id.as_str()) {
                return Err(DocumentError::DuplicateGroupId(group.id.clone()));
            }

            let mut question_ids = HashSet::new();
            for question in &group.questions {
                ensure_id(&question.id)?;
                if !question_ids.insert(question.id.as_str()) {
                    return Err(DocumentError::DuplicateQuestionId {
                        group: group.id.clone(),
                        question: question.id.clone(),
                    });
                }

                let mut option_ids = HashSet::new();
                for option in question.options() {
                    ensure_id(&option.id)?;
                    if !option_ids.insert(option.id.as_str()) {
                        return Err(DocumentError::DuplicateOptionId {
                            question: question.id.clone(),
                            option: option.id.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn ensure_id(id: &str) -> Result<(), DocumentError> {
    if id.trim().is_empty() {
        return Err(DocumentError::EmptyId);
    }
    Ok(())
}

/// Errors for malformed template documents.
#[derive(Debug)]
pub enum DocumentError {
    Json(serde_json::Error),
    UnknownQuestionType(String),
    EmptyId,
    DuplicateGroupId(GroupId),
    DuplicateQuestionId {
        group: GroupId,
        question: QuestionId,
    },
    DuplicateOptionId {
        question: QuestionId,
        option: OptionId,
    },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid template document: {err}"),
            Self::UnknownQuestionType(value) => write!(f, "unknown question type `{value}`"),
            Self::EmptyId => write!(f, "template items must have a non-empty id"),
            Self::DuplicateGroupId(id) => write!(f, "duplicate group id `{id}`"),
            Self::DuplicateQuestionId { group, question } => {
                write!(f, "duplicate question id `{question}` in group `{group}`")
            }
            Self::DuplicateOptionId { question, option } => {
                write!(f, "duplicate option id `{option}` in question `{question}`")
            }
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnamnesisTemplate, DocumentError, Question, QuestionGroup, QuestionType};
    use std::str::FromStr;

    fn group_with(ids_and_orders: &[(&str, u32)]) -> QuestionGroup {
        QuestionGroup {
            id: "g1".to_string(),
            name: "Vitals".to_string(),
            questions: ids_and_orders
                .iter()
                .map(|(id, order)| Question {
                    id: (*id).to_string(),
                    ..Question::blank(*order)
                })
                .collect(),
        }
    }

    #[test]
    fn question_type_parses_wire_names() {
        for kind in QuestionType::ALL {
            assert_eq!(QuestionType::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(matches!(
            QuestionType::from_str("checkbox"),
            Err(DocumentError::UnknownQuestionType(_))
        ));
    }

    #[test]
    fn only_choice_types_have_options() {
        let with_options: Vec<_> = QuestionType::ALL
            .into_iter()
            .filter(|kind| kind.has_options())
            .collect();
        assert_eq!(
            with_options,
            vec![QuestionType::MultipleChoice, QuestionType::Dropdown]
        );
    }

    #[test]
    fn check_structure_accepts_consistent_orders() {
        let mut template = AnamnesisTemplate::new("Intake", "Geral");
        template.groups.push(group_with(&[("q1", 1), ("q2", 2)]));
        template.check_structure().unwrap();
    }

    #[test]
    fn check_structure_ignores_ranks() {
        let mut template = AnamnesisTemplate::new("Intake", "Geral");
        template.groups.push(group_with(&[("q1", 4), ("q2", 1), ("q3", 4)]));
        template.check_structure().unwrap();
    }

    #[test]
    fn known_type_is_case_sensitive() {
        assert!(AnamnesisTemplate::new("Intake", "Capilar").has_known_type());
        assert!(!AnamnesisTemplate::new("Intake", "capilar").has_known_type());
        assert!(!AnamnesisTemplate::new("Intake", "").has_known_type());
    }

    #[test]
    fn check_structure_rejects_duplicate_question_ids() {
        let mut template = AnamnesisTemplate::new("Intake", "Geral");
        template.groups.push(group_with(&[("q1", 1), ("q1", 2)]));

        let err = template.check_structure().unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateQuestionId { .. }));
    }

    #[test]
    fn same_question_id_is_allowed_in_different_groups() {
        let mut template = AnamnesisTemplate::new("Intake", "Geral");
        template.groups.push(group_with(&[("q1", 1)]));
        let mut second = group_with(&[("q1", 1)]);
        second.id = "g2".to_string();
        template.groups.push(second);

        template.check_structure().unwrap();
    }
}
