//! Template editor operations.
//!
//! # Responsibility
//! - Provide order-preserving mutations over one `AnamnesisTemplate`.
//! - Report whether the addressed item existed instead of failing on misses.
//!
//! # Invariants
//! - Group question ranks are renumbered after hydrate, delete and reorder.
//! - Changing a question type never clears its options.

use crate::model::template::{
    AnamnesisTemplate, ChoiceOption, DocumentError, GroupId, OptionId, Question, QuestionGroup,
    QuestionId, QuestionType,
};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Typed replacement for a field-name based question setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionUpdate {
    SetText(String),
    SetType(QuestionType),
    SetRequired(bool),
}

impl QuestionUpdate {
    fn field(&self) -> &'static str {
        match self {
            Self::SetText(_) => "text",
            Self::SetType(_) => "type",
            Self::SetRequired(_) => "required",
        }
    }
}

/// Caller contract violations raised by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorError {
    /// Reorder index outside `0..len` of the target group.
    OutOfRange { index: usize, len: usize },
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "question index {index} out of range for group of {len}")
            }
        }
    }
}

impl Error for EditorError {}

/// Single-owner editor for one anamnesis template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateEditor {
    template: AnamnesisTemplate,
}

impl TemplateEditor {
    /// Starts a create-mode editor with a blank header and no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a create-mode editor with the given header.
    pub fn with_header(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            template: AnamnesisTemplate::new(name, category),
        }
    }

    /// Starts an edit-mode editor from a fetched document.
    ///
    /// Questions of each group are stable-sorted by `order` and renumbered
    /// to `1..N`, so a document whose ranks are already `1..N` in position
    /// order is kept verbatim.
    ///
    /// # Errors
    /// - `DocumentError` when an id is empty or repeated.
    pub fn hydrate(mut template: AnamnesisTemplate) -> Result<Self, DocumentError> {
        template.check_structure()?;
        let repaired = template
            .groups
            .iter_mut()
            .map(|group| normalize_ranks(&mut group.questions))
            .filter(|changed| *changed)
            .count();
        if repaired > 0 {
            warn!(
                "event=editor_hydrate module=editor status=ranks_repaired template_id={} groups={}",
                template.id.as_deref().unwrap_or("-"),
                repaired
            );
        }
        debug!(
            "event=editor_hydrate module=editor status=ok template_id={} groups={} questions={}",
            template.id.as_deref().unwrap_or("-"),
            template.groups.len(),
            template.question_count()
        );
        Ok(Self { template })
    }

    pub fn template(&self) -> &AnamnesisTemplate {
        &self.template
    }

    pub fn into_template(self) -> AnamnesisTemplate {
        self.template
    }

    /// Returns whether the template has been assigned a store id.
    pub fn is_persisted(&self) -> bool {
        self.template.id.is_some()
    }

    pub(crate) fn assign_id(&mut self, id: String) {
        self.template.id = Some(id);
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.template.name = name.into();
    }

    pub fn set_type(&mut self, category: impl Into<String>) {
        self.template.category = category.into();
    }

    /// Appends an unnamed, empty group and returns its id.
    pub fn add_group(&mut self) -> GroupId {
        let group = QuestionGroup::blank();
        let id = group.id.clone();
        self.template.groups.push(group);
        id
    }

    /// Sets a group name verbatim. Blank names are accepted.
    pub fn rename_group(&mut self, group_id: &str, name: impl Into<String>) -> bool {
        match self.group_mut(group_id) {
            Some(group) => {
                group.name = name.into();
                true
            }
            None => miss("rename_group", group_id, None),
        }
    }

    /// Removes a group together with its questions and options.
    pub fn delete_group(&mut self, group_id: &str) -> bool {
        let before = self.template.groups.len();
        self.template.groups.retain(|group| group.id != group_id);
        if self.template.groups.len() == before {
            return miss("delete_group", group_id, None);
        }
        true
    }

    /// Appends a blank `text` question ranked after the existing ones.
    ///
    /// Returns `None` when the group does not exist.
    pub fn add_question(&mut self, group_id: &str) -> Option<QuestionId> {
        let Some(group) = self.group_mut(group_id) else {
            miss("add_question", group_id, None);
            return None;
        };
        let question = Question::blank(rank(group.questions.len()));
        let id = question.id.clone();
        group.questions.push(question);
        Some(id)
    }

    /// Applies one field update to a question.
    ///
    /// `SetType` keeps existing options even when the new type has none;
    /// switching to an option-bearing type initializes absent options to an
    /// empty list.
    pub fn update_question(
        &mut self,
        group_id: &str,
        question_id: &str,
        update: QuestionUpdate,
    ) -> bool {
        let field = update.field();
        let Some(question) = self.question_mut(group_id, question_id) else {
            debug!(
                "event=editor_update_question module=editor status=noop group_id={} question_id={} field={}",
                group_id, question_id, field
            );
            return false;
        };

        match update {
            QuestionUpdate::SetText(text) => question.text = text,
            QuestionUpdate::SetRequired(required) => question.required = required,
            QuestionUpdate::SetType(kind) => {
                question.kind = kind;
                if kind.has_options() && question.options.is_none() {
                    question.options = Some(Vec::new());
                }
            }
        }
        true
    }

    /// Removes a question and compacts the remaining ranks to `1..N`.
    pub fn delete_question(&mut self, group_id: &str, question_id: &str) -> bool {
        let Some(group) = self.group_mut(group_id) else {
            return miss("delete_question", group_id, Some(question_id));
        };
        let before = group.questions.len();
        group.questions.retain(|question| question.id != question_id);
        if group.questions.len() == before {
            return miss("delete_question", group_id, Some(question_id));
        }
        renumber(&mut group.questions);
        true
    }

    /// Moves the question at `from` so that it ends up at index `to`.
    ///
    /// Returns `Ok(false)` when the group does not exist.
    ///
    /// # Errors
    /// - `EditorError::OutOfRange` when `from` or `to` is not a valid index
    ///   of the group's question list. The template is left unchanged.
    pub fn reorder_questions(
        &mut self,
        group_id: &str,
        from: usize,
        to: usize,
    ) -> Result<bool, EditorError> {
        let Some(group) = self.group_mut(group_id) else {
            return Ok(miss("reorder_questions", group_id, None));
        };

        let len = group.questions.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditorError::OutOfRange { index, len });
            }
        }

        let moved = group.questions.remove(from);
        group.questions.insert(to, moved);
        renumber(&mut group.questions);
        Ok(true)
    }

    /// Appends a blank option and returns its id.
    ///
    /// Returns `None` when the group or question does not exist.
    pub fn add_option(&mut self, group_id: &str, question_id: &str) -> Option<OptionId> {
        let Some(question) = self.question_mut(group_id, question_id) else {
            miss("add_option", group_id, Some(question_id));
            return None;
        };
        let option = ChoiceOption::blank();
        let id = option.id.clone();
        question.options.get_or_insert_with(Vec::new).push(option);
        Some(id)
    }

    pub fn update_option(
        &mut self,
        group_id: &str,
        question_id: &str,
        option_id: &str,
        text: impl Into<String>,
    ) -> bool {
        let option = self
            .question_mut(group_id, question_id)
            .and_then(|question| question.options.as_mut())
            .and_then(|options| options.iter_mut().find(|option| option.id == option_id));
        match option {
            Some(option) => {
                option.text = text.into();
                true
            }
            None => miss("update_option", group_id, Some(question_id)),
        }
    }

    /// Removes an option; the remaining options keep their relative order.
    pub fn remove_option(&mut self, group_id: &str, question_id: &str, option_id: &str) -> bool {
        let Some(options) = self
            .question_mut(group_id, question_id)
            .and_then(|question| question.options.as_mut())
        else {
            return miss("remove_option", group_id, Some(question_id));
        };
        let before = options.len();
        options.retain(|option| option.id != option_id);
        if options.len() == before {
            return miss("remove_option", group_id, Some(question_id));
        }
        true
    }

    fn group_mut(&mut self, group_id: &str) -> Option<&mut QuestionGroup> {
        self.template
            .groups
            .iter_mut()
            .find(|group| group.id == group_id)
    }

    fn question_mut(&mut self, group_id: &str, question_id: &str) -> Option<&mut Question> {
        self.group_mut(group_id)?
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
    }
}

fn rank(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn renumber(questions: &mut [Question]) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.order = rank(index);
    }
}

/// Sorts by stored rank and renumbers. Returns whether anything changed.
fn normalize_ranks(questions: &mut [Question]) -> bool {
    if questions
        .iter()
        .enumerate()
        .all(|(index, question)| question.order == rank(index))
    {
        return false;
    }
    questions.sort_by_key(|question| question.order);
    renumber(questions);
    true
}

fn miss(operation: &str, group_id: &str, question_id: Option<&str>) -> bool {
    debug!(
        "event=editor_{} module=editor status=noop group_id={} question_id={}",
        operation,
        group_id,
        question_id.unwrap_or("-")
    );
    false
}
