//! Template use-case service.
//!
//! # Responsibility
//! - Save editor state as create-or-update against the repository.
//! - Open stored templates as edit-mode editors.
//!
//! # Invariants
//! - Nothing reaches the repository without passing submission validation.
//! - A successful first save writes the assigned id back into the editor.

use crate::config::CoreConfig;
use crate::editor::TemplateEditor;
use crate::model::template::{DocumentError, TemplateId};
use crate::repo::template_repo::{
    RepoError, TemplateListQuery, TemplateRepository, TemplateSummary,
};
use crate::validation::{validate_for_submission, ValidationFailed};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by template use cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationFailed),
    NotFound(TemplateId),
    Document(DocumentError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "anamnesis template not found: {id}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Document(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationFailed> for ServiceError {
    fn from(value: ValidationFailed) -> Self {
        Self::Validation(value)
    }
}

impl From<DocumentError> for ServiceError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case facade over a template repository.
pub struct TemplateService<R: TemplateRepository> {
    repo: R,
    default_limit: u32,
    max_limit: u32,
}

impl<R: TemplateRepository> TemplateService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, &CoreConfig::default())
    }

    /// Creates a service using listing limits from `config`.
    pub fn with_config(repo: R, config: &CoreConfig) -> Self {
        Self {
            repo,
            default_limit: config.list_default_limit(),
            max_limit: config.list_max_limit(),
        }
    }

    /// Saves the editor's template, creating it on first save.
    ///
    /// # Errors
    /// - `Validation` with every violated rule; nothing is written.
    /// - `NotFound` when updating a template that was deleted meanwhile.
    pub fn save(&self, editor: &mut TemplateEditor) -> ServiceResult<TemplateId> {
        if let Err(err) = validate_for_submission(editor.template()) {
            warn!(
                "event=template_save module=service status=rejected issues={}",
                err.issues.len()
            );
            return Err(err.into());
        }

        match editor.template().id.clone() {
            Some(id) => {
                self.repo.update_template(editor.template())?;
                Ok(id)
            }
            None => {
                let id = self.repo.create_template(editor.template())?;
                editor.assign_id(id.clone());
                Ok(id)
            }
        }
    }

    /// Loads a stored template into an edit-mode editor.
    pub fn open(&self, id: &str) -> ServiceResult<TemplateEditor> {
        let template = self
            .repo
            .get_template(id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        Ok(TemplateEditor::hydrate(template)?)
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        self.repo.delete_template(id).map_err(Into::into)
    }

    /// Lists templates, applying configured page-size limits.
    pub fn list(&self, query: &TemplateListQuery) -> ServiceResult<Vec<TemplateSummary>> {
        let query = TemplateListQuery {
            limit: Some(clamp_limit(query.limit, self.default_limit, self.max_limit)),
            ..query.clone()
        };
        self.repo.list_templates(&query).map_err(Into::into)
    }
}

fn clamp_limit(requested: Option<u32>, default_limit: u32, max_limit: u32) -> u32 {
    match requested {
        Some(0) | None => default_limit.min(max_limit),
        Some(limit) => limit.min(max_limit),
    }
}
