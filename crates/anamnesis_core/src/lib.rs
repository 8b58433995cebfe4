//! Core domain logic for anamnesis questionnaire templates.
//! This crate is the single source of truth for template editing invariants.

pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, CoreConfig};
pub use editor::{
    EditorError, EditorSession, LoadOutcome, LoadTicket, QuestionUpdate, TemplateEditor,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::template::{
    new_item_id, AnamnesisTemplate, ChoiceOption, DocumentError, GroupId, OptionId, Question,
    QuestionGroup, QuestionId, QuestionType, TemplateId, KNOWN_TEMPLATE_TYPES,
};
pub use repo::template_repo::{
    RepoError, RepoResult, SqliteTemplateRepository, TemplateListQuery, TemplateRepository,
    TemplateSummary,
};
pub use service::template_service::{ServiceError, ServiceResult, TemplateService};
pub use validation::{validate_for_submission, ValidationFailed, ValidationIssue};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
