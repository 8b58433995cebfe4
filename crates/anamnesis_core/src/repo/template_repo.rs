//! Template repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store full template documents in their wire JSON shape.
//! - Assign template ids on create.
//! - Offer name search with pagination for template listings.
//!
//! # Invariants
//! - The stored document always carries the row id as its `id`.
//! - Ids, question ranks and option lists round-trip unchanged.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::template::{AnamnesisTemplate, DocumentError, TemplateId};
use crate::validation::{validate_for_submission, ValidationFailed};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TEMPLATE_SELECT_SQL: &str = "SELECT id, document FROM anamnesis_templates";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from template persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationFailed),
    Db(DbError),
    Document(DocumentError),
    NotFound(TemplateId),
    /// Update requested for a template that was never created.
    MissingId,
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "anamnesis template not found: {id}"),
            Self::MissingId => write!(f, "template has no id; create it before updating"),
            Self::InvalidData(message) => write!(f, "invalid stored template: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Document(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationFailed> for RepoError {
    fn from(value: ValidationFailed) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<DocumentError> for RepoError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing options for saved templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateListQuery {
    /// Case-insensitive substring matched against the template name.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Lightweight row for template listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub category: String,
    pub group_count: usize,
    pub question_count: usize,
}

impl From<&AnamnesisTemplate> for TemplateSummary {
    fn from(template: &AnamnesisTemplate) -> Self {
        Self {
            id: template.id.clone().unwrap_or_default(),
            name: template.name.clone(),
            category: template.category.clone(),
            group_count: template.groups.len(),
            question_count: template.question_count(),
        }
    }
}

/// Persistence collaborator for anamnesis templates.
pub trait TemplateRepository {
    /// Stores a new template under a freshly assigned id.
    fn create_template(&self, template: &AnamnesisTemplate) -> RepoResult<TemplateId>;
    /// Replaces the stored document with the same id.
    fn update_template(&self, template: &AnamnesisTemplate) -> RepoResult<()>;
    fn get_template(&self, id: &str) -> RepoResult<Option<AnamnesisTemplate>>;
    fn delete_template(&self, id: &str) -> RepoResult<()>;
    fn list_templates(&self, query: &TemplateListQuery) -> RepoResult<Vec<TemplateSummary>>;
}

/// SQLite-backed template repository.
pub struct SqliteTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTemplateRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl TemplateRepository for SqliteTemplateRepository<'_> {
    fn create_template(&self, template: &AnamnesisTemplate) -> RepoResult<TemplateId> {
        validate_for_submission(template)?;

        let id = Uuid::new_v4().to_string();
        let stored = AnamnesisTemplate {
            id: Some(id.clone()),
            ..template.clone()
        };

        self.conn.execute(
            "INSERT INTO anamnesis_templates (id, name, type, document)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.as_str(),
                stored.name.as_str(),
                stored.category.as_str(),
                stored.to_json()?,
            ],
        )?;

        info!(
            "event=template_create module=repo status=ok template_id={} groups={} questions={}",
            id,
            stored.groups.len(),
            stored.question_count()
        );
        Ok(id)
    }

    fn update_template(&self, template: &AnamnesisTemplate) -> RepoResult<()> {
        let id = template.id.as_deref().ok_or(RepoError::MissingId)?;
        validate_for_submission(template)?;

        let changed = self.conn.execute(
            "UPDATE anamnesis_templates
             SET
                name = ?1,
                type = ?2,
                document = ?3,
                updated_at = CAST(unixepoch('subsec') * 1000 AS INTEGER)
             WHERE id = ?4;",
            params![
                template.name.as_str(),
                template.category.as_str(),
                template.to_json()?,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        info!("event=template_update module=repo status=ok template_id={id}");
        Ok(())
    }

    fn get_template(&self, id: &str) -> RepoResult<Option<AnamnesisTemplate>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEMPLATE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_template_row(row)?));
        }
        Ok(None)
    }

    fn delete_template(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM anamnesis_templates WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        info!("event=template_delete module=repo status=ok template_id={id}");
        Ok(())
    }

    fn list_templates(&self, query: &TemplateListQuery) -> RepoResult<Vec<TemplateSummary>> {
        let mut sql = format!("{TEMPLATE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_pattern(search)));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut summaries = Vec::new();

        while let Some(row) = rows.next()? {
            let template = parse_template_row(row)?;
            summaries.push(TemplateSummary::from(&template));
        }

        Ok(summaries)
    }
}

fn parse_template_row(row: &Row<'_>) -> RepoResult<AnamnesisTemplate> {
    let id: String = row.get("id")?;
    let document: String = row.get("document")?;

    let template = AnamnesisTemplate::from_json(&document).map_err(|err| {
        warn!("event=template_read module=repo status=error template_id={id} error_code=bad_document");
        RepoError::InvalidData(format!("template `{id}` has unreadable document: {err}"))
    })?;

    if template.id.as_deref() != Some(id.as_str()) {
        return Err(RepoError::InvalidData(format!(
            "template `{id}` document carries id `{}`",
            template.id.as_deref().unwrap_or("<none>")
        )));
    }

    template
        .check_structure()
        .map_err(|err| RepoError::InvalidData(format!("template `{id}`: {err}")))?;

    Ok(template)
}

/// Builds a `LIKE` substring pattern with `\` escaping wildcards.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
