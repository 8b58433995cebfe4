//! In-memory template editing.
//!
//! # Responsibility
//! - Own one template document per editing session.
//! - Apply group/question/option edits while keeping question ranks in sync.
//! - Discard fetch results that arrive after their session moved on.
//!
//! # Invariants
//! - After every structural edit, question `order` is exactly `1..N` in
//!   sequence order within the touched group; other groups are untouched.
//! - Unknown ids are no-ops, never errors. Only out-of-range reorder
//!   indices are rejected.

mod session;
mod template_editor;

pub use session::{EditorSession, LoadOutcome, LoadTicket};
pub use template_editor::{EditorError, QuestionUpdate, TemplateEditor};
