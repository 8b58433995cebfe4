//! Template persistence contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define create/fetch/update/delete/list over saved templates.
//! - Keep SQL details out of editor and service code.
//!
//! # Invariants
//! - Writes run submission validation before touching SQL.
//! - Reads reject corrupt stored documents instead of masking them.

pub mod template_repo;
