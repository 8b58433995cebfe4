//! Anamnesis template document model.
//!
//! # Responsibility
//! - Define the canonical template/group/question/option shapes.
//! - Own the wire (JSON) representation exchanged with persistence.
//!
//! # Invariants
//! - Item ids are unique within their containing collection.
//! - Question `order` mirrors sequence position as `1..N` inside a group.

pub mod template;
