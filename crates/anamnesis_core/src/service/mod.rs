//! Core use-case services.
//!
//! # Responsibility
//! - Connect editing sessions to the template store.
//! - Keep callers independent from storage details.

pub mod template_service;
