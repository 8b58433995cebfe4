//! Editing session with stale-fetch protection.
//!
//! # Responsibility
//! - Hold the one active editor of a session.
//! - Apply fetched documents only while the fetch that produced them is
//!   still the latest one.
//!
//! # Invariants
//! - Every `begin_load`, `start_new` and `close` bumps the generation and
//!   invalidates older tickets.
//! - A discarded load never touches the active editor.

use super::TemplateEditor;
use crate::model::template::{AnamnesisTemplate, DocumentError, TemplateId};
use log::{debug, info, warn};

/// Proof that a fetch was started for a given session generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    template_id: TemplateId,
}

impl LoadTicket {
    /// Id of the template this fetch was started for.
    pub fn template_id(&self) -> &str {
        &self.template_id
    }
}

/// Result of completing a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched document is now the active editor.
    Applied,
    /// The ticket was stale; the document was dropped.
    Discarded,
}

/// Session owning at most one active template editor.
#[derive(Debug, Default)]
pub struct EditorSession {
    generation: u64,
    pending: Option<TemplateId>,
    editor: Option<TemplateEditor>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any active editor with a blank create-mode editor.
    pub fn start_new(&mut self) -> &mut TemplateEditor {
        self.advance();
        self.editor.insert(TemplateEditor::new())
    }

    /// Starts fetching a stored template. Older tickets become stale.
    pub fn begin_load(&mut self, template_id: impl Into<TemplateId>) -> LoadTicket {
        self.advance();
        let template_id = template_id.into();
        self.pending = Some(template_id.clone());
        LoadTicket {
            generation: self.generation,
            template_id,
        }
    }

    /// Applies a fetched document if `ticket` is still current.
    ///
    /// # Errors
    /// - Returns `DocumentError` when a current document has empty or
    ///   repeated ids. The load stays pending and the same ticket can
    ///   complete it with a refetched document.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        template: AnamnesisTemplate,
    ) -> Result<LoadOutcome, DocumentError> {
        if !self.is_current(ticket) {
            debug!(
                "event=session_load module=editor status=discarded template_id={} ticket_generation={} generation={}",
                ticket.template_id, ticket.generation, self.generation
            );
            return Ok(LoadOutcome::Discarded);
        }

        let editor = TemplateEditor::hydrate(template).map_err(|err| {
            warn!(
                "event=session_load module=editor status=error template_id={} error={}",
                ticket.template_id, err
            );
            err
        })?;
        self.pending = None;
        self.editor = Some(editor);
        info!(
            "event=session_load module=editor status=ok template_id={}",
            ticket.template_id
        );
        Ok(LoadOutcome::Applied)
    }

    /// Drops the active editor and invalidates outstanding tickets.
    pub fn close(&mut self) {
        self.advance();
        self.editor = None;
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
            && self.pending.as_deref() == Some(ticket.template_id.as_str())
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn editor(&self) -> Option<&TemplateEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut TemplateEditor> {
        self.editor.as_mut()
    }

    /// Takes the active editor out of the session.
    pub fn take_editor(&mut self) -> Option<TemplateEditor> {
        self.editor.take()
    }

    fn advance(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
    }
}
