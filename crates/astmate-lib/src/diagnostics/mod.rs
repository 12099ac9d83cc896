//! Generator diagnostics infrastructure.
//!
//! Diagnostics are collected while loading, analyzing, and generating; nothing
//! in the core aborts mid-component. Callers inspect the collection (or render
//! it with [`DiagnosticsPrinter`]) and decide whether the run's outputs are
//! usable.

mod collection;
mod message;
mod printer;


pub use collection::Diagnostics;
pub use message::{DiagnosticMessage, RelatedInfo, Severity};
pub use printer::DiagnosticsPrinter;

use rowan::TextRange;

/// Builder for constructing a diagnostic message.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl<'a> DiagnosticBuilder<'a> {
    pub(crate) fn new(diagnostics: &'a mut Diagnostics, message: DiagnosticMessage) -> Self {
        Self {
            diagnostics,
            message,
        }
    }

    pub fn related_to(mut self, msg: impl Into<String>, range: TextRange) -> Self {
        self.message.related.push(RelatedInfo::new(range, msg));
        self
    }

    pub fn emit(self) {
        self.diagnostics.push(self.message);
    }
}
