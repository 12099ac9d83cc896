//! Grammar analysis: element indices and only-of-type flags.
//!
//! For every parser rule, assigns each reachable element its position within
//! the enclosing rule context — the nth child overall and the nth of its
//! token/rule type — so emitted code can address the right parse-tree child.
//! Results live in a per-run side table keyed by element identity; the
//! grammar IR itself is never mutated.

mod indices;


use std::collections::HashMap;

use crate::diagnostics::Diagnostics;
use crate::grammar::{ElementId, Grammar};

pub use indices::analyze_rule_contexts;

/// Position of an element within its rule context. `None` means the position
/// cannot be determined statically (optional/repeated ancestry or diverging
/// block branches); downstream code falls back to list-valued lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementIndex {
    pub index_by_type: Option<u32>,
    pub child_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementAnnotation {
    pub index: ElementIndex,
    /// Guaranteed to be the only element of its type in the context,
    /// permitting an unindexed accessor.
    pub is_only_of_type: bool,
}

/// Per-run side table of analysis results, keyed by element identity.
#[derive(Debug, Default)]
pub struct Analysis {
    by_element: HashMap<ElementId, ElementAnnotation>,
}

impl Analysis {
    pub fn get(&self, id: ElementId) -> Option<&ElementAnnotation> {
        self.by_element.get(&id)
    }

    pub fn index_by_type(&self, id: ElementId) -> Option<u32> {
        self.get(id).and_then(|a| a.index.index_by_type)
    }

    pub fn is_only_of_type(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|a| a.is_only_of_type)
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }

    pub(crate) fn insert(&mut self, id: ElementId, annotation: ElementAnnotation) {
        self.by_element.insert(id, annotation);
    }

    pub(crate) fn set_only_of_type(&mut self, id: ElementId, value: bool) {
        if let Some(entry) = self.by_element.get_mut(&id) {
            entry.is_only_of_type = value;
        }
    }
}

/// Analyzes every parser rule of `grammar`. Must run exactly once per loaded
/// grammar, before the model builder or the regex synthesizer traverse it.
pub fn analyze(grammar: &Grammar, diagnostics: &mut Diagnostics) -> Analysis {
    let mut analysis = Analysis::default();
    for rule in grammar.parser_rules() {
        analyze_rule_contexts(grammar, rule, &mut analysis, diagnostics);
    }
    analysis
}
