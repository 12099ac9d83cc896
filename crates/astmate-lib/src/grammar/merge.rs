//! Grammar loading and `tokenVocab` merging.
//!
//! A parser grammar that declares `options { tokenVocab = FooLexer; }` gets
//! the rules of the sibling `FooLexer.g4` merged in, producing a combined
//! grammar the downstream components can treat uniformly.

use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::{Error, Result};

use super::ir::{AlternativeList, ElementId, ElementKind, Grammar, GrammarKind, Rule};
use super::parser::parse;

/// Loads a grammar from disk, resolving `tokenVocab` against sibling files.
/// Returns the grammar together with the primary file's source text (needed
/// for rendering diagnostics).
pub fn load(path: &Path, diagnostics: &mut Diagnostics) -> Result<(Grammar, String)> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut grammar = parse(&source, diagnostics);

    if let Some(vocab) = grammar.options.get("tokenVocab").map(str::to_string)
        && grammar.kind != GrammarKind::Lexer
    {
        let sibling = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{vocab}.g4"));
        match std::fs::read_to_string(&sibling) {
            Ok(lexer_source) => {
                // The lexer file gets its own diagnostics sink: its spans are
                // relative to a different source text.
                let mut lexer_diag = Diagnostics::new();
                let lexer_grammar = parse(&lexer_source, &mut lexer_diag);
                if lexer_diag.has_errors() {
                    diagnostics
                        .error(
                            format!("token vocabulary `{}` has syntax errors", sibling.display()),
                            grammar.span,
                        )
                        .emit();
                }
                merge_token_vocabulary(&mut grammar, lexer_grammar);
            }
            Err(_) => {
                diagnostics
                    .warning(
                        format!(
                            "tokenVocab `{vocab}` not found next to the grammar (expected `{}`)",
                            sibling.display()
                        ),
                        grammar.span,
                    )
                    .emit();
            }
        }
    }

    Ok((grammar, source))
}

/// Merges the lexer grammar's rules and token declarations into `grammar`.
/// Element ids from the lexer grammar are re-based so they stay unique.
pub fn merge_token_vocabulary(grammar: &mut Grammar, mut lexer: Grammar) {
    let offset = grammar.element_count;
    for rule in &mut lexer.rules {
        offset_rule_ids(rule, offset);
    }
    grammar.element_count += lexer.element_count;
    grammar.token_decls.extend(lexer.token_decls);
    grammar.rules.extend(lexer.rules);
    if grammar.has_lexer_rules() && grammar.has_parser_rules() {
        grammar.kind = GrammarKind::Combined;
    }
}

fn offset_rule_ids(rule: &mut Rule, offset: u32) {
    offset_list_ids(&mut rule.body, offset);
}

fn offset_list_ids(list: &mut AlternativeList, offset: u32) {
    for alt in &mut list.alternatives {
        for element in &mut alt.elements {
            element.id = ElementId(element.id.0 + offset);
            if let ElementKind::Block(inner) = &mut element.kind {
                offset_list_ids(inner, offset);
            }
        }
    }
}
