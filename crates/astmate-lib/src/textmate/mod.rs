//! TextMate grammar generation from lexer rules.
//!
//! One pattern per kept lexer rule plus synthetic patterns for implicit
//! literals used by parser rules. Patterns live in the `repository` and are
//! referenced from `patterns` by include, in an order that preserves ANTLR's
//! prioritized longest-match tokenization as far as a first-match engine
//! allows.

mod conflicts;
mod keywords;
mod regex;

#[cfg(test)]
mod regex_tests;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::grammar::{AlternativeList, ElementKind, Grammar, Rule};

use conflicts::{apply_rule_conflicts, reorder_for_longest_match};
use keywords::{apply_word_boundaries, is_word_char, keyword_texts};
use self::regex::{RegexSynthesizer, enumerate_charset, escape_literal};

/// A TextMate grammar document, serialized bit-exact per the TextMate JSON
/// schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMateGrammar {
    pub name: String,
    pub scope_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    pub patterns: Vec<PatternRef>,
    pub repository: IndexMap<String, Pattern>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternRef {
    pub include: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pattern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "match")]
    pub regex: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub captures: IndexMap<String, Capture>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capture {
    pub name: String,
}

impl TextMateGrammar {
    pub fn to_json(&self) -> String {
        let mut json = serde_json::to_string_pretty(self).expect("document serializes");
        json.push('\n');
        json
    }
}

/// Pattern under construction, before ordering passes and serialization.
#[derive(Debug, Clone)]
pub(crate) struct TokenPattern {
    pub(crate) key: String,
    pub(crate) rule_name: Option<String>,
    pub(crate) scope: String,
    pub(crate) regex: String,
    /// Enumerated fixed texts for keyword-like patterns.
    pub(crate) texts: Option<Vec<String>>,
    /// Per-branch scopes for merged conflict patterns.
    pub(crate) captures: Vec<(String, String)>,
}

/// Generates the TextMate grammar for `grammar`'s lexer rules.
pub fn generate(
    grammar: &Grammar,
    config: &GeneratorConfig,
    diagnostics: &mut Diagnostics,
) -> TextMateGrammar {
    let language = grammar.name.to_lowercase();

    // Implicit tokens take precedence over explicit lexer rules in ANTLR, so
    // their patterns come first.
    let mut patterns: Vec<TokenPattern> = Vec::new();
    let mut operator_count = 0u32;
    for literal in implicit_literals(grammar) {
        let texts = vec![literal.clone()];
        let regex = apply_word_boundaries(&escape_literal(&literal), &texts);
        let word_like = literal.chars().all(is_word_char);

        let key = if word_like {
            unique_key(&patterns, &literal.to_lowercase())
        } else {
            operator_count += 1;
            unique_key(&patterns, &format!("op{operator_count}"))
        };
        let scope = configured_scope(config, &format!("'{literal}'")).unwrap_or_else(|| {
            if word_like {
                default_scope("keyword", &literal, &language)
            } else {
                default_scope("punctuation", &key, &language)
            }
        });

        patterns.push(TokenPattern {
            key,
            rule_name: None,
            scope,
            regex,
            texts: Some(texts),
            captures: Vec::new(),
        });
    }

    for rule in grammar.lexer_rules().filter(|r| !r.is_fragment) {
        if is_whitespace_rule(rule) {
            continue;
        }

        let mut synthesizer = RegexSynthesizer::new(grammar, diagnostics);
        let regex = synthesizer.rule_pattern(rule);
        if regex.is_empty() {
            diagnostics
                .info(
                    format!("rule `{}` produced an empty pattern; skipped", rule.name),
                    rule.span,
                )
                .emit();
            continue;
        }

        let texts = keyword_texts(grammar, rule);
        let regex = match &texts {
            Some(texts) => apply_word_boundaries(&regex, texts),
            None => regex,
        };

        let scope = configured_scope(config, &rule.name).unwrap_or_else(|| {
            default_scope(rule_category(&rule.name, texts.is_some()), &rule.name, &language)
        });

        patterns.push(TokenPattern {
            key: unique_key(&patterns, &rule.name.to_lowercase()),
            rule_name: Some(rule.name.clone()),
            scope,
            regex,
            texts,
            captures: Vec::new(),
        });
    }

    reorder_for_longest_match(&mut patterns);
    let patterns = apply_rule_conflicts(
        patterns,
        &config.syntax_highlighting.rule_conflicts,
        diagnostics,
        grammar.span,
    );

    let mut repository = IndexMap::new();
    let mut includes = Vec::new();
    for pattern in patterns {
        includes.push(PatternRef {
            include: format!("#{}", pattern.key),
        });
        repository.insert(
            pattern.key,
            Pattern {
                name: (!pattern.scope.is_empty()).then_some(pattern.scope),
                regex: pattern.regex,
                captures: pattern
                    .captures
                    .into_iter()
                    .map(|(index, name)| (index, Capture { name }))
                    .collect(),
            },
        );
    }

    TextMateGrammar {
        name: grammar.name.clone(),
        scope_name: format!("source.{language}"),
        file_types: vec![language],
        patterns: includes,
        repository,
    }
}

fn configured_scope(config: &GeneratorConfig, key: &str) -> Option<String> {
    config
        .syntax_highlighting
        .rule_settings
        .get(key)
        .and_then(|s| s.text_mate_scope_name.clone())
}

/// Default scope: `<category>.<ruleName>.<language>`.
fn default_scope(category: &str, name: &str, language: &str) -> String {
    format!("{category}.{}.{language}", name.to_lowercase())
}

/// Scope category heuristics from rule naming conventions; keyword-likeness
/// decides the rest.
fn rule_category(rule_name: &str, keyword_like: bool) -> &'static str {
    let upper = rule_name.to_uppercase();
    if upper.contains("COMMENT") {
        "comment"
    } else if upper.contains("STRING") || upper.contains("STR") || upper.contains("CHAR") {
        "string"
    } else if upper.contains("NUMBER")
        || upper.contains("FLOAT")
        || upper.contains("DIGIT")
        || upper.ends_with("INT")
        || upper.ends_with("NUM")
    {
        "constant.numeric"
    } else if keyword_like {
        "keyword"
    } else if upper.ends_with("ID")
        || upper.ends_with("IDENT")
        || upper.ends_with("IDENTIFIER")
        || upper.ends_with("NAME")
    {
        "variable"
    } else {
        "other"
    }
}

fn unique_key(patterns: &[TokenPattern], base: &str) -> String {
    if !patterns.iter().any(|p| p.key == base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}{n}");
        if !patterns.iter().any(|p| p.key == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Literals used in parser rules with no aliasing lexer rule, in document
/// order, deduplicated. ANTLR promotes these to synthetic tokens.
fn implicit_literals(grammar: &Grammar) -> Vec<String> {
    let mut literals = Vec::new();
    for rule in grammar.parser_rules() {
        collect_literals(grammar, &rule.body, &mut literals);
    }
    literals
}

fn collect_literals(grammar: &Grammar, list: &AlternativeList, out: &mut Vec<String>) {
    for alt in &list.alternatives {
        for element in &alt.elements {
            match &element.kind {
                ElementKind::Literal(text) => {
                    if grammar.token_alias_for_literal(text).is_none()
                        && !out.iter().any(|l| l == text)
                    {
                        out.push(text.clone());
                    }
                }
                ElementKind::Block(inner) => collect_literals(grammar, inner, out),
                _ => {}
            }
        }
    }
}

/// Rules that only ever match whitespace and are skipped by the lexer have
/// nothing to highlight.
fn is_whitespace_rule(rule: &Rule) -> bool {
    rule.is_skipped() && list_is_whitespace(&rule.body)
}

fn list_is_whitespace(list: &AlternativeList) -> bool {
    list.alternatives.iter().all(|alt| {
        alt.elements.iter().all(|e| {
            !e.not
                && match &e.kind {
                    ElementKind::Literal(text) => text.chars().all(|c| c.is_whitespace()),
                    ElementKind::CharSet {
                        negated: false,
                        body,
                    } => enumerate_charset(body)
                        .is_some_and(|chars| chars.iter().all(|c| c.is_whitespace())),
                    ElementKind::Block(inner) => list_is_whitespace(inner),
                    ElementKind::Empty => true,
                    _ => false,
                }
        })
    })
}
