//! Keyword classification and word-boundary anchoring.
//!
//! A rule is keyword-like when every alternative reduces to a finite set of
//! fixed texts: literals, literal alternations, small character sets, or
//! references to other keyword-like rules. Keyword patterns get `\b` anchors,
//! but only at ends that actually start/end with a word character — `@import`
//! keeps its bare `@`.

use crate::grammar::{Alternative, ElementKind, Grammar, Rule, RuleKind, Suffix};

use super::regex::{enumerate_charset, group_spans_whole};

/// Caps the cartesian blowup of text enumeration.
const MAX_TEXTS: usize = 64;

/// Enumerates every text a rule can match, or `None` when the rule is not
/// keyword-like. `visiting` guards against reference cycles.
pub fn rule_texts(
    grammar: &Grammar,
    rule: &Rule,
    visiting: &mut Vec<String>,
) -> Option<Vec<String>> {
    if visiting.iter().any(|n| n == &rule.name) {
        return None;
    }
    visiting.push(rule.name.clone());
    let mut texts = Vec::new();
    for alt in &rule.body.alternatives {
        texts.extend(alternative_texts_inner(grammar, alt, visiting)?);
        if texts.len() > MAX_TEXTS {
            visiting.pop();
            return None;
        }
    }
    visiting.pop();
    Some(texts)
}

/// Enumerates the texts of a single alternative, or `None` when it contains
/// anything beyond fixed text.
pub fn alternative_texts(
    grammar: &Grammar,
    alt: &Alternative,
    visiting: &mut Vec<String>,
) -> Option<Vec<String>> {
    alternative_texts_inner(grammar, alt, visiting)
}

fn alternative_texts_inner(
    grammar: &Grammar,
    alt: &Alternative,
    visiting: &mut Vec<String>,
) -> Option<Vec<String>> {
    let mut texts = vec![String::new()];
    for element in &alt.elements {
        if element.suffix != Suffix::None || element.not {
            return None;
        }
        let element_texts: Vec<String> = match &element.kind {
            ElementKind::Literal(text) => vec![text.clone()],
            ElementKind::CharSet {
                negated: false,
                body,
            } => {
                let chars = enumerate_charset(body)?;
                if chars.is_empty() || chars.len() > 8 {
                    return None;
                }
                chars.into_iter().map(String::from).collect()
            }
            ElementKind::TokenRef(name) => {
                let target = grammar
                    .rule(name)
                    .filter(|r| r.kind == RuleKind::Lexer)?;
                rule_texts(grammar, target, visiting)?
            }
            ElementKind::Block(list) => {
                let mut block_texts = Vec::new();
                for alt in &list.alternatives {
                    block_texts.extend(alternative_texts_inner(grammar, alt, visiting)?);
                }
                block_texts
            }
            ElementKind::Empty => vec![String::new()],
            _ => return None,
        };

        let mut next = Vec::with_capacity(texts.len() * element_texts.len());
        for prefix in &texts {
            for suffix in &element_texts {
                next.push(format!("{prefix}{suffix}"));
            }
        }
        if next.len() > MAX_TEXTS {
            return None;
        }
        texts = next;
    }
    Some(texts)
}

/// A keyword-like rule matches at least one non-empty fixed text.
pub fn keyword_texts(grammar: &Grammar, rule: &Rule) -> Option<Vec<String>> {
    let texts = rule_texts(grammar, rule, &mut Vec::new())?;
    texts.iter().any(|t| !t.is_empty()).then_some(texts)
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Adds `\b` anchors around a keyword pattern where a word boundary is
/// meaningful: prefix iff every text begins with a word character, suffix iff
/// every text ends with one.
pub fn apply_word_boundaries(regex: &str, texts: &[String]) -> String {
    let anchor_prefix = texts
        .iter()
        .filter(|t| !t.is_empty())
        .all(|t| t.chars().next().is_some_and(is_word_char));
    let anchor_suffix = texts
        .iter()
        .filter(|t| !t.is_empty())
        .all(|t| t.chars().next_back().is_some_and(is_word_char));

    let body = if is_self_contained_group(regex) {
        regex.to_string()
    } else {
        format!("(?:{regex})")
    };

    match (anchor_prefix, anchor_suffix) {
        (true, true) => format!(r"\b{body}\b"),
        (true, false) => format!(r"\b{body}"),
        (false, true) => format!(r"{body}\b"),
        (false, false) => body,
    }
}

/// Whether the anchors apply at each end of a rule's text set; used when
/// deciding if reordering alone can fix a prefix collision.
pub fn has_suffix_anchor(texts: &[String]) -> bool {
    texts
        .iter()
        .filter(|t| !t.is_empty())
        .all(|t| t.chars().next_back().is_some_and(is_word_char))
}

fn is_self_contained_group(regex: &str) -> bool {
    regex.starts_with("(?") && regex.ends_with(')') && group_spans_whole(regex)
}
