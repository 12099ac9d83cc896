//! Regex synthesis from lexer rules.
//!
//! Translates each lexer rule into an Oniguruma-compatible pattern: literals
//! are escaped, character sets copied, references to other lexer rules
//! inlined (with cycle detection through a parent-rule stack), and
//! `caseInsensitive` scope changes expressed with `(?i:...)` / `(?-i:...)`
//! wrappers. Only the portable dialect subset is emitted: alternation,
//! non-capturing groups, classes, quantifiers, anchors, inline modifiers.

use crate::diagnostics::Diagnostics;
use crate::grammar::{
    Alternative, AlternativeList, ElementKind, Grammar, Rule, RuleKind, Suffix, SyntaxElement,
};

use super::keywords::alternative_texts;

pub struct RegexSynthesizer<'g, 'd> {
    grammar: &'g Grammar,
    diag: &'d mut Diagnostics,
}

impl<'g, 'd> RegexSynthesizer<'g, 'd> {
    pub fn new(grammar: &'g Grammar, diag: &'d mut Diagnostics) -> Self {
        Self { grammar, diag }
    }

    /// Synthesizes the pattern for one lexer rule. Grammar- or rule-level
    /// case insensitivity wraps the whole pattern; the TextMate engine is
    /// case-sensitive by default, so `false` needs no wrapper.
    pub fn rule_pattern(&mut self, rule: &Rule) -> String {
        let ci = self.grammar.rule_case_insensitive(rule);
        let mut parents = vec![rule.name.clone()];
        let body = self.alt_list_regex(&rule.body, ci, &mut parents);
        if ci { format!("(?i:{body})") } else { body }
    }

    fn alt_list_regex(
        &mut self,
        list: &AlternativeList,
        ci: bool,
        parents: &mut Vec<String>,
    ) -> String {
        let mut branches: Vec<(String, Option<Vec<String>>)> = list
            .alternatives
            .iter()
            .map(|alt| {
                (
                    self.alternative_regex(alt, ci, parents),
                    alternative_texts(self.grammar, alt, &mut Vec::new()),
                )
            })
            .collect();

        // TextMate takes the first matching branch, so when every branch is a
        // known finite set of texts, longer candidates must come first to
        // keep longest-match semantics.
        if branches.len() > 1 && branches.iter().all(|(_, texts)| texts.is_some()) {
            branches.sort_by_key(|(_, texts)| {
                let longest = texts
                    .as_ref()
                    .and_then(|t| t.iter().map(|s| s.chars().count()).max())
                    .unwrap_or(0);
                std::cmp::Reverse(longest)
            });
        }

        let branches: Vec<String> = branches.into_iter().map(|(regex, _)| regex).collect();
        if branches.len() == 1 {
            branches.into_iter().next().expect("one branch")
        } else {
            format!("(?:{})", branches.join("|"))
        }
    }

    fn alternative_regex(
        &mut self,
        alt: &Alternative,
        ci: bool,
        parents: &mut Vec<String>,
    ) -> String {
        alt.elements
            .iter()
            .map(|e| self.element_regex(e, ci, parents))
            .collect()
    }

    fn element_regex(
        &mut self,
        element: &SyntaxElement,
        ci: bool,
        parents: &mut Vec<String>,
    ) -> String {
        let base = match &element.kind {
            ElementKind::Literal(text) => {
                if element.not {
                    complement_class(&text.chars().collect::<Vec<_>>())
                } else {
                    escape_literal(text)
                }
            }
            ElementKind::CharSet { negated, body } => {
                let negate = *negated || element.not;
                let body = translate_charset_body(body);
                if negate {
                    format!("[^{body}]")
                } else {
                    format!("[{body}]")
                }
            }
            ElementKind::Dot => ".".to_string(),
            ElementKind::TokenRef(name) if name == "EOF" => r"\z".to_string(),
            ElementKind::TokenRef(name) => self.token_ref_regex(element, name, ci, parents),
            ElementKind::RuleRef(name) => {
                // Parser-rule references cannot appear in lexer rules.
                self.diag
                    .error(
                        format!("lexer rule refers to parser rule `{name}`"),
                        element.span,
                    )
                    .emit();
                String::new()
            }
            ElementKind::Block(list) => self.alt_list_regex(list, ci, parents),
            ElementKind::Empty => String::new(),
        };

        if element.suffix == Suffix::None {
            base
        } else if base.is_empty() {
            base
        } else {
            format!(
                "{}{}",
                group_for_quantifier(&base),
                element.suffix.as_regex()
            )
        }
    }

    fn token_ref_regex(
        &mut self,
        element: &SyntaxElement,
        name: &str,
        ci: bool,
        parents: &mut Vec<String>,
    ) -> String {
        let Some(target) = self
            .grammar
            .rule(name)
            .filter(|r| r.kind == RuleKind::Lexer)
        else {
            self.diag
                .error(
                    format!("reference to unknown lexer rule `{name}`"),
                    element.span,
                )
                .emit();
            return String::new();
        };

        if parents.iter().any(|p| p == name) {
            self.diag
                .warning(
                    format!("recursive lexer rule `{name}` cannot be expressed as a regex; the recursive branch matches nothing"),
                    element.span,
                )
                .emit();
            return String::new();
        }

        if element.not {
            return match self.collect_rule_chars(target) {
                Some(chars) => complement_class(&chars),
                None => {
                    self.diag
                        .error(
                            format!("`~{name}` requires a single-character rule"),
                            element.span,
                        )
                        .emit();
                    String::new()
                }
            };
        }

        let target_ci = self.grammar.rule_case_insensitive(target);
        parents.push(name.to_string());
        let inner = self.alt_list_regex(&target.body, target_ci, parents);
        parents.pop();

        if target_ci == ci {
            inner
        } else if target_ci {
            format!("(?i:{inner})")
        } else {
            format!("(?-i:{inner})")
        }
    }

    /// Characters a simple rule can match, for `~REF` complements. `None`
    /// when the rule is not a plain set of literals/char sets.
    fn collect_rule_chars(&self, rule: &Rule) -> Option<Vec<char>> {
        let mut chars = Vec::new();
        for alt in &rule.body.alternatives {
            for element in &alt.elements {
                if element.suffix != Suffix::None || element.not {
                    return None;
                }
                match &element.kind {
                    ElementKind::Literal(text) => chars.extend(text.chars()),
                    ElementKind::CharSet {
                        negated: false,
                        body,
                    } => chars.extend(enumerate_charset(body)?),
                    _ => return None,
                }
            }
        }
        Some(chars)
    }
}

/// Regex metacharacters escaped in literal position.
fn is_regex_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
    )
}

/// Escapes literal text for use in a regex.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c if is_regex_meta(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Builds a `[^...]` class from concrete characters.
fn complement_class(chars: &[char]) -> String {
    let mut body = String::new();
    for &c in chars {
        push_class_char(&mut body, c);
    }
    format!("[^{body}]")
}

fn push_class_char(out: &mut String, c: char) {
    match c {
        ']' | '\\' | '-' | '^' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str(r"\n"),
        '\r' => out.push_str(r"\r"),
        '\t' => out.push_str(r"\t"),
        _ => out.push(c),
    }
}

/// Copies an ANTLR char-set body into regex form. The syntaxes agree except
/// for unicode escapes: `\uXXXX` and `\u{...}` both become `\x{...}`.
fn translate_charset_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        hex.push(c);
                    }
                    out.push_str(&format!(r"\x{{{hex}}}"));
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    out.push_str(&format!(r"\x{{{hex}}}"));
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Expands a char-set body into its member characters; `None` for bodies too
/// complex to enumerate (large ranges, class escapes like `\p{...}`).
pub(crate) fn enumerate_charset(body: &str) -> Option<Vec<char>> {
    const MAX_RANGE: u32 = 64;

    // Resolve escapes first; the bool records "was escaped", which keeps an
    // escaped `\-` from reading as a range operator.
    let mut items: Vec<(char, bool)> = Vec::new();
    let mut iter = body.chars();
    while let Some(c) = iter.next() {
        if c == '\\' {
            let resolved = match iter.next()? {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                '\\' => '\\',
                ']' => ']',
                '-' => '-',
                _ => return None,
            };
            items.push((resolved, true));
        } else {
            items.push((c, false));
        }
    }

    let mut chars = Vec::new();
    let mut i = 0;
    while i < items.len() {
        // A `-` forms a range only between two chars; leading or trailing it
        // is literal.
        if items.get(i + 1) == Some(&('-', false)) && i + 2 < items.len() {
            let (lo, _) = items[i];
            let (hi, _) = items[i + 2];
            let (lo_n, hi_n) = (lo as u32, hi as u32);
            if hi_n < lo_n || hi_n - lo_n >= MAX_RANGE {
                return None;
            }
            for n in lo_n..=hi_n {
                chars.push(char::from_u32(n)?);
            }
            i += 3;
        } else {
            chars.push(items[i].0);
            i += 1;
        }
    }
    Some(chars)
}

/// Wraps `regex` so a quantifier binds to the whole of it.
fn group_for_quantifier(regex: &str) -> String {
    if is_quantifier_atom(regex) {
        regex.to_string()
    } else {
        format!("(?:{regex})")
    }
}

/// True when a trailing quantifier would already bind to the whole pattern:
/// a single (possibly escaped) character, one character class, or one group.
fn is_quantifier_atom(regex: &str) -> bool {
    let mut chars = regex.chars();
    match (chars.next(), regex.chars().count()) {
        (_, 1) => true,
        (Some('\\'), 2) => true,
        (Some('['), _) => {
            let inner = &regex[1..];
            inner.ends_with(']') && !has_unescaped(&inner[..inner.len() - 1], ']')
        }
        (Some('('), _) => regex.ends_with(')') && group_spans_whole(regex),
        _ => false,
    }
}

fn has_unescaped(text: &str, needle: char) -> bool {
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == needle {
            return true;
        }
    }
    false
}

/// Whether a leading `(` closes only at the final character.
pub(crate) fn group_spans_whole(regex: &str) -> bool {
    let mut depth = 0u32;
    let mut escaped = false;
    let mut in_class = false;
    for (i, c) in regex.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return i == regex.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
