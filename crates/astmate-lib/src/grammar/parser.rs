//! Recursive-descent parser from `.g4` tokens into the grammar IR.
//!
//! The parser is resilient: it always produces a [`Grammar`], reporting
//! problems as diagnostics rather than failing. Recovery is per-rule — on an
//! unexpected token inside a rule body the parser synchronizes to the next
//! `;` and continues with the following rule.

use rowan::TextRange;

use crate::diagnostics::Diagnostics;

use super::ir::{
    AltLabel, Alternative, AlternativeList, ElementId, ElementKind, Grammar, GrammarKind, Label,
    LabelKind, LexerCommand, OptionEntry, Options, Rule, RuleKind, Suffix, SyntaxElement,
};
use super::lexer::{Token, TokenKind, lex, token_text};

const MAX_BLOCK_DEPTH: u32 = 128;

/// Parses grammar source into the IR, appending problems to `diagnostics`.
pub fn parse(source: &str, diagnostics: &mut Diagnostics) -> Grammar {
    let tokens: Vec<Token> = lex(source)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect();
    Parser {
        source,
        tokens,
        pos: 0,
        diag: diagnostics,
        next_element_id: 0,
        depth: 0,
    }
    .parse_grammar()
}

struct Parser<'s, 'd> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    diag: &'d mut Diagnostics,
    next_element_id: u32,
    depth: u32,
}

impl<'s, 'd> Parser<'s, 'd> {
    fn parse_grammar(mut self) -> Grammar {
        let start = self.current_span();

        let kind = if self.eat(TokenKind::KwLexer) {
            self.expect(TokenKind::KwGrammar, "`grammar`");
            GrammarKind::Lexer
        } else if self.eat(TokenKind::KwParser) {
            self.expect(TokenKind::KwGrammar, "`grammar`");
            GrammarKind::Parser
        } else {
            self.expect(TokenKind::KwGrammar, "`grammar`");
            GrammarKind::Combined
        };

        let name = self
            .eat_text(TokenKind::Ident)
            .unwrap_or_else(|| {
                self.error("expected grammar name");
                String::new()
            });
        self.expect(TokenKind::Semi, "`;` after grammar declaration");

        let mut options = Options::default();
        let mut token_decls = Vec::new();

        // Prequel constructs: options, tokens, channels, import.
        loop {
            match self.current() {
                Some(TokenKind::KwOptions) => {
                    self.bump();
                    options.0.extend(self.parse_option_block());
                }
                Some(TokenKind::KwTokens) => {
                    self.bump();
                    token_decls.extend(self.parse_name_block());
                }
                Some(TokenKind::KwChannels) => {
                    self.bump();
                    let _ = self.parse_name_block();
                }
                Some(TokenKind::KwImport) => {
                    self.bump();
                    while !self.at(TokenKind::Semi) && !self.eof() {
                        self.bump();
                    }
                    self.eat(TokenKind::Semi);
                }
                _ => break,
            }
        }

        let mut rules = Vec::new();
        while !self.eof() {
            match self.current() {
                Some(TokenKind::KwMode) => {
                    // `mode NAME;` — subsequent lexer rules are kept; mode
                    // boundaries carry no meaning for generation.
                    self.bump();
                    self.eat(TokenKind::Ident);
                    self.expect(TokenKind::Semi, "`;` after mode declaration");
                }
                Some(TokenKind::KwFragment) => {
                    self.bump();
                    if let Some(rule) = self.parse_lexer_rule(true) {
                        rules.push(rule);
                    }
                }
                Some(TokenKind::Ident) => {
                    let text = self.current_text();
                    let is_lexer = text.chars().next().is_some_and(|c| c.is_ascii_uppercase());
                    let rule = if is_lexer {
                        self.parse_lexer_rule(false)
                    } else {
                        self.parse_parser_rule()
                    };
                    if let Some(rule) = rule {
                        rules.push(rule);
                    }
                }
                _ => {
                    self.error("expected a rule declaration");
                    self.bump();
                }
            }
        }

        let end = rules
            .last()
            .map(|r| r.span.end())
            .unwrap_or_else(|| start.end());
        Grammar {
            kind,
            name,
            span: TextRange::new(start.start(), end),
            options,
            token_decls,
            rules,
            element_count: self.next_element_id,
        }
    }

    fn parse_parser_rule(&mut self) -> Option<Rule> {
        let span_start = self.current_span().start();
        let name = self.eat_text(TokenKind::Ident)?;

        // Argument action `[...]` lexes as a char set; discard.
        self.eat(TokenKind::CharSet);

        if self.eat(TokenKind::KwReturns) {
            self.eat(TokenKind::CharSet);
        }
        if self.eat(TokenKind::KwLocals) {
            self.eat(TokenKind::CharSet);
        }
        if self.eat(TokenKind::KwThrows) {
            while self.eat(TokenKind::Ident) && self.eat(TokenKind::Comma) {}
        }

        let mut options = Options::default();
        if self.eat(TokenKind::KwOptions) {
            options.0.extend(self.parse_option_block());
        }

        self.expect(TokenKind::Colon, "`:` after rule name");
        let body = self.parse_alternative_list();
        let span_end = self.current_span().end();
        if !self.expect(TokenKind::Semi, "`;` after rule body") {
            self.synchronize_past_semi();
        }
        self.skip_exception_handlers();

        Some(Rule {
            name,
            span: TextRange::new(span_start, span_end),
            kind: RuleKind::Parser,
            is_fragment: false,
            options,
            body,
            commands: Vec::new(),
        })
    }

    fn parse_lexer_rule(&mut self, is_fragment: bool) -> Option<Rule> {
        let span_start = self.current_span().start();
        let name = self.eat_text(TokenKind::Ident)?;

        let mut options = Options::default();
        if self.eat(TokenKind::KwOptions) {
            options.0.extend(self.parse_option_block());
        }

        self.expect(TokenKind::Colon, "`:` after rule name");
        let body = self.parse_alternative_list();

        let mut commands = Vec::new();
        if self.eat(TokenKind::Arrow) {
            loop {
                let Some(cmd) = self.eat_text(TokenKind::Ident) else {
                    self.error("expected lexer command after `->`");
                    break;
                };
                let arg = if self.eat(TokenKind::ParenOpen) {
                    let arg = self
                        .eat_text(TokenKind::Ident)
                        .or_else(|| self.eat_text(TokenKind::Int));
                    self.expect(TokenKind::ParenClose, "`)` after lexer command argument");
                    arg
                } else {
                    None
                };
                commands.push(LexerCommand { name: cmd, arg });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let span_end = self.current_span().end();
        if !self.expect(TokenKind::Semi, "`;` after rule body") {
            self.synchronize_past_semi();
        }

        Some(Rule {
            name,
            span: TextRange::new(span_start, span_end),
            kind: RuleKind::Lexer,
            is_fragment,
            options,
            body,
            commands,
        })
    }

    fn parse_alternative_list(&mut self) -> AlternativeList {
        let mut alternatives = Vec::new();
        loop {
            let mut alt = self.parse_alternative();
            if self.eat(TokenKind::Hash) {
                match self.eat_text(TokenKind::Ident) {
                    Some(name) => {
                        alt.label = Some(AltLabel {
                            name,
                            span: self.prev_span(),
                        });
                    }
                    None => self.error("expected a label name after `#`"),
                }
            }
            alternatives.push(alt);
            if !self.eat(TokenKind::Pipe) {
                break;
            }
        }
        AlternativeList { alternatives }
    }

    fn parse_alternative(&mut self) -> Alternative {
        let start = self.current_span().start();
        let mut elements = Vec::new();
        while self.at_element_start() {
            if let Some(element) = self.parse_element() {
                elements.push(element);
            }
        }
        if elements.is_empty() {
            let span = TextRange::empty(start);
            elements.push(SyntaxElement {
                id: self.fresh_id(),
                span,
                kind: ElementKind::Empty,
                suffix: Suffix::None,
                label: None,
                not: false,
            });
        }
        let end = elements
            .last()
            .map(|e| e.span.end())
            .unwrap_or(start);
        Alternative {
            label: None,
            elements,
            span: TextRange::new(start, end),
        }
    }

    fn at_element_start(&self) -> bool {
        matches!(
            self.current(),
            Some(
                TokenKind::StringLiteral
                    | TokenKind::CharSet
                    | TokenKind::Ident
                    | TokenKind::Dot
                    | TokenKind::Tilde
                    | TokenKind::ParenOpen
                    | TokenKind::Action
                    | TokenKind::Lt
            )
        )
    }

    /// Parses one element; returns `None` for non-element constructs that are
    /// consumed and discarded (actions, predicates, element options).
    fn parse_element(&mut self) -> Option<SyntaxElement> {
        // Embedded action or semantic predicate: `{...}` `{...}?`
        if self.at(TokenKind::Action) {
            self.bump();
            self.eat(TokenKind::Question);
            return None;
        }
        // Element options `<assoc=right>`: consumed, not represented.
        if self.eat(TokenKind::Lt) {
            while !self.at(TokenKind::Gt) && !self.eof() {
                self.bump();
            }
            self.eat(TokenKind::Gt);
            return None;
        }

        let start = self.current_span().start();

        let label = self.try_parse_label();
        let not = self.eat(TokenKind::Tilde);
        let kind = self.parse_element_core()?;
        let suffix = self.parse_suffix();
        let end = self.prev_span().end();

        Some(SyntaxElement {
            id: self.fresh_id(),
            span: TextRange::new(start, end),
            kind,
            suffix,
            label,
            not,
        })
    }

    fn try_parse_label(&mut self) -> Option<Label> {
        if !self.at(TokenKind::Ident) {
            return None;
        }
        let kind = match self.nth(1) {
            Some(TokenKind::Equals) => LabelKind::Assign,
            Some(TokenKind::PlusEquals) => LabelKind::PlusAssign,
            _ => return None,
        };
        let span = self.current_span();
        let name = self.current_text().to_string();
        self.bump(); // label name
        self.bump(); // `=` or `+=`
        Some(Label { name, kind, span })
    }

    fn parse_element_core(&mut self) -> Option<ElementKind> {
        match self.current() {
            Some(TokenKind::StringLiteral) => {
                let text = self.string_literal_value();
                self.bump();
                if self.eat(TokenKind::DotDot) {
                    let range_end = if self.at(TokenKind::StringLiteral) {
                        let end_text = self.string_literal_value();
                        self.bump();
                        end_text
                    } else {
                        self.error("expected a literal after `..`");
                        String::new()
                    };
                    Some(self.char_range_set(&text, &range_end))
                } else {
                    Some(ElementKind::Literal(text))
                }
            }
            Some(TokenKind::CharSet) => {
                let raw = self.current_text();
                let body = raw[1..raw.len() - 1].to_string();
                self.bump();
                Some(ElementKind::CharSet {
                    negated: false,
                    body,
                })
            }
            Some(TokenKind::Ident) => {
                let name = self.current_text().to_string();
                self.bump();
                let is_token = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
                Some(if is_token {
                    ElementKind::TokenRef(name)
                } else {
                    ElementKind::RuleRef(name)
                })
            }
            Some(TokenKind::Dot) => {
                self.bump();
                Some(ElementKind::Dot)
            }
            Some(TokenKind::ParenOpen) => {
                self.bump();
                if self.depth >= MAX_BLOCK_DEPTH {
                    self.error("blocks nested too deeply");
                    self.synchronize_to_block_end();
                    return Some(ElementKind::Empty);
                }
                // Sub-rule options `( options {...} : ... )`
                if self.at(TokenKind::KwOptions) {
                    self.bump();
                    self.eat(TokenKind::Action);
                    self.eat(TokenKind::Colon);
                }
                self.depth += 1;
                let alternatives = self.parse_alternative_list();
                self.depth -= 1;
                self.expect(TokenKind::ParenClose, "`)` to close block");
                Some(ElementKind::Block(alternatives))
            }
            _ => {
                self.error("expected a grammar element");
                if !self.eof() {
                    self.bump();
                }
                None
            }
        }
    }

    fn parse_suffix(&mut self) -> Suffix {
        let suffix = match self.current() {
            Some(TokenKind::Question) => Suffix::Optional,
            Some(TokenKind::Star) => Suffix::Star,
            Some(TokenKind::Plus) => Suffix::Plus,
            Some(TokenKind::QuestionQuestion) => Suffix::NonGreedyOptional,
            Some(TokenKind::StarQuestion) => Suffix::NonGreedyStar,
            Some(TokenKind::PlusQuestion) => Suffix::NonGreedyPlus,
            _ => return Suffix::None,
        };
        self.bump();
        suffix
    }

    /// Desugars `'a'..'z'` into a character-set element.
    fn char_range_set(&mut self, start: &str, end: &str) -> ElementKind {
        let (Some(lo), Some(hi)) = (single_char(start), single_char(end)) else {
            self.error("range endpoints must be single-character literals");
            return ElementKind::Empty;
        };
        let mut body = String::new();
        push_charset_char(&mut body, lo);
        body.push('-');
        push_charset_char(&mut body, hi);
        ElementKind::CharSet {
            negated: false,
            body,
        }
    }

    /// Current `StringLiteral` token's unescaped content (quotes stripped).
    fn string_literal_value(&self) -> String {
        let raw = self.current_text();
        unescape_literal(&raw[1..raw.len() - 1])
    }

    // --- option/name blocks -------------------------------------------------

    /// Parses `{ name = value ; ... }` from an `Action` token body.
    fn parse_option_block(&mut self) -> Vec<OptionEntry> {
        let Some(token) = self.current_token() else {
            self.error("expected `{ ... }` after `options`");
            return Vec::new();
        };
        if token.kind != TokenKind::Action {
            self.error("expected `{ ... }` after `options`");
            return Vec::new();
        }
        let base: u32 = token.span.start().into();
        let text = token_text(self.source, &token).to_string();
        self.bump();

        let mut entries = Vec::new();
        let body = &text[1..text.len().saturating_sub(1)];
        for (offset, entry) in split_with_offsets(body, ';') {
            let Some(eq) = entry.find('=') else { continue };
            let name = entry[..eq].trim();
            let value = entry[eq + 1..].trim().trim_matches('\'');
            if name.is_empty() {
                continue;
            }
            let start = base + 1 + offset;
            let span = TextRange::new(start.into(), (start + entry.len() as u32).into());
            entries.push(OptionEntry {
                name: name.to_string(),
                value: value.to_string(),
                span,
            });
        }
        entries
    }

    /// Parses `{ A, B, C }` from an `Action` token body (tokens/channels).
    fn parse_name_block(&mut self) -> Vec<String> {
        let Some(token) = self.current_token() else {
            self.error("expected `{ ... }`");
            return Vec::new();
        };
        if token.kind != TokenKind::Action {
            self.error("expected `{ ... }`");
            return Vec::new();
        }
        let text = token_text(self.source, &token).to_string();
        self.bump();

        let body = &text[1..text.len().saturating_sub(1)];
        body.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn skip_exception_handlers(&mut self) {
        loop {
            if self.eat(TokenKind::KwCatch) {
                self.eat(TokenKind::CharSet);
                self.eat(TokenKind::Action);
            } else if self.eat(TokenKind::KwFinally) {
                self.eat(TokenKind::Action);
            } else {
                break;
            }
        }
    }

    // --- token cursor -------------------------------------------------------

    fn current_token(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn current(&self) -> Option<TokenKind> {
        self.current_token().map(|t| t.kind)
    }

    fn nth(&self, lookahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + lookahead).map(|t| t.kind)
    }

    fn current_text(&self) -> &str {
        self.current_token()
            .map(|t| token_text(self.source, &t))
            .unwrap_or("")
    }

    fn current_span(&self) -> TextRange {
        self.current_token()
            .map(|t| t.span)
            .unwrap_or_else(|| TextRange::empty((self.source.len() as u32).into()))
    }

    fn prev_span(&self) -> TextRange {
        if self.pos == 0 {
            return TextRange::empty(0.into());
        }
        self.tokens
            .get(self.pos - 1)
            .map(|t| t.span)
            .unwrap_or_else(|| TextRange::empty((self.source.len() as u32).into()))
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    fn bump(&mut self) {
        debug_assert!(!self.eof(), "bump called at EOF");
        if !self.eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_text(&mut self, kind: TokenKind) -> Option<String> {
        if self.at(kind) {
            let text = self.current_text().to_string();
            self.bump();
            Some(text)
        } else {
            None
        }
    }

    /// On mismatch: emit diagnostic but don't consume (allows caller recovery).
    fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(format!("expected {}", what));
        false
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_span();
        self.diag.error(message, range).emit();
    }

    fn synchronize_past_semi(&mut self) {
        while !self.eof() && !self.at(TokenKind::Semi) {
            self.bump();
        }
        self.eat(TokenKind::Semi);
    }

    fn synchronize_to_block_end(&mut self) {
        let mut depth = 1u32;
        while !self.eof() {
            match self.current() {
                Some(TokenKind::ParenOpen) => depth += 1,
                Some(TokenKind::ParenClose) => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }

    fn fresh_id(&mut self) -> ElementId {
        let id = ElementId(self.next_element_id);
        self.next_element_id += 1;
        id
    }
}

/// Splits on `sep`, yielding each piece with its byte offset in the input.
fn split_with_offsets(text: &str, sep: char) -> impl Iterator<Item = (u32, &str)> {
    let mut offset = 0u32;
    text.split(sep).map(move |piece| {
        let here = offset;
        offset += piece.len() as u32 + sep.len_utf8() as u32;
        (here, piece)
    })
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

/// Escapes a char for use inside a regex character class body.
fn push_charset_char(out: &mut String, c: char) {
    match c {
        ']' | '\\' | '-' | '^' => {
            out.push('\\');
            out.push(c);
        }
        _ => out.push(c),
    }
}

/// Unescapes ANTLR string-literal content: standard single-char escapes plus
/// `\uXXXX` and `\u{...}`. Unknown escapes yield the escaped char itself.
pub(crate) fn unescape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
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
                    if let Some(c) = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        out.push(c);
                    }
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    if let Some(c) = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        out.push(c);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
