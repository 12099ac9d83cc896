//! Lexer for ANTLR4 grammar source.
//!
//! Produces span-based tokens; text is sliced from source only when needed.
//! Brace-delimited actions (and `options {...}` bodies, which share the same
//! surface syntax) are captured as single `Action` tokens via a callback that
//! tracks nesting and quoting, since balanced braces are not regular.
//!
//! Consecutive unrecognized characters are coalesced into single `Garbage`
//! tokens so malformed input stays manageable downstream.

use logos::Logos;
use rowan::TextRange;
use std::ops::Range;

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(":")]
    Colon,

    #[token(";")]
    Semi,

    #[token("|")]
    Pipe,

    /// `+=` before `+` and `=` for correct precedence.
    #[token("+=")]
    PlusEquals,

    #[token("=")]
    Equals,

    #[token("->")]
    Arrow,

    #[token("..")]
    DotDot,

    #[token(".")]
    Dot,

    #[token("~")]
    Tilde,

    #[token("#")]
    Hash,

    #[token(",")]
    Comma,

    /// Non-greedy `*?` quantifier
    #[token("*?")]
    StarQuestion,

    /// Non-greedy `+?` quantifier
    #[token("+?")]
    PlusQuestion,

    /// Non-greedy `??` quantifier
    #[token("??")]
    QuestionQuestion,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("grammar")]
    KwGrammar,

    #[token("lexer")]
    KwLexer,

    #[token("parser")]
    KwParser,

    #[token("fragment")]
    KwFragment,

    #[token("options")]
    KwOptions,

    #[token("tokens")]
    KwTokens,

    #[token("channels")]
    KwChannels,

    #[token("import")]
    KwImport,

    #[token("mode")]
    KwMode,

    #[token("returns")]
    KwReturns,

    #[token("locals")]
    KwLocals,

    #[token("throws")]
    KwThrows,

    #[token("catch")]
    KwCatch,

    #[token("finally")]
    KwFinally,

    /// Rule or token name. Defined after keywords so they take precedence.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"'(?:[^'\\\r\n]|\\.)*'")]
    StringLiteral,

    #[regex(r"\[(?:[^\]\\]|\\.)*\]")]
    CharSet,

    /// Brace-delimited action or options body, including the braces.
    #[token("{", lex_action)]
    Action,

    #[regex(r"[ \t\r\n\u{0C}]+")]
    Whitespace,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*(?:[^*]|\*[^/])*\*/")]
    BlockComment,

    /// Coalesced unrecognized characters
    Garbage,
}

impl TokenKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }
}

/// Consumes a balanced `{ ... }` body. The opening brace is already matched;
/// bumps the lexer to just past the matching close brace. Quoted sections
/// ('...' and "...") may contain unbalanced braces.
fn lex_action(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut depth = 1usize;
    let mut i = 0usize;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1; // skip escaped char
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        lex.bump(i + 1);
                        return true;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    // Unterminated action: consume the rest so lexing terminates.
    lex.bump(bytes.len());
    true
}

fn range_to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

/// Tokenizes grammar source into span-based tokens, coalescing consecutive
/// lexer errors into single `Garbage` tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        range_to_text_range(start..end),
                    ));
                }
                tokens.push(Token::new(kind, range_to_text_range(lexer.span())));
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        range_to_text_range(start..source.len()),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'g>(source: &'g str, token: &Token) -> &'g str {
    &source[std::ops::Range::<usize>::from(token.span)]
}
