//! ANTLR4 grammar loading: lexer, parser, IR, and `tokenVocab` merging.
//!
//! The loader never throws on malformed grammars — problems surface as
//! diagnostics and the returned IR covers whatever could be recovered.

mod ir;
mod lexer;
mod merge;
mod parser;


pub use ir::{
    AltLabel, Alternative, AlternativeList, ElementId, ElementKind, Grammar, GrammarKind, Label,
    LabelKind, LexerCommand, OptionEntry, Options, ResolvedTokenRef, Rule, RuleKind, Suffix,
    SyntaxElement,
};
pub use lexer::{Token, TokenKind, lex, token_text};
pub use merge::{load, merge_token_vocabulary};
pub use parser::parse;
