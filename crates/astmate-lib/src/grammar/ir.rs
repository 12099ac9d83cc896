//! Grammar intermediate representation.
//!
//! An owned, immutable tree produced by the loader and consumed read-only by
//! the analyzer, the AST model builder, and the regex synthesizer. Every
//! syntax element carries an [`ElementId`] assigned densely at parse time;
//! analysis results are attached through per-run side tables keyed by that id,
//! never by mutating the tree.

use rowan::TextRange;

/// Identity of a syntax element within one loaded grammar.
///
/// Ids are dense and stable for the lifetime of the [`Grammar`] they belong
/// to. They are meaningless across grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of grammar a `.g4` file declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarKind {
    Parser,
    Lexer,
    Combined,
}

/// A single `name = value` entry from an `options { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub name: String,
    pub value: String,
    pub span: TextRange,
}

/// Ordered option list for a grammar or a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(pub Vec<OptionEntry>);

impl Options {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }

    /// Tri-state boolean option: absent, `true`, or anything else (= false).
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| v == "true")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A lexer command after `->`, e.g. `skip` or `channel(HIDDEN)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerCommand {
    pub name: String,
    pub arg: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Parser,
    Lexer,
}

/// One grammar rule, lexer or parser.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub span: TextRange,
    pub kind: RuleKind,
    pub is_fragment: bool,
    pub options: Options,
    pub body: AlternativeList,
    pub commands: Vec<LexerCommand>,
}

impl Rule {
    /// Whether the lexer discards this token (`-> skip`).
    pub fn is_skipped(&self) -> bool {
        self.commands.iter().any(|c| c.name == "skip")
    }

    pub fn is_hidden(&self) -> bool {
        self.commands
            .iter()
            .any(|c| c.name == "channel" && c.arg.as_deref() == Some("HIDDEN"))
    }

    /// True when every alternative carries a `#label`.
    pub fn all_alternatives_labeled(&self) -> bool {
        !self.body.alternatives.is_empty()
            && self.body.alternatives.iter().all(|a| a.label.is_some())
    }

    /// True when some but not all alternatives carry a `#label`.
    /// ANTLR forbids this; the model builder reports it as an invalid grammar.
    pub fn has_mixed_labels(&self) -> bool {
        let labeled = self
            .body
            .alternatives
            .iter()
            .filter(|a| a.label.is_some())
            .count();
        labeled > 0 && labeled < self.body.alternatives.len()
    }
}

/// Parsed `#label` on an alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltLabel {
    pub name: String,
    pub span: TextRange,
}

#[derive(Debug, Clone, Default)]
pub struct AlternativeList {
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone)]
pub struct Alternative {
    pub label: Option<AltLabel>,
    pub elements: Vec<SyntaxElement>,
    pub span: TextRange,
}

/// `=` or `+=` label kind on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Assign,
    PlusAssign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub kind: LabelKind,
    pub span: TextRange,
}

/// Repetition/optionality suffix on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suffix {
    #[default]
    None,
    Optional,
    Star,
    Plus,
    NonGreedyOptional,
    NonGreedyStar,
    NonGreedyPlus,
}

impl Suffix {
    pub fn is_optional(self) -> bool {
        matches!(self, Suffix::Optional | Suffix::NonGreedyOptional)
    }

    pub fn is_repeated(self) -> bool {
        matches!(
            self,
            Suffix::Star | Suffix::Plus | Suffix::NonGreedyStar | Suffix::NonGreedyPlus
        )
    }

    /// Regex spelling; empty for `Suffix::None`.
    pub fn as_regex(self) -> &'static str {
        match self {
            Suffix::None => "",
            Suffix::Optional => "?",
            Suffix::Star => "*",
            Suffix::Plus => "+",
            Suffix::NonGreedyOptional => "??",
            Suffix::NonGreedyStar => "*?",
            Suffix::NonGreedyPlus => "+?",
        }
    }
}

/// One element of an alternative's sequence.
#[derive(Debug, Clone)]
pub struct SyntaxElement {
    pub id: ElementId,
    pub span: TextRange,
    pub kind: ElementKind,
    pub suffix: Suffix,
    pub label: Option<Label>,
    pub not: bool,
}

impl SyntaxElement {
    /// Structural equality ignoring identity and position. Used by the
    /// delimited-list detection in the model builder.
    pub fn structurally_eq(&self, other: &SyntaxElement) -> bool {
        let kinds_eq = match (&self.kind, &other.kind) {
            (ElementKind::Literal(a), ElementKind::Literal(b)) => a == b,
            (ElementKind::TokenRef(a), ElementKind::TokenRef(b)) => a == b,
            (ElementKind::RuleRef(a), ElementKind::RuleRef(b)) => a == b,
            (ElementKind::Dot, ElementKind::Dot) => true,
            _ => false,
        };
        kinds_eq
            && self.suffix == other.suffix
            && self.not == other.not
            && self.label == other.label
    }
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    /// Verbatim string literal, unescaped.
    Literal(String),
    /// Reference to a lexer rule or a declared token.
    TokenRef(String),
    /// Reference to a parser rule.
    RuleRef(String),
    /// Character set; `body` is the raw text between the brackets.
    CharSet { negated: bool, body: String },
    /// `.` wildcard.
    Dot,
    /// Parenthesized sub-alternatives.
    Block(AlternativeList),
    /// Empty alternative placeholder.
    Empty,
}

/// Pairs the lexer rule (if any) with the originating literal (if any) for a
/// token reference or literal element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTokenRef {
    pub rule_name: Option<String>,
    pub literal: Option<String>,
}

impl ResolvedTokenRef {
    /// Accessor name the generated parse-tree code addresses this token by.
    pub fn accessor_name(&self) -> Option<&str> {
        self.rule_name.as_deref()
    }
}

/// A loaded ANTLR4 grammar: header, options, declared tokens, and rules in
/// document order (lexer and parser rules interleaved as written).
#[derive(Debug, Clone)]
pub struct Grammar {
    pub kind: GrammarKind,
    pub name: String,
    pub span: TextRange,
    pub options: Options,
    /// Token names declared in a `tokens { ... }` block.
    pub token_decls: Vec<String>,
    pub rules: Vec<Rule>,
    /// Number of element ids allocated; ids are `0..element_count`.
    pub element_count: u32,
}

impl Grammar {
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn parser_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.kind == RuleKind::Parser)
    }

    /// Lexer rules including fragments.
    pub fn lexer_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.kind == RuleKind::Lexer)
    }

    pub fn has_parser_rules(&self) -> bool {
        self.parser_rules().next().is_some()
    }

    pub fn has_lexer_rules(&self) -> bool {
        self.lexer_rules().next().is_some()
    }

    /// Grammar-level `caseInsensitive` option.
    pub fn case_insensitive(&self) -> bool {
        self.options.get_bool("caseInsensitive").unwrap_or(false)
    }

    /// Effective `caseInsensitive` for a rule: rule option wins over the
    /// grammar option.
    pub fn rule_case_insensitive(&self, rule: &Rule) -> bool {
        rule.options
            .get_bool("caseInsensitive")
            .unwrap_or_else(|| self.case_insensitive())
    }

    /// Finds the lexer rule that is a plain alias for `literal`: a single
    /// alternative consisting of exactly that literal.
    pub fn token_alias_for_literal(&self, literal: &str) -> Option<&Rule> {
        self.lexer_rules().find(|rule| {
            !rule.is_fragment
                && rule.body.alternatives.len() == 1
                && match rule.body.alternatives[0].elements.as_slice() {
                    [only] => {
                        matches!(&only.kind, ElementKind::Literal(text) if text == literal)
                            && only.suffix == Suffix::None
                            && !only.not
                    }
                    _ => false,
                }
        })
    }

    /// Resolves a token reference or literal element to its lexer rule and/or
    /// originating literal text.
    pub fn resolve_token(&self, element: &SyntaxElement) -> ResolvedTokenRef {
        match &element.kind {
            ElementKind::TokenRef(name) => {
                let rule = self.rule(name).filter(|r| r.kind == RuleKind::Lexer);
                let literal = rule.and_then(|r| match r.body.alternatives.as_slice() {
                    [alt] => match alt.elements.as_slice() {
                        [only] => match &only.kind {
                            ElementKind::Literal(text) if only.suffix == Suffix::None => {
                                Some(text.clone())
                            }
                            _ => None,
                        },
                        _ => None,
                    },
                    _ => None,
                });
                ResolvedTokenRef {
                    rule_name: Some(name.clone()),
                    literal,
                }
            }
            ElementKind::Literal(text) => ResolvedTokenRef {
                rule_name: self
                    .token_alias_for_literal(text)
                    .map(|r| r.name.clone()),
                literal: Some(text.clone()),
            },
            _ => ResolvedTokenRef {
                rule_name: None,
                literal: None,
            },
        }
    }
}
