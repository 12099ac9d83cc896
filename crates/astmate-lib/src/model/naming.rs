//! Identifier naming: word splitting, abbreviation expansion, pluralization.
//!
//! Grammar authors write `fnDef`, `importStmt`, `STR_LIT`; generated code
//! wants `FunctionDefinition`, `ImportStatement`, `StringLiteral`. Names are
//! split into words (camel humps, underscores), each word is expanded through
//! the abbreviation dictionary with its original capitalization preserved,
//! and the result is joined in PascalCase.

use indexmap::IndexMap;

use crate::config::AbbreviationExpansionConfig;

/// Seeded abbreviation table covering common grammar-writing vocabulary.
/// Each entry is (`pipe-separated alternates`, `expansion`).
const DEFAULT_EXPANSIONS: &[(&str, &str)] = &[
    ("alt", "alternative"),
    ("arg", "argument"),
    ("assign", "assignment"),
    ("attr", "attribute"),
    ("bool", "boolean"),
    ("char", "character"),
    ("cmd", "command"),
    ("cond", "condition"),
    ("const", "constant"),
    ("ctx", "context"),
    ("decl", "declaration"),
    ("def|defn", "definition"),
    ("elem|elt", "element"),
    ("expr", "expression"),
    ("fn|fun|func", "function"),
    ("id|ident", "identifier"),
    ("idx", "index"),
    ("init", "initializer"),
    ("int", "integer"),
    ("kw", "keyword"),
    ("lit", "literal"),
    ("mult|mul", "multiply"),
    ("num", "number"),
    ("obj", "object"),
    ("op", "operator"),
    ("param", "parameter"),
    ("pkg", "package"),
    ("prop", "property"),
    ("qual", "qualifier"),
    ("ref", "reference"),
    ("sep", "separator"),
    ("seq", "sequence"),
    ("stat|stmt", "statement"),
    ("str", "string"),
    ("val", "value"),
    ("var", "variable"),
];

/// Case-preserving word expander backed by an abbreviation dictionary.
#[derive(Debug, Clone)]
pub struct WordExpander {
    table: IndexMap<String, String>,
}

impl WordExpander {
    pub fn empty() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut expander = Self::empty();
        for (pattern, word) in DEFAULT_EXPANSIONS {
            expander.add(pattern, word);
        }
        expander
    }

    pub fn from_config(config: &AbbreviationExpansionConfig) -> Self {
        let mut expander = if config.use_default_word_expansions {
            Self::with_defaults()
        } else {
            Self::empty()
        };
        for (pattern, word) in &config.custom_word_expansions {
            expander.add(pattern, word);
        }
        expander
    }

    /// Registers every pipe-separated alternate of `pattern`. Later additions
    /// override earlier ones, so custom entries win over defaults.
    pub fn add(&mut self, pattern: &str, word: &str) {
        for alternate in pattern.split('|') {
            let alternate = alternate.trim();
            if !alternate.is_empty() {
                self.table
                    .insert(alternate.to_lowercase(), word.to_lowercase());
            }
        }
    }

    /// Expands a single word, preserving its original capitalization. A
    /// plural abbreviation expands through its stem and is re-pluralized
    /// (`exprs` → `expressions`).
    pub fn expand_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if let Some(expanded) = self.table.get(&lower) {
            return match_case(word, expanded);
        }
        if let Some(stem) = lower.strip_suffix('s')
            && !stem.is_empty()
            && let Some(expanded) = self.table.get(stem)
        {
            return match_case(word, &pluralize(expanded));
        }
        word.to_string()
    }
}

/// Applies the original word's leading capitalization to its expansion.
fn match_case(original: &str, expansion: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        capitalize(expansion)
    } else {
        expansion.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Splits an identifier into words: underscores separate, camel humps
/// separate, and acronym runs break before their last capital (`ASTNode` →
/// `AST`, `Node`).
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in name.split('_').filter(|c| !c.is_empty()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let prev = chars[i - 1];
            let here = chars[i];
            let next = chars.get(i + 1);

            let lower_to_upper = !prev.is_uppercase() && here.is_uppercase();
            let acronym_end = prev.is_uppercase()
                && here.is_uppercase()
                && next.is_some_and(|c| c.is_lowercase());

            if lower_to_upper || acronym_end {
                words.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        words.push(chars[start..].iter().collect());
    }
    words
}

/// Converts a raw grammar name to an expanded PascalCase identifier.
/// Leading/trailing underscores (used to dodge host keywords) are trimmed.
pub fn pascal_name(raw: &str, expander: &WordExpander) -> String {
    let trimmed = raw.trim_matches('_');
    split_words(trimmed)
        .iter()
        .map(|word| {
            let expanded = expander.expand_word(word);
            pascal_word(&expanded)
        })
        .collect()
}

/// Normalizes one (possibly expanded) word for PascalCase joining: first
/// letter upper, rest lower.
fn pascal_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Naive English pluralization, good enough for identifier vocabulary.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix('y')
        && !stem.is_empty()
        && !stem.ends_with(|c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
    {
        return format!("{stem}ies");
    }
    format!("{word}s")
}

/// Heuristic: a PascalCase name that already reads as plural (`Functions`),
/// where re-pluralizing would stutter.
pub fn looks_plural(name: &str) -> bool {
    name.ends_with('s') && !name.ends_with("ss")
}

/// Prefixes suitable for boolean-valued property names.
const BOOLEAN_PREFIXES: &[&str] = &["Is", "Has", "Can", "Does", "Should", "Was", "Will"];

/// Ensures a boolean property name reads as a predicate (`Public` →
/// `IsPublic`; `HasBody` stays).
pub fn boolean_name(name: &str) -> String {
    let already = BOOLEAN_PREFIXES.iter().any(|p| {
        name.strip_prefix(p)
            .is_some_and(|rest| rest.chars().next().is_none_or(|c| c.is_uppercase()))
    });
    if already {
        name.to_string()
    } else {
        format!("Is{name}")
    }
}

#[cfg(test)]
mod naming_tests {
    use super::*;

    fn expand(name: &str) -> String {
        pascal_name(name, &WordExpander::with_defaults())
    }

    #[test]
    fn splits_camel_and_snake() {
        assert_eq!(split_words("importStmt"), vec!["import", "Stmt"]);
        assert_eq!(split_words("STR_LIT"), vec!["STR", "LIT"]);
        assert_eq!(split_words("ASTNode"), vec!["AST", "Node"]);
        assert_eq!(split_words("simple"), vec!["simple"]);
    }

    #[test]
    fn expands_common_abbreviations() {
        assert_eq!(expand("stat"), "Statement");
        assert_eq!(expand("fnDef"), "FunctionDefinition");
        assert_eq!(expand("importStmt"), "ImportStatement");
        assert_eq!(expand("ID"), "Identifier");
        assert_eq!(expand("STR_LIT"), "StringLiteral");
        assert_eq!(expand("atomicExpr"), "AtomicExpression");
        assert_eq!(expand("varRefExpr"), "VariableReferenceExpression");
        assert_eq!(expand("numericLiteralExpr"), "NumericLiteralExpression");
    }

    #[test]
    fn unknown_words_pass_through() {
        assert_eq!(expand("widget"), "Widget");
        assert_eq!(expand("XML_THING"), "XmlThing");
    }

    #[test]
    fn plural_abbreviations_re_pluralize() {
        let expander = WordExpander::with_defaults();
        assert_eq!(expander.expand_word("exprs"), "expressions");
        assert_eq!(expander.expand_word("ids"), "identifiers");
        assert_eq!(expander.expand_word("Args"), "Arguments");
    }

    #[test]
    fn case_is_preserved_per_word() {
        let expander = WordExpander::with_defaults();
        assert_eq!(expander.expand_word("expr"), "expression");
        assert_eq!(expander.expand_word("Expr"), "Expression");
        assert_eq!(expander.expand_word("EXPR"), "Expression");
    }

    #[test]
    fn leading_and_trailing_underscores_trimmed() {
        assert_eq!(expand("_type_"), "Type");
        assert_eq!(expand("__expr"), "Expression");
    }

    #[test]
    fn custom_expansions_override_defaults() {
        let mut expander = WordExpander::with_defaults();
        expander.add("stat", "status");
        assert_eq!(pascal_name("stat", &expander), "Status");
    }

    #[test]
    fn pluralization_rules() {
        assert_eq!(pluralize("Identifier"), "Identifiers");
        assert_eq!(pluralize("Class"), "Classes");
        assert_eq!(pluralize("Body"), "Bodies");
        assert_eq!(pluralize("Key"), "Keys");
        assert_eq!(pluralize("Box"), "Boxes");
    }

    #[test]
    fn plural_detection() {
        assert!(looks_plural("Functions"));
        assert!(!looks_plural("Class"));
        assert!(!looks_plural("Function"));
    }

    #[test]
    fn boolean_prefixing() {
        assert_eq!(boolean_name("Public"), "IsPublic");
        assert_eq!(boolean_name("IsPublic"), "IsPublic");
        assert_eq!(boolean_name("HasBody"), "HasBody");
        assert_eq!(boolean_name("Island"), "IsIsland");
    }
}
