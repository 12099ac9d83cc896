//! Generation configuration.
//!
//! Deserialized from an `astmate.json` file next to the grammar (or provided
//! programmatically). Every section is optional; defaults produce a usable
//! generation run.

use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub ast: AstConfig,
    #[serde(default)]
    pub syntax_highlighting: SyntaxHighlightingConfig,
}

impl GeneratorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AstConfig {
    #[serde(default)]
    pub node_class_naming: NodeClassNaming,
    #[serde(default)]
    pub automatic_abbreviation_expansion: AbbreviationExpansionConfig,
}

/// Affixes concatenated around every generated class name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeClassNaming {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AbbreviationExpansionConfig {
    /// Enables the built-in abbreviation dictionary.
    #[serde(default = "default_true")]
    pub use_default_word_expansions: bool,
    /// Extra expansions merged after the defaults. Keys are pipe-separated
    /// abbreviation alternates (`"fn|fun|func"`), values the full word.
    #[serde(default)]
    pub custom_word_expansions: IndexMap<String, String>,
}

impl Default for AbbreviationExpansionConfig {
    fn default() -> Self {
        Self {
            use_default_word_expansions: true,
            custom_word_expansions: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SyntaxHighlightingConfig {
    /// Per-rule overrides, keyed by rule name or by an implicit literal's
    /// quoted text (e.g. `"'import'"`).
    #[serde(default)]
    pub rule_settings: IndexMap<String, RuleSettings>,
    /// Groups of rules whose longest-match ordering needs explicit
    /// reordering or merging; rules listed first win.
    #[serde(default)]
    pub rule_conflicts: Vec<RuleConflict>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSettings {
    pub text_mate_scope_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleConflict {
    pub rules: Vec<String>,
}

fn default_true() -> bool {
    true
}
