//! Derives the AST code model from an analyzed grammar.
//!
//! One node class per parser rule, plus variant classes for labeled (or
//! synthetic) alternatives. Rule resolution is memoized: a rule's class id is
//! registered before its body is processed, so recursive and mutually
//! recursive references resolve to the id while the class is still being
//! filled.

use indexmap::IndexMap;

use crate::analyze::Analysis;
use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::grammar::{
    Alternative, ElementKind, Grammar, LabelKind, Rule, RuleKind, Suffix, SyntaxElement,
};
use crate::{Error, Result};

use super::naming::{WordExpander, boolean_name, looks_plural, pascal_name, pluralize};
use super::{
    AstBuilderModel, AstCodeModel, BuilderMapping, GetterTarget, MappingSource, NodeClass,
    NodeClassId, Property, PropertyKind,
};

/// Token-name endings whose text matters to downstream consumers. Everything
/// else is treated as a structural keyword and dropped.
const TEXT_IMPORTANT_SUFFIXES: &[&str] = &[
    "ID",
    "IDENT",
    "IDENTIFIER",
    "NAME",
    "LIT",
    "LITERAL",
    "VALUE",
    "CONST",
    "CONSTANT",
    "REF",
    "TYPE",
    "KIND",
    "MODIFIER",
    "ATTR",
    "ATTRIBUTE",
    "INT",
    "FLOAT",
    "NUMBER",
];

fn is_text_important(token_name: &str) -> bool {
    let upper = token_name.to_uppercase();
    TEXT_IMPORTANT_SUFFIXES.iter().any(|s| upper.ends_with(s))
}

/// Builds the AST code model for `grammar`, which must contain parser rules
/// and must have been analyzed.
pub fn build(
    grammar: &Grammar,
    analysis: &Analysis,
    config: &GeneratorConfig,
    diagnostics: &mut Diagnostics,
) -> Result<AstCodeModel> {
    if !grammar.has_parser_rules() {
        diagnostics
            .error(
                "grammar defines no parser rules; cannot derive an AST model",
                grammar.span,
            )
            .emit();
        return Err(Error::InvalidGrammar(
            "grammar defines no parser rules".into(),
        ));
    }

    let mut builder = ModelBuilder {
        grammar,
        analysis,
        config,
        diag: diagnostics,
        expander: WordExpander::from_config(&config.ast.automatic_abbreviation_expansion),
        classes: Vec::new(),
        memo: IndexMap::new(),
    };

    for rule in grammar.parser_rules() {
        builder.class_for_rule(&rule.name);
    }

    let mappings = builder.builder_mappings();
    let roots: Vec<NodeClassId> = grammar
        .parser_rules()
        .filter_map(|r| builder.memo.get(r.name.as_str()).copied())
        .collect();

    Ok(AstCodeModel {
        grammar_name: grammar.name.clone(),
        classes: builder.classes,
        roots,
        builder: AstBuilderModel {
            name: format!("{}AstBuilder", grammar.name),
            grammar_name: grammar.name.clone(),
            parser_name: format!("{}Parser", grammar.name),
            mappings,
        },
    })
}

struct ModelBuilder<'g, 'd> {
    grammar: &'g Grammar,
    analysis: &'g Analysis,
    config: &'g GeneratorConfig,
    diag: &'d mut Diagnostics,
    expander: WordExpander,
    classes: Vec<NodeClass>,
    /// rule name → class id; an entry exists from the moment the class is
    /// allocated, before its body is processed.
    memo: IndexMap<String, NodeClassId>,
}

/// Property under construction, before duplicate resolution.
struct Draft {
    name: String,
    source: MappingSource,
    kind: PropertyKind,
}

impl<'g> ModelBuilder<'g, '_> {
    fn class_for_rule(&mut self, name: &str) -> Option<NodeClassId> {
        if let Some(&id) = self.memo.get(name) {
            return Some(id);
        }
        let grammar = self.grammar;
        let rule = grammar.rule(name).filter(|r| r.kind == RuleKind::Parser)?;

        let id = self.alloc(NodeClass {
            name: self.class_name(&rule.name),
            rule_name: rule.name.clone(),
            alt_label: None,
            source_alt: None,
            properties: Vec::new(),
            base: None,
            variants: Vec::new(),
        });
        self.memo.insert(name.to_string(), id);
        self.fill_class(id, rule);
        Some(id)
    }

    fn fill_class(&mut self, id: NodeClassId, rule: &'g Rule) {
        if rule.has_mixed_labels() {
            self.diag
                .error(
                    format!(
                        "rule `{}` mixes labeled and unlabeled alternatives",
                        rule.name
                    ),
                    rule.span,
                )
                .emit();
            return;
        }

        if rule.all_alternatives_labeled() {
            let mut variant_ids = Vec::with_capacity(rule.body.alternatives.len());
            for (i, alt) in rule.body.alternatives.iter().enumerate() {
                let label = alt.label.as_ref().expect("checked above").name.clone();
                let vid = self.variant_for_labeled_alt(id, rule, i, alt, &label);
                variant_ids.push(vid);
            }
            self.classes[id.index()].variants = variant_ids;
        } else if rule.body.alternatives.len() == 1 {
            let properties = self.derive_properties(&rule.body.alternatives[0]);
            self.classes[id.index()].properties = properties;
        } else {
            // Unlabeled multi-alternative rule: abstract base with
            // synthetic-named variants, one per alternative.
            let plain = pascal_name(&rule.name, &self.expander);
            let mut variant_ids = Vec::with_capacity(rule.body.alternatives.len());
            for (i, alt) in rule.body.alternatives.iter().enumerate() {
                let properties = self.derive_properties(alt);
                let vid = self.alloc(NodeClass {
                    name: self.affixed(&format!("{}_{}", plain, i + 1)),
                    rule_name: rule.name.clone(),
                    alt_label: None,
                    source_alt: Some(i),
                    properties,
                    base: Some(id),
                    variants: Vec::new(),
                });
                variant_ids.push(vid);
            }
            self.classes[id.index()].variants = variant_ids;
        }
    }

    /// A labeled alternative that wraps a single plain rule reference is
    /// transparent: the referenced rule's class itself becomes the variant,
    /// producing nested hierarchies instead of wrapper classes.
    fn variant_for_labeled_alt(
        &mut self,
        base: NodeClassId,
        rule: &'g Rule,
        alt_index: usize,
        alt: &'g Alternative,
        label: &str,
    ) -> NodeClassId {
        if let [only] = alt.elements.as_slice()
            && let ElementKind::RuleRef(target) = &only.kind
            && only.suffix == Suffix::None
            && only.label.is_none()
            && !only.not
            && let Some(vid) = self.class_for_rule(target)
            && vid != base
            && self.classes[vid.index()].base.is_none()
        {
            self.classes[vid.index()].base = Some(base);
            return vid;
        }

        let properties = self.derive_properties(alt);
        self.alloc(NodeClass {
            name: self.class_name(label),
            rule_name: rule.name.clone(),
            alt_label: Some(label.to_string()),
            source_alt: Some(alt_index),
            properties,
            base: Some(base),
            variants: Vec::new(),
        })
    }

    // --- property derivation ------------------------------------------------

    fn derive_properties(&mut self, alt: &'g Alternative) -> Vec<Property> {
        let mut drafts = Vec::new();
        self.walk_elements(&alt.elements, false, false, &mut drafts);
        resolve_duplicates(drafts)
    }

    fn walk_elements(
        &mut self,
        elements: &'g [SyntaxElement],
        ctx_optional: bool,
        ctx_repeated: bool,
        drafts: &mut Vec<Draft>,
    ) {
        let mut i = 0;
        while i < elements.len() {
            // Delimited-list sugar: `X (delim X)*` collapses into one
            // repeated X, so comma-separated lists surface as a single
            // list-valued property.
            if let Some(head) = delimited_list_head(elements, i) {
                self.atom_property(head, ctx_optional, true, drafts);
                i += 2;
                continue;
            }

            let element = &elements[i];
            match &element.kind {
                ElementKind::RuleRef(_)
                | ElementKind::TokenRef(_)
                | ElementKind::Literal(_) => {
                    self.atom_property(element, ctx_optional, ctx_repeated, drafts);
                }
                ElementKind::Block(list) => {
                    let optional = ctx_optional
                        || element.suffix.is_optional()
                        || list.alternatives.len() >= 2;
                    let repeated = ctx_repeated || element.suffix.is_repeated();
                    for alt in &list.alternatives {
                        self.walk_elements(&alt.elements, optional, repeated, drafts);
                    }
                }
                ElementKind::Dot | ElementKind::CharSet { .. } | ElementKind::Empty => {}
            }
            i += 1;
        }
    }

    fn atom_property(
        &mut self,
        element: &'g SyntaxElement,
        ctx_optional: bool,
        forced_list: bool,
        drafts: &mut Vec<Draft>,
    ) {
        let label = element.label.clone();
        let labeled = label.is_some();
        let is_list = forced_list
            || element.suffix.is_repeated()
            || label.as_ref().is_some_and(|l| l.kind == LabelKind::PlusAssign);
        let optional = ctx_optional || element.suffix.is_optional();

        match &element.kind {
            ElementKind::RuleRef(name) => {
                let Some(class) = self.class_for_rule(name) else {
                    self.diag
                        .error(format!("reference to unknown rule `{name}`"), element.span)
                        .emit();
                    return;
                };
                let kind = if is_list {
                    PropertyKind::NodeRefList { class }
                } else {
                    PropertyKind::NodeRef { class, optional }
                };
                let seed = label
                    .as_ref()
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| name.clone());
                let source = self.mapping_source(element, is_list, || {
                    GetterTarget::Rule(name.clone())
                });
                drafts.push(self.named_draft(seed, labeled, is_list, false, source, kind));
            }
            ElementKind::TokenRef(name) => {
                if name == "EOF" {
                    return;
                }
                self.check_known_token(name, element);
                let boolean = optional && labeled && !is_list;
                let kind = if boolean {
                    PropertyKind::OptionalToken
                } else if labeled || is_text_important(name) {
                    if is_list {
                        PropertyKind::TokenTextList
                    } else {
                        PropertyKind::TokenText { optional }
                    }
                } else {
                    return; // structural keyword
                };
                let seed = label
                    .as_ref()
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| name.clone());
                let grammar = self.grammar;
                let source = self.mapping_source(element, is_list, || {
                    GetterTarget::Token(grammar.resolve_token(element))
                });
                drafts.push(self.named_draft(seed, labeled, is_list, boolean, source, kind));
            }
            ElementKind::Literal(_) => {
                // An unlabeled literal is structural and dropped.
                let Some(label) = label else { return };
                let boolean = optional && !is_list;
                let kind = if boolean {
                    PropertyKind::OptionalToken
                } else if is_list {
                    PropertyKind::TokenTextList
                } else {
                    PropertyKind::TokenText { optional }
                };
                let grammar = self.grammar;
                let source = self.mapping_source(element, is_list, || {
                    GetterTarget::Token(grammar.resolve_token(element))
                });
                drafts.push(self.named_draft(label.name, true, is_list, boolean, source, kind));
            }
            _ => unreachable!("atom_property called on non-atom"),
        }
    }

    fn mapping_source(
        &self,
        element: &SyntaxElement,
        is_list: bool,
        target: impl FnOnce() -> GetterTarget,
    ) -> MappingSource {
        if let Some(label) = &element.label {
            return MappingSource::ByLabel {
                name: label.name.clone(),
                kind: label.kind,
            };
        }
        let index = if is_list {
            None
        } else {
            self.analysis.index_by_type(element.id)
        };
        MappingSource::ByGetter {
            target: target(),
            index,
        }
    }

    fn named_draft(
        &self,
        seed: String,
        labeled: bool,
        is_list: bool,
        boolean: bool,
        source: MappingSource,
        kind: PropertyKind,
    ) -> Draft {
        let mut name = pascal_name(&seed, &self.expander);
        if boolean {
            name = boolean_name(&name);
        } else if is_list {
            if looks_plural(&name) {
                if !labeled {
                    name.push_str("List");
                }
            } else {
                name = pluralize(&name);
            }
        }
        Draft { name, source, kind }
    }

    fn check_known_token(&mut self, name: &str, element: &SyntaxElement) {
        let known = self
            .grammar
            .rule(name)
            .is_some_and(|r| r.kind == RuleKind::Lexer)
            || self.grammar.token_decls.iter().any(|t| t == name);
        if !known {
            self.diag
                .warning(
                    format!("implicit definition of token `{name}`"),
                    element.span,
                )
                .emit();
        }
    }

    // --- builder model ------------------------------------------------------

    fn builder_mappings(&self) -> Vec<BuilderMapping> {
        let mut mappings = Vec::new();
        for rule in self.grammar.parser_rules() {
            let Some(&id) = self.memo.get(rule.name.as_str()) else {
                continue;
            };
            if rule.has_mixed_labels() {
                continue;
            }
            let class = &self.classes[id.index()];
            if class.variants.is_empty() {
                mappings.push(BuilderMapping {
                    rule_name: rule.name.clone(),
                    context_name: context_name(&rule.name),
                    class: id,
                    alt_number: None,
                });
                continue;
            }
            let labeled = rule.all_alternatives_labeled();
            for (i, &vid) in class.variants.iter().enumerate() {
                let context = if labeled {
                    context_name(&rule.body.alternatives[i].label.as_ref().expect("labeled").name)
                } else {
                    context_name(&rule.name)
                };
                mappings.push(BuilderMapping {
                    rule_name: rule.name.clone(),
                    context_name: context,
                    class: vid,
                    alt_number: (!labeled).then_some(i as u32 + 1),
                });
            }
        }
        mappings
    }

    // --- helpers ------------------------------------------------------------

    fn alloc(&mut self, class: NodeClass) -> NodeClassId {
        let id = NodeClassId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    fn class_name(&self, raw: &str) -> String {
        self.affixed(&pascal_name(raw, &self.expander))
    }

    fn affixed(&self, name: &str) -> String {
        let naming = &self.config.ast.node_class_naming;
        format!("{}{}{}", naming.prefix, name, naming.suffix)
    }
}

/// ANTLR context class name for a rule or labeled alternative.
fn context_name(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => format!(
            "{}{}Context",
            first.to_uppercase(),
            chars.as_str()
        ),
        None => "Context".to_string(),
    }
}

/// Recognizes `X (delim X)*` / `X (delim X)+` starting at `i`; returns the
/// head element when the pattern applies.
fn delimited_list_head(elements: &[SyntaxElement], i: usize) -> Option<&SyntaxElement> {
    let head = elements.get(i)?;
    if !matches!(
        head.kind,
        ElementKind::RuleRef(_) | ElementKind::TokenRef(_)
    ) {
        return None;
    }

    let block = elements.get(i + 1)?;
    if !block.suffix.is_repeated() || block.label.is_some() || block.not {
        return None;
    }
    let ElementKind::Block(list) = &block.kind else {
        return None;
    };
    let [alt] = list.alternatives.as_slice() else {
        return None;
    };
    let [delim, tail] = alt.elements.as_slice() else {
        return None;
    };

    let delim_ok = delim.suffix == Suffix::None
        && !delim.not
        && delim.label.is_none()
        && match &delim.kind {
            ElementKind::Literal(_) => true,
            ElementKind::TokenRef(name) => !is_text_important(name),
            _ => false,
        };
    if !delim_ok {
        return None;
    }

    tail.structurally_eq(head).then_some(head)
}

/// Renames or merges duplicate property names: identical `ByLabel` sources
/// collapse into one property, a pair becomes `Left`/`Right`, larger groups
/// get numbered.
fn resolve_duplicates(drafts: Vec<Draft>) -> Vec<Property> {
    let mut drafts: Vec<Option<Draft>> = drafts.into_iter().map(Some).collect();

    for round in 0..2 {
        let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (i, draft) in drafts.iter().enumerate() {
            if let Some(d) = draft {
                groups.entry(d.name.clone()).or_default().push(i);
            }
        }

        for (name, members) in groups {
            if members.len() < 2 {
                continue;
            }

            let same_label = members.iter().all(|&i| {
                let source = &drafts[i].as_ref().expect("live draft").source;
                matches!(source, MappingSource::ByLabel { .. })
                    && *source == drafts[members[0]].as_ref().expect("live draft").source
            });
            if same_label {
                // `x+=A ... x+=A`: one list property feeds from every site.
                for &i in &members[1..] {
                    drafts[i] = None;
                }
                continue;
            }

            if members.len() == 2 && round == 0 {
                let second = members[1];
                drafts[members[0]].as_mut().expect("live draft").name = format!("Left{name}");
                drafts[second].as_mut().expect("live draft").name = format!("Right{name}");
            } else {
                for (n, &i) in members.iter().enumerate() {
                    drafts[i].as_mut().expect("live draft").name = format!("{}{}", name, n + 1);
                }
            }
        }
    }

    drafts
        .into_iter()
        .flatten()
        .map(|d| Property {
            name: d.name,
            source: d.source,
            kind: d.kind,
        })
        .collect()
}
