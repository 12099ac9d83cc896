//! AST code model: node classes, properties, and the AST-builder description.
//!
//! Node classes form an arena indexed by [`NodeClassId`]; properties refer to
//! other classes through ids rather than ownership, which is what lets
//! recursive and mutually-recursive rules resolve without placeholders.

mod builder;
pub mod naming;

#[cfg(test)]
mod builder_tests;

use crate::grammar::{LabelKind, ResolvedTokenRef};

pub use builder::build;

/// Handle into [`AstCodeModel::classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeClassId(pub(crate) u32);

impl NodeClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One generated node class. Abstract iff it has variants.
#[derive(Debug, Clone)]
pub struct NodeClass {
    pub name: String,
    /// The parser rule this class was derived from.
    pub rule_name: String,
    /// For variants of labeled alternatives: the `#label` text.
    pub alt_label: Option<String>,
    /// For variants: index of the source alternative within the rule.
    pub source_alt: Option<usize>,
    pub properties: Vec<Property>,
    /// Non-null iff this class is a variant.
    pub base: Option<NodeClassId>,
    /// Variant classes in grammar order.
    pub variants: Vec<NodeClassId>,
}

impl NodeClass {
    pub fn is_abstract(&self) -> bool {
        !self.variants.is_empty()
    }

    pub fn is_variant(&self) -> bool {
        self.base.is_some()
    }
}

/// How the emitted builder reaches the parse-tree child backing a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    /// Through an element label (`foo=ID` / `foos+=ID`).
    ByLabel { name: String, kind: LabelKind },
    /// Through a typed child getter. `index` is `None` when the position is
    /// statically unknown and the emitter must fall back to the list getter.
    ByGetter {
        target: GetterTarget,
        index: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetterTarget {
    Rule(String),
    Token(ResolvedTokenRef),
}

/// The five property shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// Text of a single token.
    TokenText { optional: bool },
    /// List of token texts.
    TokenTextList,
    /// Boolean presence of an optional keyword/literal.
    OptionalToken,
    /// Child AST node.
    NodeRef {
        class: NodeClassId,
        optional: bool,
    },
    /// List of child AST nodes.
    NodeRefList { class: NodeClassId },
}

impl PropertyKind {
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            PropertyKind::TokenTextList | PropertyKind::NodeRefList { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub source: MappingSource,
    pub kind: PropertyKind,
}

/// One visit-method of the generated AST builder: which parse-tree context it
/// handles and which node class it constructs.
#[derive(Debug, Clone)]
pub struct BuilderMapping {
    pub rule_name: String,
    /// ANTLR context class name (`StatContext`, `MultExprContext`).
    pub context_name: String,
    pub class: NodeClassId,
    /// For synthetic variants of unlabeled multi-alternative rules: the
    /// 1-based ANTLR alternative number the mapping applies to. Mappings
    /// sharing a context are dispatched on it.
    pub alt_number: Option<u32>,
}

/// Description of the generated visitor that turns parse trees into AST nodes.
#[derive(Debug, Clone)]
pub struct AstBuilderModel {
    pub name: String,
    pub grammar_name: String,
    pub parser_name: String,
    pub mappings: Vec<BuilderMapping>,
}

/// The complete derived model: class arena, root classes in rule order, and
/// the builder description.
#[derive(Debug, Clone)]
pub struct AstCodeModel {
    pub grammar_name: String,
    classes: Vec<NodeClass>,
    /// One entry per parser rule, in document order.
    pub roots: Vec<NodeClassId>,
    pub builder: AstBuilderModel,
}

impl AstCodeModel {
    pub fn class(&self, id: NodeClassId) -> &NodeClass {
        &self.classes[id.index()]
    }

    pub fn classes(&self) -> impl Iterator<Item = (NodeClassId, &NodeClass)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (NodeClassId(i as u32), c))
    }

    pub fn class_by_name(&self, name: &str) -> Option<&NodeClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
