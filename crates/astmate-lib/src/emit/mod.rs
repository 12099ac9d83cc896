//! Rendering the AST model to host-language source text.
//!
//! [`ModelEmitter`] is the seam between the core and a host language: one
//! visit method per model kind and per property shape. Dispatch over property
//! shapes is pattern-matched in [`emit_property`], so an emitter only deals
//! with concrete cases.

mod writer;

pub mod typescript;


pub use typescript::TypeScriptEmitter;
pub use writer::{Chunk, IndentedWriter};

use crate::model::{AstCodeModel, NodeClass, Property, PropertyKind};

/// Visitor interface over the AST code model. Host-language concerns —
/// identifier escaping, nullability notation, module headers — live entirely
/// in implementations.
pub trait ModelEmitter {
    fn visit_ast_code_model(&mut self, model: &AstCodeModel);
    fn visit_node_class(&mut self, model: &AstCodeModel, class: &NodeClass);
    fn visit_node_ref_property(&mut self, model: &AstCodeModel, class: &NodeClass, property: &Property);
    fn visit_node_ref_list_property(
        &mut self,
        model: &AstCodeModel,
        class: &NodeClass,
        property: &Property,
    );
    fn visit_token_text_property(
        &mut self,
        model: &AstCodeModel,
        class: &NodeClass,
        property: &Property,
    );
    fn visit_token_text_list_property(
        &mut self,
        model: &AstCodeModel,
        class: &NodeClass,
        property: &Property,
    );
    fn visit_optional_token_property(
        &mut self,
        model: &AstCodeModel,
        class: &NodeClass,
        property: &Property,
    );
    fn visit_ast_builder(&mut self, model: &AstCodeModel);
}

/// Dispatches one property to the shape-specific visit method.
pub fn emit_property(
    emitter: &mut dyn ModelEmitter,
    model: &AstCodeModel,
    class: &NodeClass,
    property: &Property,
) {
    match property.kind {
        PropertyKind::TokenText { .. } => emitter.visit_token_text_property(model, class, property),
        PropertyKind::TokenTextList => {
            emitter.visit_token_text_list_property(model, class, property)
        }
        PropertyKind::OptionalToken => {
            emitter.visit_optional_token_property(model, class, property)
        }
        PropertyKind::NodeRef { .. } => emitter.visit_node_ref_property(model, class, property),
        PropertyKind::NodeRefList { .. } => {
            emitter.visit_node_ref_list_property(model, class, property)
        }
    }
}
