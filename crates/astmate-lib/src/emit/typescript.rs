//! TypeScript emitter for the AST code model.
//!
//! Renders node classes as discriminated interfaces (abstract classes become
//! union types) and the AST builder as a visitor class that extracts each
//! property through its mapping source.

use crate::model::{
    AstCodeModel, BuilderMapping, GetterTarget, MappingSource, NodeClass, Property, PropertyKind,
};

use super::writer::IndentedWriter;
use super::{ModelEmitter, emit_property};

/// Configuration for TypeScript emission.
#[derive(Clone, Debug)]
pub struct Config {
    /// Whether to `export` generated declarations.
    pub export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { export: true }
    }
}

pub struct TypeScriptEmitter {
    writer: IndentedWriter,
    config: Config,
}

/// Emit TypeScript with default configuration.
pub fn emit(model: &AstCodeModel) -> String {
    TypeScriptEmitter::new(Config::default()).render(model)
}

impl TypeScriptEmitter {
    pub fn new(config: Config) -> Self {
        Self {
            writer: IndentedWriter::new(),
            config,
        }
    }

    pub fn render(mut self, model: &AstCodeModel) -> String {
        self.visit_ast_code_model(model);
        let output = self.writer.finish();
        let mut normalized = output.trim_end().to_string();
        normalized.push('\n');
        normalized
    }

    fn export_prefix(&self) -> &'static str {
        if self.config.export { "export " } else { "" }
    }

    fn property_type(&self, model: &AstCodeModel, property: &Property) -> String {
        match &property.kind {
            PropertyKind::TokenText { optional: false } => "string".into(),
            PropertyKind::TokenText { optional: true } => "string | null".into(),
            PropertyKind::TokenTextList => "string[]".into(),
            PropertyKind::OptionalToken => "boolean".into(),
            PropertyKind::NodeRef { class, optional } => {
                let name = &model.class(*class).name;
                if *optional {
                    format!("{name} | null")
                } else {
                    name.clone()
                }
            }
            PropertyKind::NodeRefList { class } => format!("{}[]", model.class(*class).name),
        }
    }

    fn write_property_line(&mut self, model: &AstCodeModel, property: &Property) {
        let ts_type = self.property_type(model, property);
        self.writer
            .write_line(&format!("{}: {};", camel(&property.name), ts_type));
    }

    // --- builder rendering --------------------------------------------------

    fn write_builder_class(&mut self, model: &AstCodeModel) {
        let builder = &model.builder;
        self.writer.write_line(&format!(
            "{}class {} extends {}Visitor<AstNode> {{",
            self.export_prefix(),
            builder.name,
            builder.parser_name,
        ));
        self.writer.indent();

        let groups = group_mappings(&builder.mappings);
        for (i, group) in groups.iter().enumerate() {
            if i > 0 {
                self.writer.write_line("");
            }
            self.write_visit_method(model, group);
        }

        self.writer.write_line("");
        self.write_token_helpers();

        self.writer.unindent();
        self.writer.write_line("}");
    }

    fn write_visit_method(&mut self, model: &AstCodeModel, group: &[&BuilderMapping]) {
        let first = group[0];
        let method = format!("visit{}", first.context_name.trim_end_matches("Context"));
        let return_type = method_return_type(model, group);

        if group.len() == 1 && first.alt_number.is_none() {
            let class = model.class(first.class);
            if class.is_abstract() {
                // Transparent alternative: delegate to the wrapped rule.
                self.writer.write_line(&format!(
                    "{method} = (ctx: {}): {return_type} =>",
                    first.context_name
                ));
                self.writer.indent();
                self.writer.write_line(&format!(
                    "this.visit(ctx.{}()) as {};",
                    class.rule_name, class.name
                ));
                self.writer.unindent();
                return;
            }

            self.writer.write_line(&format!(
                "{method} = (ctx: {}): {return_type} => ({{",
                first.context_name
            ));
            self.writer.indent();
            self.write_node_literal_body(model, class);
            self.writer.unindent();
            self.writer.write_line("});");
            return;
        }

        // Synthetic variants share one context; dispatch on the alternative
        // number the parser recorded.
        self.writer.write_line(&format!(
            "{method} = (ctx: {}): {return_type} => {{",
            first.context_name
        ));
        self.writer.indent();
        self.writer.write_line("switch (ctx.getAltNumber()) {");
        self.writer.indent();
        for mapping in group {
            let class = model.class(mapping.class);
            self.writer.write_line(&format!(
                "case {}:",
                mapping.alt_number.expect("grouped mappings are numbered")
            ));
            self.writer.indent();
            self.writer.write_line("return {");
            self.writer.indent();
            self.write_node_literal_body(model, class);
            self.writer.unindent();
            self.writer.write_line("};");
            self.writer.unindent();
        }
        self.writer.write_line("default:");
        self.writer.indent();
        self.writer.write_line(&format!(
            "throw new Error(\"unexpected alternative in {}\");",
            first.context_name
        ));
        self.writer.unindent();
        self.writer.unindent();
        self.writer.write_line("}");
        self.writer.unindent();
        self.writer.write_line("};");
    }

    fn write_node_literal_body(&mut self, model: &AstCodeModel, class: &NodeClass) {
        self.writer
            .write_line(&format!("kind: \"{}\",", class.name));
        for property in &class.properties {
            let expr = self.property_expr(model, property);
            self.writer
                .write_line(&format!("{}: {},", camel(&property.name), expr));
        }
    }

    /// The extraction expression for one property, per its mapping source.
    fn property_expr(&self, model: &AstCodeModel, property: &Property) -> String {
        match &property.source {
            MappingSource::ByLabel { name, .. } => self.label_expr(model, property, name),
            MappingSource::ByGetter { target, index } => {
                self.getter_expr(model, property, target, *index)
            }
        }
    }

    fn label_expr(&self, model: &AstCodeModel, property: &Property, label: &str) -> String {
        let access = format!("ctx._{label}");
        match &property.kind {
            PropertyKind::TokenText { optional: false } => format!("{access}.text"),
            PropertyKind::TokenText { optional: true } => {
                format!("{access}?.text ?? null")
            }
            PropertyKind::TokenTextList => format!("{access}.map((t) => t.text)"),
            PropertyKind::OptionalToken => format!("{access} !== undefined"),
            PropertyKind::NodeRef { class, optional } => {
                let name = &model.class(*class).name;
                if *optional {
                    format!("{access} !== undefined ? (this.visit({access}) as {name}) : null")
                } else {
                    format!("this.visit({access}) as {name}")
                }
            }
            PropertyKind::NodeRefList { class } => {
                let name = &model.class(*class).name;
                format!("{access}.map((c) => this.visit(c) as {name})")
            }
        }
    }

    fn getter_expr(
        &self,
        model: &AstCodeModel,
        property: &Property,
        target: &GetterTarget,
        index: Option<u32>,
    ) -> String {
        match target {
            GetterTarget::Rule(rule) => {
                // An unknown index falls back to the first child of the type.
                let i = index.unwrap_or(0);
                match &property.kind {
                    PropertyKind::NodeRef { class, optional } => {
                        let name = &model.class(*class).name;
                        if *optional {
                            format!(
                                "ctx.{rule}({i}) !== undefined ? (this.visit(ctx.{rule}({i})) as {name}) : null"
                            )
                        } else {
                            format!("this.visit(ctx.{rule}({i})) as {name}")
                        }
                    }
                    PropertyKind::NodeRefList { class } => {
                        let name = &model.class(*class).name;
                        format!("ctx.{rule}().map((c) => this.visit(c) as {name})")
                    }
                    _ => format!("ctx.{rule}({i}).getText()"),
                }
            }
            GetterTarget::Token(resolved) => match resolved.accessor_name() {
                Some(token) => {
                    let i = index.unwrap_or(0);
                    match &property.kind {
                        PropertyKind::TokenText { optional: false } => {
                            format!("ctx.{token}({i}).getText()")
                        }
                        PropertyKind::TokenText { optional: true } => {
                            format!("ctx.{token}({i})?.getText() ?? null")
                        }
                        PropertyKind::TokenTextList => {
                            format!("ctx.{token}().map((t) => t.getText())")
                        }
                        PropertyKind::OptionalToken => {
                            format!("ctx.{token}({i}) !== undefined")
                        }
                        _ => format!("ctx.{token}({i}).getText()"),
                    }
                }
                None => {
                    // Implicit literal with no named token: scan children.
                    let literal = resolved.literal.as_deref().unwrap_or("");
                    let quoted = serde_json::to_string(literal).expect("string serializes");
                    match &property.kind {
                        PropertyKind::OptionalToken => format!("this.hasLiteral(ctx, {quoted})"),
                        PropertyKind::TokenTextList => {
                            format!("this.literalTexts(ctx, {quoted})")
                        }
                        _ => format!("this.literalText(ctx, {quoted})"),
                    }
                }
            },
        }
    }

    fn write_token_helpers(&mut self) {
        self.writer.write_line(
            "protected hasLiteral(ctx: { getChildCount(): number; getChild(i: number): { getText(): string } }, text: string): boolean {",
        );
        self.writer.indent();
        self.writer
            .write_line("return this.literalTexts(ctx, text).length > 0;");
        self.writer.unindent();
        self.writer.write_line("}");
        self.writer.write_line("");

        self.writer.write_line(
            "protected literalText(ctx: { getChildCount(): number; getChild(i: number): { getText(): string } }, text: string): string {",
        );
        self.writer.indent();
        self.writer
            .write_line("return this.literalTexts(ctx, text)[0] ?? \"\";");
        self.writer.unindent();
        self.writer.write_line("}");
        self.writer.write_line("");

        self.writer.write_line(
            "protected literalTexts(ctx: { getChildCount(): number; getChild(i: number): { getText(): string } }, text: string): string[] {",
        );
        self.writer.indent();
        self.writer.write_line("const found: string[] = [];");
        self.writer
            .write_line("for (let i = 0; i < ctx.getChildCount(); i++) {");
        self.writer.indent();
        self.writer.write_line("const child = ctx.getChild(i);");
        self.writer
            .write_line("if (child.getText() === text) found.push(text);");
        self.writer.unindent();
        self.writer.write_line("}");
        self.writer.write_line("return found;");
        self.writer.unindent();
        self.writer.write_line("}");
    }
}

impl ModelEmitter for TypeScriptEmitter {
    fn visit_ast_code_model(&mut self, model: &AstCodeModel) {
        self.writer.write_line(&format!(
            "// Generated from {}.g4. Do not edit.",
            model.grammar_name
        ));
        self.writer.write_line("");
        self.writer.write_line(&format!(
            "{}interface AstNode {{",
            self.export_prefix()
        ));
        self.writer.indent();
        self.writer.write_line("kind: string;");
        self.writer.unindent();
        self.writer.write_line("}");

        for (_, class) in model.classes() {
            self.writer.write_line("");
            self.visit_node_class(model, class);
        }

        self.writer.write_line("");
        self.visit_ast_builder(model);
    }

    fn visit_node_class(&mut self, model: &AstCodeModel, class: &NodeClass) {
        if class.is_abstract() {
            let union = class
                .variants
                .iter()
                .map(|&v| model.class(v).name.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            self.writer.write_line(&format!(
                "{}type {} = {};",
                self.export_prefix(),
                class.name,
                union
            ));
            return;
        }

        self.writer.write_line(&format!(
            "{}interface {} extends AstNode {{",
            self.export_prefix(),
            class.name
        ));
        self.writer.indent();
        self.writer
            .write_line(&format!("kind: \"{}\";", class.name));
        for property in &class.properties {
            emit_property(self, model, class, property);
        }
        self.writer.unindent();
        self.writer.write_line("}");
    }

    fn visit_node_ref_property(
        &mut self,
        model: &AstCodeModel,
        _class: &NodeClass,
        property: &Property,
    ) {
        self.write_property_line(model, property);
    }

    fn visit_node_ref_list_property(
        &mut self,
        model: &AstCodeModel,
        _class: &NodeClass,
        property: &Property,
    ) {
        self.write_property_line(model, property);
    }

    fn visit_token_text_property(
        &mut self,
        model: &AstCodeModel,
        _class: &NodeClass,
        property: &Property,
    ) {
        self.write_property_line(model, property);
    }

    fn visit_token_text_list_property(
        &mut self,
        model: &AstCodeModel,
        _class: &NodeClass,
        property: &Property,
    ) {
        self.write_property_line(model, property);
    }

    fn visit_optional_token_property(
        &mut self,
        model: &AstCodeModel,
        _class: &NodeClass,
        property: &Property,
    ) {
        self.write_property_line(model, property);
    }

    fn visit_ast_builder(&mut self, model: &AstCodeModel) {
        self.write_builder_class(model);
    }
}

/// Groups mappings that share a context (synthetic variants) while keeping
/// overall order.
fn group_mappings(mappings: &[BuilderMapping]) -> Vec<Vec<&BuilderMapping>> {
    let mut groups: Vec<Vec<&BuilderMapping>> = Vec::new();
    for mapping in mappings {
        match groups.last_mut() {
            Some(last)
                if last[0].rule_name == mapping.rule_name
                    && last[0].context_name == mapping.context_name
                    && mapping.alt_number.is_some() =>
            {
                last.push(mapping);
            }
            _ => groups.push(vec![mapping]),
        }
    }
    groups
}

fn method_return_type(model: &AstCodeModel, group: &[&BuilderMapping]) -> String {
    if group.len() == 1 {
        return model.class(group[0].class).name.clone();
    }
    // Synthetic variants all share a base; the method returns it.
    let first = model.class(group[0].class);
    match first.base {
        Some(base) => model.class(base).name.clone(),
        None => first.name.clone(),
    }
}

fn camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
