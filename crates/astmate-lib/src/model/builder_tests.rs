use indoc::indoc;

use crate::analyze::analyze;
use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::grammar::{LabelKind, parse};
use crate::model::{AstCodeModel, MappingSource, PropertyKind, build};

fn model_of(source: &str) -> (AstCodeModel, Diagnostics) {
    let mut diag = Diagnostics::new();
    let grammar = parse(source, &mut diag);
    assert!(!diag.has_errors(), "parse errors in test grammar");
    let analysis = analyze(&grammar, &mut diag);
    let model = build(&grammar, &analysis, &GeneratorConfig::default(), &mut diag)
        .expect("model should build");
    (model, diag)
}

fn model_with_config(source: &str, config: &GeneratorConfig) -> AstCodeModel {
    let mut diag = Diagnostics::new();
    let grammar = parse(source, &mut diag);
    let analysis = analyze(&grammar, &mut diag);
    build(&grammar, &analysis, config, &mut diag).expect("model should build")
}

#[test]
fn two_unlabeled_id_tokens_get_left_right_names() {
    let (model, _) = model_of(indoc! {r"
        grammar Swap;
        stat : 'swap' ID 'and' ID ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Statement").unwrap();
    assert!(!class.is_abstract());
    let names: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["LeftIdentifier", "RightIdentifier"]);

    for (property, expected_index) in class.properties.iter().zip([0, 1]) {
        assert!(matches!(
            property.kind,
            PropertyKind::TokenText { optional: false }
        ));
        let MappingSource::ByGetter { index, .. } = &property.source else {
            panic!("expected getter mapping");
        };
        assert_eq!(*index, Some(expected_index));
    }
}

#[test]
fn labeled_optional_literal_becomes_boolean() {
    let (model, _) = model_of(indoc! {r"
        grammar Fn;
        fnDef : isPublic='public'? 'fn' 'foo' '{' '}' ;
    "});

    let class = model.class_by_name("FunctionDefinition").unwrap();
    assert_eq!(class.properties.len(), 1);
    let property = &class.properties[0];
    assert_eq!(property.name, "IsPublic");
    assert_eq!(property.kind, PropertyKind::OptionalToken);
    assert_eq!(
        property.source,
        MappingSource::ByLabel {
            name: "isPublic".into(),
            kind: LabelKind::Assign,
        }
    );
}

#[test]
fn delimited_list_collapses_to_single_property() {
    let (model, _) = model_of(indoc! {r"
        grammar Imports;
        importStmt : 'import' ID (',' ID)* ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("ImportStatement").unwrap();
    assert_eq!(class.properties.len(), 1);
    let property = &class.properties[0];
    assert_eq!(property.name, "Identifiers");
    assert_eq!(property.kind, PropertyKind::TokenTextList);
}

#[test]
fn self_recursive_rule_terminates() {
    let (model, _) = model_of(indoc! {r"
        grammar Rec;
        expr : 'not'? expr ;
    "});

    let class = model.class_by_name("Expression").unwrap();
    assert_eq!(class.properties.len(), 1);
    let property = &class.properties[0];
    assert_eq!(property.name, "Expression");
    let PropertyKind::NodeRef { class: target, optional } = property.kind else {
        panic!("expected node ref");
    };
    assert_eq!(model.class(target).name, "Expression");
    assert!(!optional);
}

#[test]
fn mutually_recursive_rules_terminate() {
    let (model, _) = model_of(indoc! {r"
        grammar Mutual;
        a : 'a' b? ;
        b : 'b' a? ;
    "});
    assert!(model.class_by_name("A").is_some());
    assert!(model.class_by_name("B").is_some());
}

#[test]
fn labeled_alternatives_build_variant_hierarchy() {
    let (model, _) = model_of(indoc! {r"
        grammar Calc;
        cmd : 'print' expr ;
        expr : expr '*' expr #multExpr
             | expr '+' expr #addExpr
             | atomicExpr    #atomicExpr ;
        atomicExpr : ID #varRefExpr | NUMBER #numericLiteralExpr | STR_LIT #strLitExpr ;
        ID : [a-z]+ ;
        NUMBER : [0-9]+ ;
        STR_LIT : '\'' ~['\r\n]* '\'' ;
    "});

    let expr = model.class_by_name("Expression").unwrap();
    assert!(expr.is_abstract());
    let variant_names: Vec<&str> = expr
        .variants
        .iter()
        .map(|&v| model.class(v).name.as_str())
        .collect();
    assert_eq!(
        variant_names,
        vec![
            "MultiplyExpression",
            "AddExpression",
            "AtomicExpression"
        ]
    );

    // The transparent alternative reuses the referenced rule's class, which
    // is itself abstract with three concrete variants.
    let atomic = model.class_by_name("AtomicExpression").unwrap();
    assert!(atomic.is_abstract());
    assert!(atomic.base.is_some());
    let atomic_variants: Vec<&str> = atomic
        .variants
        .iter()
        .map(|&v| model.class(v).name.as_str())
        .collect();
    assert_eq!(
        atomic_variants,
        vec![
            "VariableReferenceExpression",
            "NumericLiteralExpression",
            "StringLiteralExpression"
        ]
    );
}

#[test]
fn binary_variant_gets_left_right_operands() {
    let (model, _) = model_of(indoc! {r"
        grammar Calc;
        expr : expr '*' expr #multExpr
             | ID            #varRefExpr ;
        ID : [a-z]+ ;
    "});

    let mult = model.class_by_name("MultiplyExpression").unwrap();
    let names: Vec<&str> = mult.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["LeftExpression", "RightExpression"]);
}

#[test]
fn unlabeled_multi_alternatives_get_synthetic_variants() {
    let (model, _) = model_of(indoc! {r"
        grammar Mixed;
        expr : ID | NUMBER | STR_LIT ;
        ID : [a-z]+ ;
        NUMBER : [0-9]+ ;
        STR_LIT : '\'' ~['\r\n]* '\'' ;
    "});

    let class = model.class_by_name("Expression").unwrap();
    assert!(class.is_abstract());
    let names: Vec<&str> = class
        .variants
        .iter()
        .map(|&v| model.class(v).name.as_str())
        .collect();
    assert_eq!(names, vec!["Expression_1", "Expression_2", "Expression_3"]);

    // Synthetic variants dispatch on the ANTLR alternative number.
    let numbers: Vec<Option<u32>> = model
        .builder
        .mappings
        .iter()
        .filter(|m| m.rule_name == "expr")
        .map(|m| m.alt_number)
        .collect();
    assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn mixed_labels_are_invalid() {
    let mut diag = Diagnostics::new();
    let grammar = parse(
        indoc! {r"
            grammar Bad;
            expr : expr '*' expr #mult
                 | ID ;
            ID : [a-z]+ ;
        "},
        &mut diag,
    );
    let analysis = analyze(&grammar, &mut diag);
    let model = build(&grammar, &analysis, &GeneratorConfig::default(), &mut diag).unwrap();

    assert!(diag.has_errors());
    let class = model.class_by_name("Expression").unwrap();
    assert!(class.properties.is_empty());
    assert!(class.variants.is_empty());
}

#[test]
fn lexer_only_grammar_is_rejected() {
    let mut diag = Diagnostics::new();
    let grammar = parse("lexer grammar L; A : 'a' ;", &mut diag);
    let analysis = analyze(&grammar, &mut diag);
    let result = build(&grammar, &analysis, &GeneratorConfig::default(), &mut diag);
    assert!(result.is_err());
    assert!(diag.has_errors());
}

#[test]
fn unknown_rule_reference_is_skipped_with_error() {
    let mut diag = Diagnostics::new();
    let grammar = parse("grammar G; r : missing ;", &mut diag);
    let analysis = analyze(&grammar, &mut diag);
    let model = build(&grammar, &analysis, &GeneratorConfig::default(), &mut diag).unwrap();

    assert!(diag.has_errors());
    let class = model.class_by_name("R").unwrap();
    assert!(class.properties.is_empty());
}

#[test]
fn plus_assign_duplicates_merge_into_one_list() {
    let (model, _) = model_of(indoc! {r"
        grammar Dup;
        pair : xs+=ID '=' xs+=ID ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Pair").unwrap();
    assert_eq!(class.properties.len(), 1);
    assert_eq!(class.properties[0].name, "Xs");
    assert_eq!(class.properties[0].kind, PropertyKind::TokenTextList);
}

#[test]
fn three_or_more_duplicates_are_numbered() {
    let (model, _) = model_of(indoc! {r"
        grammar Tri;
        triple : ID ID ID ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Triple").unwrap();
    let names: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Identifier1", "Identifier2", "Identifier3"]);
}

#[test]
fn repeated_rule_ref_is_list_with_plural_name() {
    let (model, _) = model_of(indoc! {r"
        grammar Prog;
        program : statement* ;
        statement : ID ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Program").unwrap();
    assert_eq!(class.properties.len(), 1);
    assert_eq!(class.properties[0].name, "Statements");
    assert!(matches!(
        class.properties[0].kind,
        PropertyKind::NodeRefList { .. }
    ));
}

#[test]
fn already_plural_unlabeled_list_gets_list_suffix() {
    let (model, _) = model_of(indoc! {r"
        grammar Prog;
        program : functions* ;
        functions : ID ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Program").unwrap();
    assert_eq!(class.properties[0].name, "FunctionsList");
}

#[test]
fn optional_block_propagates_to_members() {
    let (model, _) = model_of(indoc! {r"
        grammar Opt;
        decl : ID (':' typeRef)? ;
        typeRef : ID ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Declaration").unwrap();
    let type_prop = class
        .properties
        .iter()
        .find(|p| p.name == "TypeReference")
        .unwrap();
    assert!(matches!(
        type_prop.kind,
        PropertyKind::NodeRef { optional: true, .. }
    ));
}

#[test]
fn structural_keywords_are_dropped() {
    let (model, _) = model_of(indoc! {r"
        grammar Kw;
        loop : WHILE expr DO expr END ;
        expr : ID ;
        WHILE : 'while' ;
        DO : 'do' ;
        END : 'end' ;
        ID : [a-z]+ ;
    "});

    let class = model.class_by_name("Loop").unwrap();
    let names: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["LeftExpression", "RightExpression"]);
}

#[test]
fn class_naming_affixes_apply() {
    let config = GeneratorConfig::from_json(
        r#"{ "ast": { "nodeClassNaming": { "prefix": "Ast", "suffix": "Node" } } }"#,
    )
    .unwrap();
    let model = model_with_config(
        indoc! {r"
            grammar Affix;
            stat : ID ;
            ID : [a-z]+ ;
        "},
        &config,
    );
    assert!(model.class_by_name("AstStatementNode").is_some());
}

#[test]
fn roots_follow_rule_order() {
    let (model, _) = model_of(indoc! {r"
        grammar Order;
        second : first ;
        first : ID ;
        ID : [a-z]+ ;
    "});

    let names: Vec<&str> = model
        .roots
        .iter()
        .map(|&id| model.class(id).name.as_str())
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[test]
fn node_ref_graph_terminates_on_cycles() {
    let (model, _) = model_of(indoc! {r"
        grammar Cyc;
        a : b ;
        b : c ;
        c : a? ID ;
        ID : [a-z]+ ;
    "});

    // Walk every NodeRef edge; a visited set must cover the graph without
    // revisiting — the arena is finite and ids resolve.
    let mut seen = std::collections::HashSet::new();
    let mut stack: Vec<_> = model.roots.clone();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        for p in &model.class(id).properties {
            match p.kind {
                PropertyKind::NodeRef { class, .. } | PropertyKind::NodeRefList { class } => {
                    stack.push(class)
                }
                _ => {}
            }
        }
    }
    assert_eq!(seen.len(), model.len());
}
