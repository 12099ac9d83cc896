//! End-to-end scenarios driving the pipeline facade.

use indoc::indoc;

use crate::Generator;
use crate::config::GeneratorConfig;
use crate::model::PropertyKind;
use crate::textmate::TextMateGrammar;

fn analyzed(source: &str) -> crate::GrammarAnalyzed {
    let parsed = Generator::from_source(source)
        .parse()
        .expect("in-memory sources always load");
    assert!(
        !parsed.diagnostics().has_errors(),
        "unexpected errors: {}",
        parsed.diagnostics().printer().source(parsed.source()).render()
    );
    parsed.analyze()
}

/// First-match tokenizer over the generated pattern order, the way a
/// TextMate engine consumes the document.
fn tokenize(doc: &TextMateGrammar, input: &str) -> Vec<String> {
    let regexes: Vec<(String, regex::Regex)> = doc
        .patterns
        .iter()
        .map(|include| {
            let key = include.include.trim_start_matches('#').to_string();
            let re = regex::Regex::new(&format!("^(?:{})", doc.repository[&key].regex)).unwrap();
            (key, re)
        })
        .collect();

    let mut kinds = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        if rest.starts_with(char::is_whitespace) {
            rest = &rest[1..];
            continue;
        }
        let hit = regexes
            .iter()
            .find_map(|(key, re)| re.find(rest).filter(|m| !m.is_empty()).map(|m| (key, m)));
        match hit {
            Some((key, m)) => {
                kinds.push(key.clone());
                rest = &rest[m.end()..];
            }
            None => rest = &rest[1..],
        }
    }
    kinds
}

#[test]
fn s1_two_unlabeled_id_tokens() {
    let mut analyzed = analyzed(indoc! {r"
        grammar Swap;
        stat : 'swap' ID 'and' ID ;
        ID : [a-zA-Z]+ ;
    "});
    let model = analyzed.ast_model().unwrap();

    let class = model.class_by_name("Statement").unwrap();
    let names: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["LeftIdentifier", "RightIdentifier"]);
}

#[test]
fn s2_labeled_optional_literal() {
    let mut analyzed = analyzed(indoc! {r"
        grammar Fn;
        fnDef : isPublic='public'? 'fn' 'foo' '{' '}' ;
    "});
    let model = analyzed.ast_model().unwrap();

    let class = model.class_by_name("FunctionDefinition").unwrap();
    assert_eq!(class.properties.len(), 1);
    assert_eq!(class.properties[0].name, "IsPublic");
    assert_eq!(class.properties[0].kind, PropertyKind::OptionalToken);
}

#[test]
fn s3_delimited_list_detection() {
    let mut analyzed = analyzed(indoc! {r"
        grammar Imports;
        importStmt : 'import' ID (',' ID)* ;
        ID : [a-zA-Z]+ ;
    "});
    let model = analyzed.ast_model().unwrap();

    let class = model.class_by_name("ImportStatement").unwrap();
    assert_eq!(class.properties.len(), 1);
    assert_eq!(class.properties[0].name, "Identifiers");
    assert_eq!(class.properties[0].kind, PropertyKind::TokenTextList);
}

#[test]
fn s4_self_reference_cycle() {
    let mut analyzed = analyzed(indoc! {r"
        grammar Rec;
        expr : 'not'? expr ;
    "});
    let model = analyzed.ast_model().unwrap();

    let class = model.class_by_name("Expression").unwrap();
    let PropertyKind::NodeRef { class: target, .. } = class.properties[0].kind else {
        panic!("expected a node ref");
    };
    assert_eq!(model.class(target).name, "Expression");
}

#[test]
fn s5_labeled_alternatives_with_nested_transparent_alt() {
    let mut analyzed = analyzed(indoc! {r"
        grammar Calc;
        cmd : 'print' expr ;
        expr : expr '*' expr #multExpr
             | expr '+' expr #addExpr
             | atomicExpr    #atomicExpr ;
        atomicExpr : ID #varRefExpr | NUMBER #numericLiteralExpr | STR_LIT #strLitExpr ;
        ID : [a-zA-Z]+ ;
        NUMBER : [0-9]+ ;
        STR_LIT : '\'' ~['\r\n]* '\'' ;
    "});
    let model = analyzed.ast_model().unwrap();

    let expr = model.class_by_name("Expression").unwrap();
    assert!(expr.is_abstract());
    let variants: Vec<&str> = expr
        .variants
        .iter()
        .map(|&v| model.class(v).name.as_str())
        .collect();
    assert_eq!(
        variants,
        vec!["MultiplyExpression", "AddExpression", "AtomicExpression"]
    );

    let atomic = model.class_by_name("AtomicExpression").unwrap();
    assert!(atomic.is_abstract());
    let variants: Vec<&str> = atomic
        .variants
        .iter()
        .map(|&v| model.class(v).name.as_str())
        .collect();
    assert_eq!(
        variants,
        vec![
            "VariableReferenceExpression",
            "NumericLiteralExpression",
            "StringLiteralExpression"
        ]
    );
}

#[test]
fn s6_longest_match_across_rules() {
    let mut analyzed = analyzed(indoc! {r"
        lexer grammar Cmds;
        CMD : '$For' | '$Set' | '$ForEach' | '$SetValue' ;
        ID : '$'? [a-zA-Z]+ ;
    "});
    let doc = analyzed.textmate_grammar();

    let kinds = tokenize(&doc, "$Settlement $Fortress $Set x");
    assert_eq!(kinds, vec!["id", "id", "cmd", "id"]);
}

#[test]
fn s7_case_insensitive_fragment_inside_sensitive_rule() {
    let mut analyzed = analyzed(indoc! {r"
        lexer grammar Mixed;
        ABC options { caseInsensitive = false; } : 'x' LETTER+ | '@abc' ;
        fragment LETTER options { caseInsensitive = true; } : [A-Z] ;
    "});
    let doc = analyzed.textmate_grammar();

    assert_eq!(doc.repository["abc"].regex, r"(?:x(?i:[A-Z])+|@abc)");
}

#[test]
fn s8_keyword_with_nonword_boundary() {
    let mut analyzed = analyzed(indoc! {r"
        lexer grammar Ann;
        OVERRIDE : '@override' ;
    "});
    let doc = analyzed.textmate_grammar();

    assert_eq!(doc.repository["override"].regex, r"(?:@override)\b");
}

#[test]
fn both_artifacts_from_one_combined_grammar() {
    let mut analyzed = analyzed(indoc! {r"
        grammar Mini;
        program : statement* ;
        statement : 'let' name=ID '=' NUMBER ';' ;
        ID : [a-z]+ ;
        NUMBER : [0-9]+ ;
        WS : [ \t\r\n]+ -> skip ;
    "});

    let typescript = analyzed.typescript().unwrap();
    assert!(typescript.contains("export interface Statement extends AstNode {"));
    assert!(typescript.contains("export class MiniAstBuilder extends MiniParserVisitor<AstNode> {"));

    let doc = analyzed.textmate_grammar();
    assert_eq!(doc.scope_name, "source.mini");
    assert!(doc.repository.contains_key("let"));
    assert!(!doc.repository.contains_key("ws"));
}

#[test]
fn lexer_only_grammar_still_yields_textmate() {
    let mut analyzed = analyzed(indoc! {r"
        lexer grammar Tokens;
        IF : 'if' ;
    "});

    assert!(analyzed.ast_model().is_err());
    let doc = analyzed.textmate_grammar();
    assert!(doc.repository.contains_key("if"));
}

#[test]
fn token_vocab_is_merged_from_sibling_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("MyLexer.g4"),
        indoc! {r"
            lexer grammar MyLexer;
            ID : [a-z]+ ;
            IF : 'if' ;
        "},
    )
    .unwrap();
    std::fs::write(
        dir.path().join("My.g4"),
        indoc! {r"
            parser grammar My;
            options { tokenVocab = MyLexer; }
            stat : IF ID ;
        "},
    )
    .unwrap();

    let parsed = Generator::from_path(dir.path().join("My.g4")).parse().unwrap();
    assert!(!parsed.diagnostics().has_errors());
    assert!(parsed.grammar().rule("ID").is_some());

    let mut analyzed = parsed.analyze();
    let model = analyzed.ast_model().unwrap();
    let class = model.class_by_name("Statement").unwrap();
    assert_eq!(class.properties[0].name, "Identifier");
}

#[test]
fn missing_token_vocab_warns() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("My.g4"),
        indoc! {r"
            parser grammar My;
            options { tokenVocab = Nowhere; }
            stat : ID ;
        "},
    )
    .unwrap();

    let parsed = Generator::from_path(dir.path().join("My.g4")).parse().unwrap();
    assert!(parsed.diagnostics().has_warnings());
}

#[test]
fn missing_file_is_an_io_error() {
    let result = Generator::from_path("/nonexistent/grammar.g4").parse();
    assert!(matches!(result, Err(crate::Error::Io { .. })));
}

#[test]
fn index_invariant_over_blocks() {
    let analyzed = analyzed(indoc! {r"
        grammar Inv;
        r : A B (A | C) A? B ;
        A : 'a' ;
        B : 'b' ;
        C : 'c' ;
    "});

    // Per-type indices in document order form a definite prefix, then turn
    // unknown once branches disagree.
    let rule = analyzed.grammar().rule("r").unwrap();
    let elements = &rule.body.alternatives[0].elements;

    let a_first = analyzed.analysis().index_by_type(elements[0].id);
    assert_eq!(a_first, Some(0));

    // A inside the block sees one preceding A.
    let crate::grammar::ElementKind::Block(block) = &elements[2].kind else {
        panic!("expected block");
    };
    let a_in_block = analyzed
        .analysis()
        .index_by_type(block.alternatives[0].elements[0].id);
    assert_eq!(a_in_block, Some(1));

    // A? after the block: branches disagree on the A count.
    assert_eq!(analyzed.analysis().index_by_type(elements[3].id), None);

    // B is untouched by the block and keeps a definite second index.
    assert_eq!(analyzed.analysis().index_by_type(elements[4].id), Some(1));
}

#[test]
fn config_flows_to_both_generators() {
    let config = GeneratorConfig::from_json(
        r#"{
            "ast": { "nodeClassNaming": { "suffix": "Node" } },
            "syntaxHighlighting": {
                "ruleSettings": { "ID": { "textMateScopeName": "entity.name.x" } }
            }
        }"#,
    )
    .unwrap();

    let mut analyzed = Generator::from_source(indoc! {r"
        grammar Cfg;
        stat : ID ;
        ID : [a-z]+ ;
    "})
    .with_config(config)
    .parse()
    .unwrap()
    .analyze();

    let model = analyzed.ast_model().unwrap();
    assert!(model.class_by_name("StatementNode").is_some());

    let doc = analyzed.textmate_grammar();
    assert_eq!(doc.repository["id"].name.as_deref(), Some("entity.name.x"));
}
