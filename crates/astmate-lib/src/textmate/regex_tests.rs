use indoc::indoc;

use crate::diagnostics::Diagnostics;
use crate::grammar::{Grammar, parse};

use super::keywords::{apply_word_boundaries, keyword_texts};
use super::regex::RegexSynthesizer;

fn grammar_of(source: &str) -> Grammar {
    let mut diag = Diagnostics::new();
    let grammar = parse(source, &mut diag);
    assert!(!diag.has_errors(), "parse errors in test grammar");
    grammar
}

fn pattern_of(source: &str, rule: &str) -> String {
    let grammar = grammar_of(source);
    let mut diag = Diagnostics::new();
    let mut synth = RegexSynthesizer::new(&grammar, &mut diag);
    synth.rule_pattern(grammar.rule(rule).unwrap())
}

#[test]
fn literal_escaping() {
    assert_eq!(pattern_of(r"lexer grammar L; A : 'a+b' ;", "A"), r"a\+b");
    assert_eq!(
        pattern_of(r"lexer grammar L; A : '(x)' ;", "A"),
        r"\(x\)"
    );
    assert_eq!(pattern_of(r"lexer grammar L; A : 'a.b' ;", "A"), r"a\.b");
}

#[test]
fn char_set_copies_verbatim() {
    assert_eq!(
        pattern_of(r"lexer grammar L; ID : [a-zA-Z_] ;", "ID"),
        "[a-zA-Z_]"
    );
}

#[test]
fn negated_set_flips() {
    assert_eq!(
        pattern_of(r"lexer grammar L; X : ~[\r\n] ;", "X"),
        r"[^\r\n]"
    );
}

#[test]
fn negated_literal_becomes_complement_class() {
    assert_eq!(pattern_of(r"lexer grammar L; X : ~'a' ;", "X"), "[^a]");
}

#[test]
fn quantifiers_map_directly() {
    assert_eq!(
        pattern_of(r"lexer grammar L; N : [0-9]+ ;", "N"),
        "[0-9]+"
    );
    assert_eq!(
        pattern_of(r"lexer grammar L; N : [0-9]*? ;", "N"),
        "[0-9]*?"
    );
    assert_eq!(pattern_of(r"lexer grammar L; N : 'ab'+ ;", "N"), "(?:ab)+");
    assert_eq!(pattern_of(r"lexer grammar L; N : 'a'+ ;", "N"), "a+");
}

#[test]
fn alternation_groups() {
    assert_eq!(
        pattern_of(r"lexer grammar L; X : 'a' | 'b' | 'c' ;", "X"),
        "(?:a|b|c)"
    );
}

#[test]
fn dot_and_eof() {
    assert_eq!(pattern_of(r"lexer grammar L; X : . ;", "X"), ".");
    assert_eq!(
        pattern_of(r"lexer grammar L; X : 'a' EOF ;", "X"),
        r"a\z"
    );
}

#[test]
fn fragment_inlining() {
    let source = indoc! {r"
        lexer grammar L;
        NUM : DIGIT+ ;
        fragment DIGIT : [0-9] ;
    "};
    assert_eq!(pattern_of(source, "NUM"), "[0-9]+");
}

#[test]
fn unicode_escapes_in_sets() {
    assert_eq!(
        pattern_of(r"lexer grammar L; X : [\u00C0-\u00FF] ;", "X"),
        r"[\x{00C0}-\x{00FF}]"
    );
    assert_eq!(
        pattern_of(r"lexer grammar L; X : [\u{1F600}] ;", "X"),
        r"[\x{1F600}]"
    );
}

#[test]
fn case_insensitive_fragment_inside_sensitive_rule() {
    let source = indoc! {r"
        lexer grammar L;
        ABC options { caseInsensitive = false; } : 'x' LETTER+ | '@abc' ;
        fragment LETTER options { caseInsensitive = true; } : [A-Z] ;
    "};
    assert_eq!(pattern_of(source, "ABC"), r"(?:x(?i:[A-Z])+|@abc)");
}

#[test]
fn case_insensitive_rule_wraps_whole_pattern() {
    let source = indoc! {r"
        lexer grammar L;
        SELECT options { caseInsensitive = true; } : 'select' ;
    "};
    assert_eq!(pattern_of(source, "SELECT"), "(?i:select)");
}

#[test]
fn grammar_level_case_insensitivity_is_inherited() {
    let source = indoc! {r"
        lexer grammar L;
        options { caseInsensitive = true; }
        KW : 'kw' ;
    "};
    assert_eq!(pattern_of(source, "KW"), "(?i:kw)");
}

#[test]
fn matching_scopes_need_no_wrapper() {
    let source = indoc! {r"
        lexer grammar L;
        options { caseInsensitive = true; }
        WORD : LETTER+ ;
        fragment LETTER : [a-z] ;
    "};
    assert_eq!(pattern_of(source, "WORD"), "(?i:[a-z]+)");
}

#[test]
fn recursive_rule_collapses_to_empty_branch() {
    let source = indoc! {r"
        lexer grammar L;
        NEST : '(' NEST ')' | 'x' ;
    "};
    let grammar = grammar_of(source);
    let mut diag = Diagnostics::new();
    let mut synth = RegexSynthesizer::new(&grammar, &mut diag);
    let pattern = synth.rule_pattern(grammar.rule("NEST").unwrap());

    assert!(diag.has_warnings());
    assert_eq!(pattern, r"(?:\(\)|x)");
}

#[test]
fn unknown_token_ref_reports_error() {
    let grammar = grammar_of(r"lexer grammar L; X : MISSING ;");
    let mut diag = Diagnostics::new();
    let mut synth = RegexSynthesizer::new(&grammar, &mut diag);
    let pattern = synth.rule_pattern(grammar.rule("X").unwrap());
    assert!(diag.has_errors());
    assert!(pattern.is_empty());
}

#[test]
fn within_rule_alternation_sorts_longest_first() {
    let source = r"lexer grammar L; CMD : '$For' | '$Set' | '$ForEach' | '$SetValue' ;";
    assert_eq!(
        pattern_of(source, "CMD"),
        r"(?:\$SetValue|\$ForEach|\$For|\$Set)"
    );
}

#[test]
fn keyword_detection_and_boundaries() {
    let grammar = grammar_of(indoc! {r"
        lexer grammar L;
        IF : 'if' ;
        OVERRIDE : '@override' ;
        ARROW : '->' ;
        ID : [a-z]+ ;
    "});

    let texts = keyword_texts(&grammar, grammar.rule("IF").unwrap()).unwrap();
    assert_eq!(texts, vec!["if"]);
    assert_eq!(apply_word_boundaries("if", &texts), r"\b(?:if)\b");

    let texts = keyword_texts(&grammar, grammar.rule("OVERRIDE").unwrap()).unwrap();
    assert_eq!(
        apply_word_boundaries("@override", &texts),
        r"(?:@override)\b"
    );

    let texts = keyword_texts(&grammar, grammar.rule("ARROW").unwrap()).unwrap();
    assert_eq!(apply_word_boundaries("->", &texts), "(?:->)");

    assert!(keyword_texts(&grammar, grammar.rule("ID").unwrap()).is_none());
}

#[test]
fn keyword_through_references_and_sets() {
    let grammar = grammar_of(indoc! {r"
        lexer grammar L;
        TAG : '<' NAME '>' ;
        fragment NAME : 'if' | 'for' ;
        BOOL : ('true' | 'false') ;
        SIGN : [+-] ;
    "});

    let tag = keyword_texts(&grammar, grammar.rule("TAG").unwrap()).unwrap();
    assert_eq!(tag, vec!["<if>", "<for>"]);

    let bool_texts = keyword_texts(&grammar, grammar.rule("BOOL").unwrap()).unwrap();
    assert_eq!(bool_texts, vec!["true", "false"]);

    let sign = keyword_texts(&grammar, grammar.rule("SIGN").unwrap()).unwrap();
    assert_eq!(sign, vec!["+", "-"]);
}

#[test]
fn synthesized_keyword_regexes_match_their_texts() {
    let source = indoc! {r"
        lexer grammar L;
        CMD : '$For' | '$Set' | '$ForEach' | '$SetValue' ;
    "};
    let grammar = grammar_of(source);
    let rule = grammar.rule("CMD").unwrap();
    let texts = keyword_texts(&grammar, rule).unwrap();

    let mut diag = Diagnostics::new();
    let mut synth = RegexSynthesizer::new(&grammar, &mut diag);
    let pattern = apply_word_boundaries(&synth.rule_pattern(rule), &texts);

    let re = regex::Regex::new(&format!("^(?:{pattern})$")).unwrap();
    for text in &texts {
        assert!(re.is_match(text), "pattern must accept {text:?}");
    }
    for reject in ["$Se", "$Setx", "$forx", "Set"] {
        assert!(!re.is_match(reject), "pattern must reject {reject:?}");
    }
}
