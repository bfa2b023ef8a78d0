use crate::diagnostics::DiagnosticKind;
use crate::parser::parse;
use crate::{CompileLimits, Error};

fn render(src: &str, slots: usize) -> String {
    let parsed = parse(src, slots, &CompileLimits::default()).unwrap();
    parsed.pool.render(parsed.root)
}

fn parse_error(src: &str, slots: usize) -> Error {
    parse(src, slots, &CompileLimits::default()).unwrap_err()
}

fn kinds(src: &str) -> Vec<DiagnosticKind> {
    match parse_error(src, 4) {
        Error::Parse(d) | Error::TooManyErrors(d) => d.kinds(),
        other => panic!("expected diagnostics, got {other:?}"),
    }
}

#[test]
fn free_names_get_slots_in_order_of_appearance() {
    let parsed = parse("det adj* noun", 3, &CompileLimits::default()).unwrap();

    assert_eq!(parsed.symbol_names, vec!["det", "adj", "noun"]);
    assert_eq!(parsed.pool.render(parsed.root), "#0 #1* #2");
}

#[test]
fn precedence_of_postfix_concat_alt() {
    assert_eq!(render("#0 #1 | #2*", 3), "(#0 #1|#2*)");
    assert_eq!(render("#0 (#1 | #2)+", 3), "#0 (#1|#2) (#1|#2)*");
}

#[test]
fn brackets_make_optional() {
    assert_eq!(render("#0 [#1]", 2), "#0 (#1|1)");
}

#[test]
fn equations_expand_as_macros() {
    assert_eq!(render("np = a b*, np c np", 3), "#0 #1* #2 #0 #1*");
}

#[test]
fn quoted_names_resolve_like_bare_names() {
    let parsed = parse(r#""x" x "y""#, 2, &CompileLimits::default()).unwrap();

    assert_eq!(parsed.symbol_names, vec!["x", "y"]);
    assert_eq!(parsed.pool.render(parsed.root), "#0 #0 #1");
}

#[test]
fn zero_and_one() {
    assert_eq!(render("#0 1 #1", 2), "#0 #1");
    assert_eq!(render("#0 0 | #1", 2), "#1");
}

#[test]
fn trailing_comma_is_allowed() {
    assert_eq!(render("#0,", 1), "#0");
}

#[test]
fn mixed_symbol_styles() {
    assert_eq!(parse_error("a #1", 2), Error::MixedSymbolStyles);
}

#[test]
fn slot_out_of_range() {
    assert_eq!(
        parse_error("#0 #5", 2),
        Error::SlotOutOfRange { slot: 5, slots: 2 }
    );
    assert_eq!(
        parse_error("a b c", 2),
        Error::SlotOutOfRange { slot: 2, slots: 2 }
    );
}

#[test]
fn recursive_equation() {
    assert_eq!(
        parse_error("x = a x, x", 4),
        Error::RecursiveDefinition("x".to_owned())
    );
}

#[test]
fn syntax_errors() {
    assert_eq!(kinds("(a"), vec![DiagnosticKind::UnclosedGroup]);
    assert_eq!(kinds("a)"), vec![DiagnosticKind::UnmatchedClose]);
    assert_eq!(kinds("(a]"), vec![DiagnosticKind::UnmatchedClose]);
    assert_eq!(kinds("()"), vec![DiagnosticKind::EmptyGroup]);
    assert_eq!(kinds("a |"), vec![DiagnosticKind::ExpectedExpression]);
    assert_eq!(kinds("* a"), vec![DiagnosticKind::ExpectedExpression]);
    assert_eq!(kinds("a $ b"), vec![DiagnosticKind::UnexpectedToken]);
    assert_eq!(kinds("a, b"), vec![DiagnosticKind::TrailingInput]);
    assert_eq!(kinds("x = a,"), vec![DiagnosticKind::ExpectedExpression]);
    assert_eq!(kinds(""), vec![DiagnosticKind::ExpectedExpression]);
}

#[test]
fn definition_errors() {
    assert_eq!(
        kinds("x = a, x = b, x"),
        vec![DiagnosticKind::DuplicateDefinition]
    );
    assert_eq!(
        kinds("y = x, x = a, y"),
        vec![DiagnosticKind::UsedBeforeDefinition]
    );
}

#[test]
fn errors_in_several_statements_are_all_reported() {
    assert_eq!(
        kinds("x = (a, y = b |, x y"),
        vec![
            DiagnosticKind::UnclosedGroup,
            DiagnosticKind::ExpectedExpression
        ]
    );
}

#[test]
fn gives_up_after_max_errors() {
    let limits = CompileLimits::new().max_errors(2);
    let err = parse("a = (, b = (, c = (, a", 4, &limits).unwrap_err();

    match err {
        Error::TooManyErrors(d) => assert_eq!(d.len(), 2),
        other => panic!("expected TooManyErrors, got {other:?}"),
    }
}

#[test]
fn nesting_limit() {
    let limits = CompileLimits::new().max_depth(3);
    let deep = "((((#0))))";

    assert_eq!(
        parse(deep, 1, &limits).unwrap_err(),
        Error::NestingTooDeep { limit: 3 }
    );
    assert!(parse("(((#0)))", 1, &limits).is_ok());
}
