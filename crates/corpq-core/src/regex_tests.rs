use crate::regex::fold_diacritics;
use crate::{RegexFlags, TokenRegex};

fn re(pattern: &str, flags: &str) -> TokenRegex {
    TokenRegex::new(pattern, RegexFlags::parse(flags).unwrap()).unwrap()
}

#[test]
fn patterns_are_anchored() {
    let r = re("ca.", "");

    assert!(r.is_match("cat"));
    assert!(!r.is_match("scat"));
    assert!(!r.is_match("cats"));
}

#[test]
fn dot_star_and_dot_plus_are_special() {
    let any = re(".*", "");
    let non_empty = re(".+", "");

    assert!(any.matches_everything());
    assert!(any.is_match(""));
    assert!(non_empty.matches_non_empty());
    assert!(!non_empty.is_match(""));
    assert!(non_empty.is_match("x"));
}

#[test]
fn ignore_case() {
    let r = re("the", "%c");

    assert!(r.is_match("The"));
    assert!(r.is_match("THE"));
    assert!(!re("the", "").is_match("The"));
}

#[test]
fn ignore_diacritics_folds_both_sides() {
    let r = re("café", "%d");

    assert!(r.is_match("cafe"));
    assert!(r.is_match("café"));
    assert!(!r.is_match("Café"));
    assert!(re("café", "%cd").is_match("CAFÉ"));
}

#[test]
fn literal_disables_metacharacters() {
    let r = re("a.b", "%l");

    assert!(r.is_match("a.b"));
    assert!(!r.is_match("axb"));
    assert!(re(".*", "%l").is_match(".*"));
    assert!(!re(".*", "%l").is_match("anything"));
    assert!(re("A+", "%lc").is_match("a+"));
}

#[test]
fn flag_parsing() {
    let flags = RegexFlags::parse("%cd").unwrap();

    assert!(flags.ignore_case);
    assert!(flags.ignore_diacritics);
    assert!(!flags.literal);
    assert_eq!(flags.to_string(), "%cd");
    assert!(RegexFlags::parse("%x").is_none());
    assert!(RegexFlags::parse("").unwrap().is_empty());
}

#[test]
fn invalid_pattern_is_an_error() {
    let err = TokenRegex::new("(unclosed", RegexFlags::NONE).unwrap_err();

    assert_eq!(err.pattern, "(unclosed");
    assert!(err.to_string().starts_with("invalid regular expression `(unclosed`"));
}

#[test]
fn diacritic_folding() {
    assert_eq!(fold_diacritics("Ærø"), "Æro");
    assert_eq!(fold_diacritics("Straße"), "Strasse");
    assert_eq!(fold_diacritics("Łódź"), "Lodz");
    assert_eq!(fold_diacritics("plain"), "plain");
}
