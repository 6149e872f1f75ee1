// tests/lexer_tests.rs

use predicate_spec::ast::{Placeholder, PlaceholderKind, Token};
use predicate_spec::lexer::Lexer;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::tokenize(input)
        .unwrap()
        .into_iter()
        .map(|lexeme| lexeme.token)
        .collect()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_two_character_operators_win_over_prefixes() {
    assert_eq!(
        tokens("== != >= <= > < ! && ||"),
        vec![
            Token::EqEq,
            Token::NotEq,
            Token::GtEq,
            Token::LtEq,
            Token::Gt,
            Token::Lt,
            Token::Bang,
            Token::AndAnd,
            Token::OrOr,
            Token::Eof,
        ]
    );
}

#[test]
fn test_whitespace_is_optional() {
    assert_eq!(tokens("@.a>=1"), tokens("@.a >= 1"));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("42 -10 3.25 -0.5"),
        vec![
            Token::Integer(42),
            Token::Integer(-10),
            Token::Float(3.25),
            Token::Float(-0.5),
            Token::Eof,
        ]
    );
}

#[test]
fn test_strings_in_both_quotes() {
    assert_eq!(
        tokens(r#""hello" 'item #1'"#),
        vec![
            Token::String("hello".to_string()),
            Token::String("item #1".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""say \"hi\"\n" 'it\'s'"#),
        vec![
            Token::String("say \"hi\"\n".to_string()),
            Token::String("it's".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_integer_overflow_is_an_error() {
    let err = Lexer::tokenize("99999999999999999999").unwrap_err();
    assert_eq!(err.position, 0);
    assert!(err.message.contains("out of range"));
}

// ============================================================================
// Placeholders
// ============================================================================

#[test]
fn test_positional_placeholders_are_numbered_in_order() {
    assert_eq!(
        tokens("%s %d %f"),
        vec![
            Token::Placeholder(Placeholder::positional(0, PlaceholderKind::Any)),
            Token::Placeholder(Placeholder::positional(1, PlaceholderKind::Integer)),
            Token::Placeholder(Placeholder::positional(2, PlaceholderKind::Float)),
            Token::Eof,
        ]
    );
}

#[test]
fn test_named_placeholders_do_not_consume_positions() {
    assert_eq!(
        tokens("%(min)d %s"),
        vec![
            Token::Placeholder(Placeholder::named("min", PlaceholderKind::Integer)),
            Token::Placeholder(Placeholder::positional(0, PlaceholderKind::Any)),
            Token::Eof,
        ]
    );
}

#[test]
fn test_unknown_conversion_is_an_error() {
    let err = Lexer::tokenize("@.a == %x").unwrap_err();
    assert_eq!(err.position, 7);
    assert_eq!(err.context, "%x");
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_lexeme_positions_are_byte_offsets() {
    let lexemes = Lexer::tokenize("$[?(@.name == 'é' && @.b)]").unwrap();
    let and = lexemes
        .iter()
        .find(|lexeme| lexeme.token == Token::AndAnd)
        .unwrap();
    // 'é' is two bytes
    assert_eq!(and.position, 19);
}

#[test]
fn test_unexpected_character() {
    let err = Lexer::tokenize("$[?(@.a # 1)]").unwrap_err();
    assert_eq!(err.position, 8);
    assert_eq!(err.message, "Unexpected character '#'");
    assert_eq!(err.context, "# 1)]");
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::tokenize("@.a == 'abc").unwrap_err();
    assert_eq!(err.position, 7);
}
