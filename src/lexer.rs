use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ast::{Lexeme, Placeholder, PlaceholderKind, Token},
    error::SyntaxError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Whitespace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dot,
    Dollar,
    At,
    Question,
    Star,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    GtEq,
    LtEq,
    Gt,
    Lt,
    Bang,
    Number,
    String,
    Placeholder,
    Identifier,
}

/// Token patterns, tried in order at the current position.
///
/// Multi-character operators come before their one-character prefixes.
static PATTERNS: LazyLock<Vec<(Pattern, Regex)>> = LazyLock::new(|| {
    [
        (Pattern::Whitespace, r"\s+"),
        (Pattern::LBracket, r"\["),
        (Pattern::RBracket, r"\]"),
        (Pattern::LParen, r"\("),
        (Pattern::RParen, r"\)"),
        (Pattern::Dot, r"\."),
        (Pattern::Dollar, r"\$"),
        (Pattern::At, r"@"),
        (Pattern::Question, r"\?"),
        (Pattern::Star, r"\*"),
        (Pattern::AndAnd, r"&&"),
        (Pattern::OrOr, r"\|\|"),
        (Pattern::EqEq, r"=="),
        (Pattern::NotEq, r"!="),
        (Pattern::GtEq, r">="),
        (Pattern::LtEq, r"<="),
        (Pattern::Gt, r">"),
        (Pattern::Lt, r"<"),
        (Pattern::Bang, r"!"),
        (Pattern::Number, r"-?[0-9]+(?:\.[0-9]+)?"),
        (Pattern::String, r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#),
        (Pattern::Placeholder, r"%\(([A-Za-z_][A-Za-z0-9_]*)\)([sdf])|%([sdf])"),
        (Pattern::Identifier, r"[A-Za-z_][A-Za-z0-9_]*"),
    ]
    .into_iter()
    .map(|(pattern, source)| {
        let regex = Regex::new(&format!("^(?:{})", source))
            .unwrap_or_else(|e| panic!("invalid token pattern {:?}: {}", pattern, e));
        (pattern, regex)
    })
    .collect()
});

pub struct Lexer<'a> {
    input: &'a str,
    /// Byte offset of the next unread character
    position: usize,
    /// Positional placeholders seen so far
    placeholders: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            placeholders: 0,
        }
    }

    /// Splits the whole input, ending with a [`Token::Eof`] lexeme.
    pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, SyntaxError> {
        let mut lexer = Lexer::new(input);
        let mut lexemes = Vec::new();
        loop {
            let lexeme = lexer.next_lexeme()?;
            let done = lexeme.token == Token::Eof;
            lexemes.push(lexeme);
            if done {
                return Ok(lexemes);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.next_lexeme().map(|lexeme| lexeme.token)
    }

    pub fn next_lexeme(&mut self) -> Result<Lexeme, SyntaxError> {
        loop {
            let start = self.position;
            let rest = &self.input[start..];
            if rest.is_empty() {
                return Ok(Lexeme {
                    token: Token::Eof,
                    position: start,
                });
            }

            let Some((pattern, captures)) = PATTERNS
                .iter()
                .find_map(|(pattern, regex)| regex.captures(rest).map(|c| (*pattern, c)))
            else {
                let ch = rest.chars().next().unwrap_or_default();
                return Err(self.error(format!("Unexpected character '{}'", ch), start));
            };

            let text = captures.get(0).map_or("", |m| m.as_str());
            self.position += text.len();

            let token = match pattern {
                Pattern::Whitespace => continue,
                Pattern::LBracket => Token::LBracket,
                Pattern::RBracket => Token::RBracket,
                Pattern::LParen => Token::LParen,
                Pattern::RParen => Token::RParen,
                Pattern::Dot => Token::Dot,
                Pattern::Dollar => Token::Dollar,
                Pattern::At => Token::At,
                Pattern::Question => Token::Question,
                Pattern::Star => Token::Star,
                Pattern::AndAnd => Token::AndAnd,
                Pattern::OrOr => Token::OrOr,
                Pattern::EqEq => Token::EqEq,
                Pattern::NotEq => Token::NotEq,
                Pattern::GtEq => Token::GtEq,
                Pattern::LtEq => Token::LtEq,
                Pattern::Gt => Token::Gt,
                Pattern::Lt => Token::Lt,
                Pattern::Bang => Token::Bang,
                Pattern::Number => self.read_number(text, start)?,
                Pattern::String => Token::String(self.read_string(text, start)?),
                Pattern::Placeholder => {
                    let named = captures.get(1).map(|m| m.as_str());
                    let conversion = captures
                        .get(2)
                        .or_else(|| captures.get(3))
                        .and_then(|m| m.as_str().chars().next())
                        .and_then(PlaceholderKind::from_conversion)
                        .ok_or_else(|| self.error("Invalid placeholder", start))?;
                    Token::Placeholder(match named {
                        Some(name) => Placeholder::named(name, conversion),
                        None => {
                            self.placeholders += 1;
                            Placeholder::positional(self.placeholders - 1, conversion)
                        }
                    })
                }
                Pattern::Identifier => match text {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(text.to_string()),
                },
            };

            return Ok(Lexeme {
                token,
                position: start,
            });
        }
    }

    fn read_number(&self, text: &str, start: usize) -> Result<Token, SyntaxError> {
        if text.contains('.') {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(format!("Invalid number '{}'", text), start))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.error(format!("Integer out of range '{}'", text), start))
        }
    }

    /// Strips the quotes and resolves escapes.
    fn read_string(&self, text: &str, start: usize) -> Result<String, SyntaxError> {
        let body = &text[1..text.len() - 1];
        let mut result = String::with_capacity(body.len());
        let mut chars = body.chars();

        while let Some(ch) = chars.next() {
            if ch != '\\' {
                result.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some(c @ ('"' | '\'' | '\\')) => result.push(c),
                Some(c) => {
                    return Err(self.error(format!("Invalid escape sequence '\\{}'", c), start));
                }
                None => return Err(self.error("Unterminated string", start)),
            }
        }
        Ok(result)
    }

    fn error(&self, message: impl Into<String>, position: usize) -> SyntaxError {
        SyntaxError::new(message, self.input, position)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null nullable");
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(true)));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(false)));
    assert_eq!(lexer.next_token(), Ok(Token::Null));
    assert_eq!(
        lexer.next_token(),
        Ok(Token::Identifier("nullable".to_string()))
    );
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_filter() {
    let mut lexer = Lexer::new("$[?(@.x > 5)]");
    assert_eq!(lexer.next_token(), Ok(Token::Dollar));
    assert_eq!(lexer.next_token(), Ok(Token::LBracket));
    assert_eq!(lexer.next_token(), Ok(Token::Question));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::At));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("x".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Gt));
    assert_eq!(lexer.next_token(), Ok(Token::Integer(5)));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::RBracket));
}
