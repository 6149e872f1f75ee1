use crate::ast::Placeholder;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer(i64),

    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -1.5
    /// ```
    Float(f64),

    /// String literal in single or double quotes, escapes resolved
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    /// `true` / `false`
    Boolean(bool),

    /// `null`
    Null,

    /// Deferred value slot
    ///
    /// # Examples
    /// ```text
    /// %s
    /// %d
    /// %(min_price)f
    /// ```
    Placeholder(Placeholder),

    /// Field or scope name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    Identifier(String),

    // References
    /// Document root (`$`)
    Dollar,

    /// Current scope (`@`)
    ///
    /// The document root at top level, the current element inside `[?...]`
    /// of a wildcard.
    At,

    // Filter punctuation
    /// Filter marker inside brackets (`[?`)
    Question,

    /// Wildcard (`[*]`)
    Star,

    // Logical
    /// `&&`
    AndAnd,

    /// `||`
    OrOr,

    /// `!`
    Bang,

    // Comparison
    /// `==`
    EqEq,

    /// `!=`
    NotEq,

    /// `<`
    Lt,

    /// `>`
    Gt,

    /// `<=`
    LtEq,

    /// `>=`
    GtEq,

    // Delimiters
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dot,

    /// End of input
    Eof,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Integer(n) => format!("number {}", n),
            Token::Float(n) => format!("number {}", n),
            Token::String(s) => format!("string {:?}", s),
            Token::Boolean(b) => format!("'{}'", b),
            Token::Null => "'null'".to_string(),
            Token::Placeholder(p) => format!("placeholder {}", p),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Dollar => "'$'".to_string(),
            Token::At => "'@'".to_string(),
            Token::Question => "'?'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::AndAnd => "'&&'".to_string(),
            Token::OrOr => "'||'".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::EqEq => "'=='".to_string(),
            Token::NotEq => "'!='".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::LtEq => "'<='".to_string(),
            Token::GtEq => "'>='".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub position: usize,
}
