//! Recursive-descent parser for filter templates.
//!
//! ```text
//! template   := '$' filter
//!             | '$' ('.' IDENT)+ '[' '*' ']' filter
//! filter     := '[' '?' or ']'
//! or         := and ('||' and)*
//! and        := unary ('&&' unary)*
//! unary      := '!' unary | '(' or ')' | comparison
//! comparison := operand (('==' | '!=' | '<' | '<=' | '>' | '>=') operand)?
//! operand    := literal | placeholder | access
//! access     := ('@' | '$') ('.' IDENT)* ('[' '*' ']' filter)?
//! ```
//!
//! `&&` binds tighter than `||` and both fold to the left. Inside the filter of
//! a wildcard `@` is the element under test; elsewhere it is the document root,
//! like `$`. Comparing with a `null` literal yields `IS NULL` / `IS NOT NULL`.

use crate::{
    ast::{Lexeme, Node, Operator, Token, build},
    error::SyntaxError,
    lexer::Lexer,
    value::Value,
};

pub struct Parser<'a> {
    input: &'a str,
    lexemes: Vec<Lexeme>,
    cursor: usize,
    /// `@` refers to the current element rather than the root
    in_wildcard: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, SyntaxError> {
        Ok(Parser {
            input,
            lexemes: Lexer::tokenize(input)?,
            cursor: 0,
            in_wildcard: false,
        })
    }

    /// Parses a complete template into a tree.
    pub fn parse(input: &str) -> Result<Node, SyntaxError> {
        let mut parser = Parser::new(input)?;
        let node = parser.parse_template()?;
        log::debug!(
            "parsed template {:?} ({} tokens)",
            input,
            parser.lexemes.len()
        );
        Ok(node)
    }

    fn current(&self) -> &Lexeme {
        // tokenize always ends with Eof, and the cursor never moves past it
        &self.lexemes[self.cursor.min(self.lexemes.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn advance(&mut self) -> Token {
        let token = self.current().token.clone();
        if token != Token::Eof {
            self.cursor += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let lexeme = self.current();
        SyntaxError::new(
            format!("Expected {}, found {}", expected, lexeme.token.describe()),
            self.input,
            lexeme.position,
        )
    }

    fn parse_template(&mut self) -> Result<Node, SyntaxError> {
        self.expect(Token::Dollar)?;

        let node = if self.check(&Token::Dot) {
            let scope = self.parse_path(Node::GlobalScope)?;
            if matches!(scope, Node::GlobalScope) {
                return Err(self.unexpected("a field name"));
            }
            self.expect(Token::LBracket)?;
            self.expect(Token::Star)?;
            self.expect(Token::RBracket)?;
            let predicate = self.parse_wildcard_filter()?;
            build::collection(scope, predicate)
        } else {
            self.parse_filter()?
        };

        self.expect(Token::Eof)?;
        Ok(node)
    }

    /// `[?predicate]`
    fn parse_filter(&mut self) -> Result<Node, SyntaxError> {
        self.expect(Token::LBracket)?;
        self.expect(Token::Question)?;
        let predicate = self.parse_or()?;
        self.expect(Token::RBracket)?;
        Ok(predicate)
    }

    fn parse_wildcard_filter(&mut self) -> Result<Node, SyntaxError> {
        let outer = std::mem::replace(&mut self.in_wildcard, true);
        let predicate = self.parse_filter();
        self.in_wildcard = outer;
        predicate
    }

    fn parse_or(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.check(&Token::OrOr) {
            self.advance();
            let right = self.parse_and()?;
            left = build::or(left, [right]);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_unary()?;
        while self.check(&Token::AndAnd) {
            self.advance();
            let right = self.parse_unary()?;
            left = build::and(left, [right]);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, SyntaxError> {
        match self.peek() {
            Token::Bang => {
                self.advance();
                Ok(build::not(self.parse_unary()?))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Node, SyntaxError> {
        let left = self.parse_operand()?;

        let operator = match self.peek() {
            Token::EqEq => Operator::Equal,
            Token::NotEq => Operator::NotEqual,
            Token::Lt => Operator::LessThan,
            Token::LtEq => Operator::LessThanEqual,
            Token::Gt => Operator::GreaterThan,
            Token::GtEq => Operator::GreaterThanEqual,
            _ => return Ok(left),
        };
        self.advance();

        match (operator, self.peek()) {
            (Operator::Equal, Token::Null) => {
                self.advance();
                Ok(build::is_null(left))
            }
            (Operator::NotEqual, Token::Null) => {
                self.advance();
                Ok(build::is_not_null(left))
            }
            _ => {
                let right = self.parse_operand()?;
                Ok(build::infix(left, operator, right))
            }
        }
    }

    fn parse_operand(&mut self) -> Result<Node, SyntaxError> {
        let node = match self.peek() {
            Token::Integer(n) => build::value(*n),
            Token::Float(n) => build::value(*n),
            Token::String(s) => build::value(s.clone()),
            Token::Boolean(b) => build::value(*b),
            Token::Null => build::value(Value::Null),
            Token::Placeholder(p) => build::placeholder(p.clone()),
            Token::Dollar => {
                self.advance();
                return self.parse_access(Node::GlobalScope);
            }
            Token::At => {
                self.advance();
                let root = if self.in_wildcard {
                    Node::Item
                } else {
                    Node::GlobalScope
                };
                return self.parse_access(root);
            }
            _ => return Err(self.unexpected("a value or field reference")),
        };
        self.advance();
        Ok(node)
    }

    /// `.a.b` after a root, as a chain of object scopes.
    fn parse_path(&mut self, root: Node) -> Result<Node, SyntaxError> {
        let mut scope = root;
        while self.check(&Token::Dot) {
            self.advance();
            if !self.check(&Token::Identifier(String::new())) {
                return Err(self.unexpected("a field name"));
            }
            if let Token::Identifier(name) = self.advance() {
                scope = build::object(scope, name);
            }
        }
        Ok(scope)
    }

    /// A field read, or a nested wildcard when the path ends in `[*][?...]`.
    fn parse_access(&mut self, root: Node) -> Result<Node, SyntaxError> {
        let scope = self.parse_path(root)?;

        if self.check(&Token::LBracket) {
            if scope.is_root() {
                return Err(self.unexpected("'.'"));
            }
            self.advance();
            self.expect(Token::Star)?;
            self.expect(Token::RBracket)?;
            let predicate = self.parse_wildcard_filter()?;
            return Ok(build::collection(scope, predicate));
        }

        match scope {
            Node::Object { parent, name } => Ok(Node::Field {
                object: parent,
                name,
            }),
            _ => Err(self.unexpected("'.'")),
        }
    }
}

#[test]
fn test_at_resolves_by_context() {
    let top = Parser::parse("$[?(@.a == 1)]").unwrap();
    assert_eq!(
        top,
        build::equal(build::field(build::global_scope(), "a"), build::value(1))
    );

    let nested = Parser::parse("$.Items[*][?(@.a == 1)]").unwrap();
    assert_eq!(
        nested,
        build::collection(
            build::object(build::global_scope(), "Items"),
            build::equal(build::field(build::item(), "a"), build::value(1)),
        )
    );
}
