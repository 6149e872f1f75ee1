use std::fmt;

/// Operators carried by `Prefix`, `Infix` and `Postfix` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessThanEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterThanEqual,

    // Arithmetic
    /// Addition or text concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,

    // Shifts
    /// Left shift (`<<`)
    LeftShift,
    /// Right shift (`>>`)
    RightShift,

    // Logical
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,
    /// Logical NOT (`!`), prefix only
    Not,

    // Sign, prefix only
    /// Unary plus
    Positive,
    /// Unary minus
    Negative,

    // Null tests, postfix only
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
}

/// Grouping direction of an operator when chained at equal precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    /// Chaining is not meaningful (comparisons)
    None,
}

impl Operator {
    /// Filter-syntax spelling, also used in error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::Add | Operator::Positive => "+",
            Operator::Subtract | Operator::Negative => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::LeftShift => "<<",
            Operator::RightShift => ">>",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// SQL spelling.
    pub fn sql(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            other => other.symbol(),
        }
    }

    /// Associativity given to nodes built for this operator.
    pub fn associativity(self) -> Associativity {
        match self {
            Operator::Equal
            | Operator::NotEqual
            | Operator::LessThan
            | Operator::LessThanEqual
            | Operator::GreaterThan
            | Operator::GreaterThanEqual => Associativity::None,
            Operator::Not | Operator::Positive | Operator::Negative => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::LessThan
                | Operator::LessThanEqual
                | Operator::GreaterThan
                | Operator::GreaterThanEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Not)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
