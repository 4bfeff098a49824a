//! FILENAME: parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for calculated-field formulas.
//! CONTEXT: After the Lexer tokenizes a formula string, the Parser converts
//! those tokens into this tree structure. The engine then traverses the tree
//! once per data group, substituting each aggregate with its group value.
//!
//! SUPPORTED EXPRESSIONS:
//! - Number literals: 2, 0.5, .25
//! - Aggregates over a field: SUM([Revenue]), MEDIAN([Price])
//! - Binary operations: +, -, *, /
//! - Unary operations: -, +

/// Represents a parsed formula expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A numeric literal.
    Number(f64),

    /// An aggregate over one field of the current group.
    /// Bare references like `[Revenue]` parse as `SUM([Revenue])`.
    Aggregate {
        function: AggregateFunction,
        field: String,
    },

    /// A binary operation: left op right (e.g., [Revenue] - [Cost]).
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand (e.g., -[Cost]).
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

impl Expression {
    /// Returns the distinct field names referenced by the expression,
    /// in first-reference order.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Number(_) => {}
            Expression::Aggregate { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field.as_str());
                }
            }
            Expression::BinaryOp { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_fields(out),
        }
    }
}

/// Aggregate functions recognized inside formulas.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
    Median,
    StdDev,
    Var,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 9] = [
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Count,
        AggregateFunction::CountDistinct,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Median,
        AggregateFunction::StdDev,
        AggregateFunction::Var,
    ];

    /// Looks up a function by its formula spelling. Matching is exact.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::CountDistinct => "COUNTD",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Median => "MEDIAN",
            AggregateFunction::StdDev => "STDEV",
            AggregateFunction::Var => "VAR",
        }
    }
}

/// Binary operators, lowest precedence group first.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
}

/// Unary operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate, // -
    Plus,   // +
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Aggregate { function, field } => {
                write!(f, "{}([{}])", function, field)
            }
            Expression::BinaryOp { left, op, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            Expression::UnaryOp { op, operand } => write!(f, "{}{}", op, operand),
        }
    }
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Plus => write!(f, "+"),
        }
    }
}
