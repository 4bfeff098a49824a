//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree that can be evaluated.
//!
//! GRAMMAR:
//!   expression     --> additive
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> ("-" | "+") unary | primary
//!   primary        --> NUMBER | FIELD_REF | aggregate | "(" expression ")"
//!   aggregate      --> AGGREGATE_NAME "(" FIELD_REF ")"
//!
//! Any identifier that is not an aggregate name, and any character the lexer
//! could not classify, is reported as ParseErrorKind::Disallowed.

use crate::ast::{AggregateFunction, BinaryOperator, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::Token;

/// Distinguishes malformed input from input that leaves the formula alphabet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Well-formed tokens in an invalid arrangement, e.g. `(1 + 2`.
    Syntax,
    /// Characters or words outside the formula language, e.g. `alert(1)`.
    Disallowed,
}

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
        }
    }

    pub fn disallowed(message: impl Into<String>) -> Self {
        ParseError {
            kind: ParseErrorKind::Disallowed,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParseErrorKind::Syntax => write!(f, "Parse error: {}", self.message),
            ParseErrorKind::Disallowed => write!(f, "Disallowed input: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_expression()?;

        if self.current_token != Token::EOF {
            return Err(self.unexpected("after expression"));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Checks if the current token matches the expected token.
    /// If it matches, advances and returns Ok. Otherwise returns an error.
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("where {} was expected", expected)))
        }
    }

    /// Builds the error for the current token. Illegal characters and stray
    /// words are always Disallowed, whatever the parser was expecting.
    fn unexpected(&self, context: &str) -> ParseError {
        match &self.current_token {
            Token::Illegal(ch) => {
                ParseError::disallowed(format!("illegal character '{}'", ch))
            }
            Token::Identifier(name) if AggregateFunction::from_name(name).is_none() => {
                ParseError::disallowed(format!("unknown word '{}'", name))
            }
            Token::EOF => ParseError::new(format!("unexpected end of formula {}", context)),
            token => ParseError::new(format!("unexpected token {} {}", token, context)),
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_additive()
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (* and /).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses unary sign prefixes.
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match self.current_token {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parses primary expressions (numbers, field refs, aggregates, parentheses).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Number(n))
            }

            // A bare reference is summed over the group
            Token::FieldRef(field) => {
                check_field_name(&field)?;
                self.advance();
                Ok(Expression::Aggregate {
                    function: AggregateFunction::Sum,
                    field,
                })
            }

            Token::Identifier(name) => match AggregateFunction::from_name(&name) {
                Some(function) => {
                    self.advance();
                    self.parse_aggregate(function)
                }
                None => Err(ParseError::disallowed(format!("unknown word '{}'", name))),
            },

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            _ => Err(self.unexpected("where a value was expected")),
        }
    }

    /// Parses the argument list of an aggregate: exactly one field reference.
    fn parse_aggregate(&mut self, function: AggregateFunction) -> ParseResult<Expression> {
        self.expect(Token::LParen)?;

        let field = match self.current_token.clone() {
            Token::FieldRef(field) => {
                check_field_name(&field)?;
                self.advance();
                field
            }
            _ => {
                return Err(self.unexpected(&format!(
                    "in {}(): a single [field] argument is required",
                    function
                )))
            }
        };

        self.expect(Token::RParen)?;
        Ok(Expression::Aggregate { function, field })
    }
}

fn check_field_name(field: &str) -> ParseResult<()> {
    if field.is_empty() {
        Err(ParseError::new("empty field reference '[]'"))
    } else {
        Ok(())
    }
}

/// Convenience function to parse a formula string directly.
pub fn parse(input: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(input);
    parser.parse()
}
