//! FILENAME: parser/src/lib.rs
//! PURPOSE: Library root for the calculated-field formula parser.
//! CONTEXT: Calculated measures are user-authored text such as
//! `[Revenue] - [Cost]` or `AVG([Price]) * 1.2`. This crate turns that text
//! into an expression tree that the engine evaluates per data group. The
//! grammar is closed: numbers, `+ - * /`, parentheses, bracketed field
//! references and the nine aggregate functions. Anything else is rejected
//! while parsing, so there is nothing to sanitize afterwards.
//!
//! PIPELINE: Formula String --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, / with standard precedence
//! - Unary sign: -[Cost], +2
//! - Field references: [Revenue], [Unit Price]
//! - Aggregates: SUM, AVG, COUNT, COUNTD, MIN, MAX, MEDIAN, STDEV, VAR
//! - Bare field references are implicitly aggregated with SUM

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{AggregateFunction, BinaryOperator, Expression, UnaryOperator};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseErrorKind, ParseResult, Parser};
pub use token::Token;
