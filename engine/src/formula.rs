//! FILENAME: engine/src/formula.rs
//! PURPOSE: Evaluates calculated-field formulas over a group of records.
//! CONTEXT: The `parser` crate turns the formula text into an arithmetic AST
//! whose leaves are numbers and aggregates over fields. Evaluation walks that
//! tree once per group; there is no other execution path, so a formula can
//! only ever compute arithmetic.

use crate::aggregate::aggregate;
use crate::error::{EngineError, EngineResult};
use crate::field::Aggregation;
use crate::record::Record;
use parser::{BinaryOperator, Expression, UnaryOperator};

/// A formula parsed once and evaluated per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expression: Expression,
}

/// Parses `source`. Malformed or disallowed input is an `UnsafeExpression`.
pub fn compile(source: &str) -> EngineResult<Formula> {
    let expression = parser::parse(source)
        .map_err(|e| EngineError::UnsafeExpression(format!("{} in \"{}\"", e, source)))?;
    Ok(Formula {
        source: source.to_string(),
        expression,
    })
}

impl Formula {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Fields the formula aggregates over, in first-reference order.
    pub fn referenced_fields(&self) -> Vec<&str> {
        self.expression.referenced_fields()
    }

    /// Evaluates the formula over one group of records.
    pub fn evaluate(&self, group: &[&Record]) -> EngineResult<f64> {
        self.eval(&self.expression, group)
    }

    fn eval(&self, expr: &Expression, group: &[&Record]) -> EngineResult<f64> {
        match expr {
            Expression::Number(n) => Ok(*n),

            Expression::Aggregate { function, field } => {
                let values = group
                    .iter()
                    .map(|record| record.value(field))
                    .filter(|v| !v.is_null());
                match aggregate(Aggregation::from(*function), values) {
                    Some(n) if n.is_finite() => Ok(n),
                    _ => Err(EngineError::UnsafeExpression(format!(
                        "{}([{}]) has no value in \"{}\"",
                        function, field, self.source
                    ))),
                }
            }

            Expression::BinaryOp { left, op, right } => {
                let l = self.eval(left, group)?;
                let r = self.eval(right, group)?;
                Ok(match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Subtract => l - r,
                    BinaryOperator::Multiply => l * r,
                    BinaryOperator::Divide => l / r,
                })
            }

            Expression::UnaryOp { op, operand } => {
                let value = self.eval(operand, group)?;
                Ok(match op {
                    UnaryOperator::Negate => -value,
                    UnaryOperator::Plus => value,
                })
            }
        }
    }
}

/// Compiles and evaluates in one step. Any failure is logged and the cell
/// degrades to `None`.
pub fn evaluate_formula(source: &str, group: &[&Record]) -> Option<f64> {
    match compile(source).and_then(|formula| formula.evaluate(group)) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(target: "FORMULA", "{}", e);
            None
        }
    }
}
