use std::fmt;

use super::{Constant, Expression, Scan};
use crate::common::Result;
use crate::plan::Plan;
use crate::record::Schema;

/// Reduction factor of a term that can never hold.
pub const UNSATISFIABLE_REDUCTION: usize = i32::MAX as usize;

/// An equality between two expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    lhs: Expression,
    rhs: Expression,
}

impl Term {
    pub fn new(lhs: Expression, rhs: Expression) -> Self {
        Self { lhs, rhs }
    }

    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }

    pub fn is_satisfied(&self, scan: &dyn Scan) -> Result<bool> {
        Ok(self.lhs.evaluate(scan)? == self.rhs.evaluate(scan)?)
    }

    /// Estimated factor by which the term shrinks the output of `plan`.
    pub fn reduction_factor(&self, plan: &dyn Plan) -> usize {
        match (self.lhs.as_field_name(), self.rhs.as_field_name()) {
            (Some(l), Some(r)) => plan.est_distinct_vals(l).max(plan.est_distinct_vals(r)),
            (Some(field), None) | (None, Some(field)) => plan.est_distinct_vals(field),
            (None, None) => {
                if self.lhs.as_constant() == self.rhs.as_constant() {
                    1
                } else {
                    UNSATISFIABLE_REDUCTION
                }
            }
        }
    }

    /// The constant `field` is compared with, if the term is `field = c`.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(f), Expression::Const(c))
            | (Expression::Const(c), Expression::Field(f))
                if f == field =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// The other field, if the term is `field = other`.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(l), Expression::Field(r)) if l == field => Some(r),
            (Expression::Field(l), Expression::Field(r)) if r == field => Some(l),
            _ => None,
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
