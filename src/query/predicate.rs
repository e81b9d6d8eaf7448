use std::fmt;

use super::{Constant, Scan, Term};
use crate::common::Result;
use crate::plan::Plan;
use crate::record::Schema;

/// A conjunction of terms. The empty predicate is always true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_term(term: Term) -> Self {
        Self { terms: vec![term] }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms);
    }

    pub fn is_satisfied(&self, scan: &dyn Scan) -> Result<bool> {
        for term in &self.terms {
            if !term.is_satisfied(scan)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Product of the terms' reduction factors.
    pub fn reduction_factor(&self, plan: &dyn Plan) -> usize {
        self.terms.iter().fold(1usize, |factor, term| {
            factor.saturating_mul(term.reduction_factor(plan).max(1))
        })
    }

    /// The terms that only mention fields of `schema`.
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        (!terms.is_empty()).then_some(Predicate { terms })
    }

    /// The terms that need fields from both schemas.
    pub fn join_sub_pred(&self, left: &Schema, right: &Schema) -> Option<Predicate> {
        let mut joined = Schema::new();
        joined.add_all(left);
        joined.add_all(right);
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| !t.applies_to(left) && !t.applies_to(right) && t.applies_to(&joined))
            .cloned()
            .collect();
        (!terms.is_empty()).then_some(Predicate { terms })
    }

    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        self.terms
            .iter()
            .find_map(|t| t.equates_with_constant(field))
    }

    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Expression;

    fn field(name: &str) -> Expression {
        Expression::Field(name.into())
    }

    fn int(v: i32) -> Expression {
        Expression::Const(Constant::Int(v))
    }

    fn pred(terms: Vec<Term>) -> Predicate {
        let mut p = Predicate::new();
        for t in terms {
            p.conjoin_with(Predicate::from_term(t));
        }
        p
    }

    #[test]
    fn test_equates() {
        let p = pred(vec![Term::new(field("a"), int(10)), Term::new(field("b"), field("c"))]);
        assert_eq!(p.equates_with_constant("a"), Some(&Constant::Int(10)));
        assert_eq!(p.equates_with_constant("b"), None);
        assert_eq!(p.equates_with_field("c"), Some("b"));
        assert_eq!(p.to_string(), "a = 10 and b = c");
    }

    #[test]
    fn test_sub_predicates() {
        let mut s1 = Schema::new();
        s1.add_int_field("a");
        s1.add_string_field("b", 9);
        let mut s2 = Schema::new();
        s2.add_int_field("c");

        let p = pred(vec![Term::new(field("a"), int(1)), Term::new(field("a"), field("c"))]);
        let select = p.select_sub_pred(&s1).unwrap();
        assert_eq!(select.terms().len(), 1);
        let join = p.join_sub_pred(&s1, &s2).unwrap();
        assert_eq!(join.terms(), &[Term::new(field("a"), field("c"))]);
        assert!(p.select_sub_pred(&Schema::new()).is_none());
    }
}
