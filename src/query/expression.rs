use std::fmt;

use super::{Constant, Scan};
use crate::common::Result;
use crate::record::Schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Const(Constant),
    Field(String),
}

impl Expression {
    pub fn evaluate(&self, scan: &dyn Scan) -> Result<Constant> {
        match self {
            Expression::Const(c) => Ok(c.clone()),
            Expression::Field(name) => scan.get_val(name),
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Const(_) => true,
            Expression::Field(name) => schema.has_field(name),
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Const(c) => Some(c),
            Expression::Field(_) => None,
        }
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            Expression::Const(_) => None,
            Expression::Field(name) => Some(name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Const(c) => write!(f, "{c}"),
            Expression::Field(name) => write!(f, "{name}"),
        }
    }
}
