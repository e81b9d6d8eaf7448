use std::fmt;

use crate::common::{DbError, Result};

/// The column types a table can declare.
///
/// The numeric codes are what the field catalog stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 32-bit signed integer: 4 bytes, big-endian
    Integer,
    /// Character string of bounded length: 4-byte length prefix plus payload
    Varchar,
}

impl FieldType {
    pub fn code(&self) -> i32 {
        match self {
            FieldType::Integer => 4,
            FieldType::Varchar => 12,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            4 => Ok(FieldType::Integer),
            12 => Ok(FieldType::Varchar),
            other => Err(DbError::Config(format!("unknown field type code {other}"))),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "int"),
            FieldType::Varchar => write!(f, "varchar"),
        }
    }
}
