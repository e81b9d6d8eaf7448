use std::fmt;

use crate::query::{Constant, Expression, Predicate};
use crate::record::Schema;

/// `SELECT fields FROM tables [WHERE pred]`. A field list of `["*"]`
/// selects every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryData {
    pub fields: Vec<String>,
    pub tables: Vec<String>,
    pub pred: Predicate,
}

/// Formats back into SQL the parser accepts; view definitions are stored
/// this way.
impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "select {} from {}",
            self.fields.join(", "),
            self.tables.join(", ")
        )?;
        if !self.pred.is_empty() {
            write!(f, " where {}", self.pred)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertData {
    pub table: String,
    pub fields: Vec<String>,
    pub values: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteData {
    pub table: String,
    pub pred: Predicate,
}

/// `UPDATE table SET field = new_value [WHERE pred]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyData {
    pub table: String,
    pub field: String,
    pub new_value: Expression,
    pub pred: Predicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableData {
    pub table: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateViewData {
    pub view: String,
    pub query: QueryData,
}

impl CreateViewData {
    pub fn view_def(&self) -> String {
        self.query.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexData {
    pub index: String,
    pub table: String,
    pub field: String,
}

/// A statement that modifies the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecData {
    Insert(InsertData),
    Delete(DeleteData),
    Modify(ModifyData),
    CreateTable(CreateTableData),
    CreateView(CreateViewData),
    CreateIndex(CreateIndexData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Query(QueryData),
    Exec(ExecData),
}
