use std::sync::Arc;

use super::{
    BasicQueryPlanner, BasicUpdatePlanner, BetterQueryPlanner, IndexUpdatePlanner, Plan,
    QueryPlanner, UpdatePlanner,
};
use crate::common::{DbError, PlannerKind, Result};
use crate::metadata::MetadataManager;
use crate::parse::{ExecData, Parser, QueryData};
use crate::query::Constant;
use crate::record::{FieldType, Schema};
use crate::tx::Transaction;

/// Parses SQL, checks it against the catalog and hands it to the
/// configured query or update planner.
pub struct Planner {
    metadata: Arc<MetadataManager>,
    query_planner: Box<dyn QueryPlanner>,
    update_planner: Box<dyn UpdatePlanner>,
}

impl Planner {
    pub fn new(
        metadata: Arc<MetadataManager>,
        query_planner: Box<dyn QueryPlanner>,
        update_planner: Box<dyn UpdatePlanner>,
    ) -> Self {
        Self {
            metadata,
            query_planner,
            update_planner,
        }
    }

    /// The planner pair selected by `kind`. Only `Indexed` maintains indexes
    /// on update.
    pub fn with_kind(metadata: Arc<MetadataManager>, kind: PlannerKind) -> Self {
        let (query_planner, update_planner): (Box<dyn QueryPlanner>, Box<dyn UpdatePlanner>) =
            match kind {
                PlannerKind::Basic => (
                    Box::new(BasicQueryPlanner::new(Arc::clone(&metadata))),
                    Box::new(BasicUpdatePlanner::new(Arc::clone(&metadata))),
                ),
                PlannerKind::Better => (
                    Box::new(BetterQueryPlanner::new(Arc::clone(&metadata))),
                    Box::new(BasicUpdatePlanner::new(Arc::clone(&metadata))),
                ),
                PlannerKind::Indexed => (
                    Box::new(BetterQueryPlanner::with_index_selection(Arc::clone(&metadata))),
                    Box::new(IndexUpdatePlanner::new(Arc::clone(&metadata))),
                ),
            };
        Self::new(metadata, query_planner, update_planner)
    }

    pub fn create_query_plan(&self, sql: &str, tx: &Arc<Transaction>) -> Result<Box<dyn Plan>> {
        let data = Parser::new(sql)?.query()?;
        self.verify_query(&data, tx)?;
        self.query_planner.create_plan(&data, tx)
    }

    /// Executes a modifying statement and returns the affected-record count.
    pub fn execute_update(&self, sql: &str, tx: &Arc<Transaction>) -> Result<usize> {
        let data = Parser::new(sql)?.update_cmd()?;
        self.verify_update(&data, tx)?;
        match &data {
            ExecData::Insert(d) => self.update_planner.execute_insert(d, tx),
            ExecData::Delete(d) => self.update_planner.execute_delete(d, tx),
            ExecData::Modify(d) => self.update_planner.execute_modify(d, tx),
            ExecData::CreateTable(d) => self.update_planner.execute_create_table(d, tx),
            ExecData::CreateView(d) => self.update_planner.execute_create_view(d, tx),
            ExecData::CreateIndex(d) => self.update_planner.execute_create_index(d, tx),
        }
    }

    fn verify_query(&self, data: &QueryData, tx: &Arc<Transaction>) -> Result<()> {
        for table in &data.tables {
            if !self.metadata.table_exists(table, tx)?
                && self.metadata.get_view_def(table, tx)?.is_none()
            {
                return Err(DbError::TableNotFound(table.clone()));
            }
        }
        Ok(())
    }

    fn verify_update(&self, data: &ExecData, tx: &Arc<Transaction>) -> Result<()> {
        match data {
            ExecData::Insert(d) => {
                if d.fields.len() != d.values.len() {
                    return Err(DbError::Parse(format!(
                        "insert into {} names {} fields but gives {} values",
                        d.table,
                        d.fields.len(),
                        d.values.len()
                    )));
                }
                let schema = self.stored_schema(&d.table, tx)?;
                for (field, value) in d.fields.iter().zip(&d.values) {
                    let field_type = schema
                        .field_type(field)
                        .ok_or_else(|| DbError::FieldNotFound(format!("{}.{field}", d.table)))?;
                    if field_type != constant_type(value) {
                        return Err(DbError::Parse(format!(
                            "value {value} does not match {field_type} field {field}"
                        )));
                    }
                }
                Ok(())
            }
            ExecData::Delete(d) => self.stored_schema(&d.table, tx).map(|_| ()),
            ExecData::Modify(d) => {
                let schema = self.stored_schema(&d.table, tx)?;
                if schema.has_field(&d.field) {
                    Ok(())
                } else {
                    Err(DbError::FieldNotFound(format!("{}.{}", d.table, d.field)))
                }
            }
            ExecData::CreateView(d) => self.verify_query(&d.query, tx),
            ExecData::CreateTable(_) | ExecData::CreateIndex(_) => Ok(()),
        }
    }

    /// Schema of a stored table; views are not updatable.
    fn stored_schema(&self, table: &str, tx: &Arc<Transaction>) -> Result<Schema> {
        if self.metadata.get_view_def(table, tx)?.is_some() {
            return Err(DbError::NotUpdatable(format!("{table} is a view")));
        }
        Ok(self.metadata.get_layout(table, tx)?.schema().clone())
    }
}

fn constant_type(value: &Constant) -> FieldType {
    match value {
        Constant::Int(_) => FieldType::Integer,
        Constant::Str(_) => FieldType::Varchar,
    }
}
