use std::sync::Arc;

use tracing::debug;

use super::{Plan, ProductPlan, ProjectPlan, SelectPlan, TablePlan};
use crate::common::{DbError, Result};
use crate::index::IndexSelectPlan;
use crate::metadata::MetadataManager;
use crate::parse::{Parser, QueryData};
use crate::query::Predicate;
use crate::tx::Transaction;

/// Builds a plan for a parsed `SELECT`.
pub trait QueryPlanner: Send + Sync {
    fn create_plan(&self, data: &QueryData, tx: &Arc<Transaction>) -> Result<Box<dyn Plan>>;
}

/// Plans `name` as a view if it has a definition; views are re-parsed and
/// planned recursively by `planner`.
fn view_plan(
    planner: &dyn QueryPlanner,
    metadata: &MetadataManager,
    name: &str,
    tx: &Arc<Transaction>,
) -> Result<Option<Box<dyn Plan>>> {
    match metadata.get_view_def(name, tx)? {
        Some(definition) => {
            let view_data = Parser::new(&definition)?.query()?;
            Ok(Some(planner.create_plan(&view_data, tx)?))
        }
        None => Ok(None),
    }
}

/// Wraps `plan` with the selection and the projection of `data`.
fn finish_plan(plan: Box<dyn Plan>, data: &QueryData) -> Result<Box<dyn Plan>> {
    let plan = SelectPlan::new(plan, data.pred.clone());
    Ok(Box::new(ProjectPlan::new(Box::new(plan), &data.fields)?))
}

fn no_tables() -> DbError {
    DbError::Parse("query names no tables".into())
}

/// Products in `FROM` order, then select, then project.
pub struct BasicQueryPlanner {
    metadata: Arc<MetadataManager>,
}

impl BasicQueryPlanner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self { metadata }
    }
}

impl QueryPlanner for BasicQueryPlanner {
    fn create_plan(&self, data: &QueryData, tx: &Arc<Transaction>) -> Result<Box<dyn Plan>> {
        let mut product: Option<Box<dyn Plan>> = None;
        for table in &data.tables {
            let next = match view_plan(self, &self.metadata, table, tx)? {
                Some(plan) => plan,
                None => Box::new(TablePlan::new(Arc::clone(tx), table, &self.metadata)?),
            };
            product = Some(match product {
                Some(plan) => Box::new(ProductPlan::new(plan, next)),
                None => next,
            });
        }
        finish_plan(product.ok_or_else(no_tables)?, data)
    }
}

/// Like [`BasicQueryPlanner`], but orients each product so the side with
/// fewer estimated block accesses is scanned once. With index selection
/// enabled, a stored table whose predicate equates an indexed field with a
/// constant is read through the index.
pub struct BetterQueryPlanner {
    metadata: Arc<MetadataManager>,
    use_indexes: bool,
}

impl BetterQueryPlanner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self {
            metadata,
            use_indexes: false,
        }
    }

    pub fn with_index_selection(metadata: Arc<MetadataManager>) -> Self {
        Self {
            metadata,
            use_indexes: true,
        }
    }

    fn table_plan(&self, table: &str, pred: &Predicate, tx: &Arc<Transaction>) -> Result<Box<dyn Plan>> {
        let plan = TablePlan::new(Arc::clone(tx), table, &self.metadata)?;
        if !self.use_indexes {
            return Ok(Box::new(plan));
        }
        let mut indexes: Vec<_> = self.metadata.get_index_info(table, tx)?.into_iter().collect();
        indexes.sort_by(|a, b| a.0.cmp(&b.0));
        for (field, info) in indexes {
            if !info.searchable() {
                continue;
            }
            if let Some(value) = pred.equates_with_constant(&field) {
                debug!(table, index = info.index_name(), %value, "using index");
                return Ok(Box::new(IndexSelectPlan::new(plan, info, value.clone())));
            }
        }
        Ok(Box::new(plan))
    }
}

impl QueryPlanner for BetterQueryPlanner {
    fn create_plan(&self, data: &QueryData, tx: &Arc<Transaction>) -> Result<Box<dyn Plan>> {
        let mut product: Option<Box<dyn Plan>> = None;
        for table in &data.tables {
            let next = match view_plan(self, &self.metadata, table, tx)? {
                Some(plan) => plan,
                None => self.table_plan(table, &data.pred, tx)?,
            };
            product = Some(match product {
                Some(plan) => {
                    if ProductPlan::est_blocks_of(plan.as_ref(), next.as_ref())
                        < ProductPlan::est_blocks_of(next.as_ref(), plan.as_ref())
                    {
                        Box::new(ProductPlan::new(plan, next))
                    } else {
                        Box::new(ProductPlan::new(next, plan))
                    }
                }
                None => next,
            });
        }
        finish_plan(product.ok_or_else(no_tables)?, data)
    }
}
