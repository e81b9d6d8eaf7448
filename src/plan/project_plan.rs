use super::Plan;
use crate::common::{DbError, Result};
use crate::query::{ProjectScan, Scan};
use crate::record::Schema;

pub struct ProjectPlan {
    plan: Box<dyn Plan>,
    schema: Schema,
}

impl ProjectPlan {
    /// Projects `plan` onto `fields`; `*` stands for every field of `plan`.
    pub fn new(plan: Box<dyn Plan>, fields: &[String]) -> Result<Self> {
        let mut schema = Schema::new();
        for field in fields {
            if field == "*" {
                schema.add_all(plan.schema());
            } else if plan.schema().has_field(field) {
                schema.add(field, plan.schema());
            } else {
                return Err(DbError::FieldNotFound(field.clone()));
            }
        }
        Ok(Self { plan, schema })
    }
}

impl Plan for ProjectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.plan.open()?;
        Ok(Box::new(ProjectScan::new(scan, self.schema.fields().to_vec())))
    }

    fn est_num_blocks(&self) -> usize {
        self.plan.est_num_blocks()
    }

    fn est_num_records(&self) -> usize {
        self.plan.est_num_records()
    }

    fn est_distinct_vals(&self, field: &str) -> usize {
        self.plan.est_distinct_vals(field)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
