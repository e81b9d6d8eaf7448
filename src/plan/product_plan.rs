use super::Plan;
use crate::common::Result;
use crate::query::{ProductScan, Scan};
use crate::record::Schema;

pub struct ProductPlan {
    lhs: Box<dyn Plan>,
    rhs: Box<dyn Plan>,
    schema: Schema,
}

impl ProductPlan {
    pub fn new(lhs: Box<dyn Plan>, rhs: Box<dyn Plan>) -> Self {
        let mut schema = Schema::new();
        schema.add_all(lhs.schema());
        schema.add_all(rhs.schema());
        Self { lhs, rhs, schema }
    }

    /// Block accesses of `lhs × rhs`: one pass over `lhs` plus one pass over
    /// `rhs` per `lhs` record.
    pub fn est_blocks_of(lhs: &dyn Plan, rhs: &dyn Plan) -> usize {
        lhs.est_num_blocks()
            .saturating_add(lhs.est_num_records().saturating_mul(rhs.est_num_blocks()))
    }
}

impl Plan for ProductPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let lhs = self.lhs.open()?;
        let rhs = self.rhs.open()?;
        Ok(Box::new(ProductScan::new(lhs, rhs)?))
    }

    fn est_num_blocks(&self) -> usize {
        Self::est_blocks_of(self.lhs.as_ref(), self.rhs.as_ref())
    }

    fn est_num_records(&self) -> usize {
        self.lhs
            .est_num_records()
            .saturating_mul(self.rhs.est_num_records())
    }

    fn est_distinct_vals(&self, field: &str) -> usize {
        if self.lhs.schema().has_field(field) {
            self.lhs.est_distinct_vals(field)
        } else {
            self.rhs.est_distinct_vals(field)
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
