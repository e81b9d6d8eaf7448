use super::Plan;
use crate::common::Result;
use crate::query::{Predicate, Scan, SelectScan};
use crate::record::Schema;

pub struct SelectPlan {
    plan: Box<dyn Plan>,
    pred: Predicate,
}

impl SelectPlan {
    pub fn new(plan: Box<dyn Plan>, pred: Predicate) -> Self {
        Self { plan, pred }
    }
}

impl Plan for SelectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.plan.open()?;
        Ok(Box::new(SelectScan::new(scan, self.pred.clone())))
    }

    fn est_num_blocks(&self) -> usize {
        self.plan.est_num_blocks()
    }

    fn est_num_records(&self) -> usize {
        self.plan.est_num_records() / self.pred.reduction_factor(self.plan.as_ref())
    }

    fn est_distinct_vals(&self, field: &str) -> usize {
        if self.pred.equates_with_constant(field).is_some() {
            1
        } else if let Some(other) = self.pred.equates_with_field(field) {
            self.plan
                .est_distinct_vals(field)
                .min(self.plan.est_distinct_vals(other))
        } else {
            self.plan.est_distinct_vals(field)
        }
    }

    fn schema(&self) -> &Schema {
        self.plan.schema()
    }
}
