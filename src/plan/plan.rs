use crate::common::Result;
use crate::query::Scan;
use crate::record::Schema;

/// A tree of relational operators that knows its output schema and can
/// estimate its cost before being opened into a [`Scan`].
pub trait Plan {
    fn open(&self) -> Result<Box<dyn Scan>>;

    /// Estimated block accesses needed to iterate the whole output.
    fn est_num_blocks(&self) -> usize;

    /// Estimated number of output records.
    fn est_num_records(&self) -> usize;

    /// Estimated number of distinct values of `field` in the output.
    fn est_distinct_vals(&self, field: &str) -> usize;

    fn schema(&self) -> &Schema;
}
