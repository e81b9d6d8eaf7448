//! Relational plans with cost estimates, the query and update planners,
//! and the `Planner` that executes SQL text.

mod basic_update_planner;
mod index_update_planner;
mod plan;
mod planner;
mod product_plan;
mod project_plan;
mod query_planner;
mod select_plan;
mod table_plan;

pub use basic_update_planner::*;
pub use index_update_planner::*;
pub use plan::*;
pub use planner::*;
pub use product_plan::*;
pub use project_plan::*;
pub use query_planner::*;
pub use select_plan::*;
pub use table_plan::*;
