mod constant;
mod expression;
mod predicate;
mod product_scan;
mod project_scan;
mod scan;
mod select_scan;
mod term;

pub use constant::*;
pub use expression::*;
pub use predicate::*;
pub use product_scan::*;
pub use project_scan::*;
pub use scan::*;
pub use select_scan::*;
pub use term::*;
