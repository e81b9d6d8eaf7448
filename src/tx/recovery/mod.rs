mod log_record;
mod recovery_manager;

pub use log_record::*;
pub use recovery_manager::*;
