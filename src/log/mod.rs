mod log_iterator;
mod log_manager;

pub use log_iterator::*;
pub use log_manager::*;
