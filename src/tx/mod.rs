mod buffer_list;
mod concurrency_manager;
mod lock_table;
pub mod recovery;
mod transaction;
mod tx_number;

pub use buffer_list::*;
pub use concurrency_manager::*;
pub use lock_table::*;
pub use transaction::*;
pub use tx_number::*;
