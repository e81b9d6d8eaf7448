mod index_manager;
mod metadata_manager;
mod stat_manager;
mod table_manager;
mod view_manager;

pub use index_manager::*;
pub use metadata_manager::*;
pub use stat_manager::*;
pub use table_manager::*;
pub use view_manager::*;
