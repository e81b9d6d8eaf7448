mod field_type;
mod layout;
mod record_page;
mod schema;
mod table_scan;

pub use field_type::*;
pub use layout::*;
pub use record_page::*;
pub use schema::*;
pub use table_scan::*;
