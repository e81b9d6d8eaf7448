mod aligned_buffer;
mod page;

pub use aligned_buffer::*;
pub use page::*;
