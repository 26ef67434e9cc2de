mod extract;
mod sql_writer;
mod store;

pub use sql_writer::*;
pub use store::*;
