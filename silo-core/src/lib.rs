mod condition;
mod entity;
mod op;
mod query;
mod repository;
mod sql_writer;
mod store;
mod util;
mod value;

pub use condition::*;
pub use entity::*;
pub use op::*;
pub use query::*;
pub use repository::*;
pub use sql_writer::*;
pub use store::*;
pub use util::*;
pub use value::*;
