pub use silo_core::*;
pub use silo_core::params;
