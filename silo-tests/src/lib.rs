mod crud;
mod records;
mod repository;
mod transactions;

use crate::{crud::crud, repository::repository, transactions::transactions};
use log::LevelFilter;
use silo_core::Store;
use std::env;

pub use records::*;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole driver suite against a connected store whose database
/// already carries [`SCHEMA`] and is otherwise empty.
pub fn execute_tests<S: Store>(store: &mut S) {
    crud(store);
    transactions(store);
    repository(store);
    store.disconnect().expect("Disconnect did not succeed");
}
