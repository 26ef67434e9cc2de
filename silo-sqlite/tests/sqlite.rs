use silo_sqlite::SqliteStore;
use silo_tests::{SCHEMA, execute_tests, init_logs};

#[test]
fn sqlite() {
    init_logs();
    let mut store =
        SqliteStore::connect("sqlite://:memory:").expect("Could not open the database");
    store.execute_ddl(SCHEMA).expect("Could not create the schema");
    execute_tests(&mut store);
}
