use crate::records::Author;
use silo_core::{Cond, Entity, PKEY, Query, RowValues, Store, Value, params};

fn author_count(store: &mut dyn Store) -> i64 {
    let query = Query::new(Author::TABLE, Author::all_types(), Cond::none());
    store.count(&query, &params! {}).expect("Count did not succeed")
}

fn insert_author(store: &mut dyn Store, name: &str) {
    let rows: Vec<RowValues> = vec![[("name", Value::from(name))].into()];
    store
        .create(Author::TABLE, &rows, &Author::all_types())
        .expect("Insert did not succeed");
}

pub(crate) fn transactions(store: &mut dyn Store) {
    assert_eq!(store.transaction_depth(), 0);

    store
        .begin_transaction()
        .expect("Begin did not succeed");
    insert_author(store, "Franz Kafka");
    assert_eq!(author_count(store), 1);
    store.rollback().expect("Rollback did not succeed");
    assert_eq!(store.transaction_depth(), 0);
    assert_eq!(author_count(store), 0);

    // A rollback zeroes the depth even from a nested transaction.
    store
        .begin_transaction()
        .expect("Begin did not succeed");
    store
        .begin_transaction()
        .expect("Nested begin did not succeed");
    insert_author(store, "Italo Calvino");
    assert_eq!(store.transaction_depth(), 2);
    store.rollback().expect("Rollback did not succeed");
    assert_eq!(store.transaction_depth(), 0);
    assert_eq!(author_count(store), 0);

    store
        .begin_transaction()
        .expect("Begin did not succeed");
    store
        .begin_transaction()
        .expect("Nested begin did not succeed");
    assert_eq!(store.transaction_depth(), 2);
    insert_author(store, "Jules Verne");
    // The inner commit is a passthrough, nothing is durable yet.
    store.commit().expect("Inner commit did not succeed");
    assert_eq!(store.transaction_depth(), 1);
    assert_eq!(author_count(store), 1);
    store.commit().expect("Outer commit did not succeed");
    assert_eq!(store.transaction_depth(), 0);
    assert_eq!(author_count(store), 1);

    let key = store
        .get_max(Author::TABLE, PKEY)
        .expect("Max did not succeed");
    store
        .delete(Author::TABLE, &[key], PKEY)
        .expect("Delete did not succeed");
    assert_eq!(author_count(store), 0);
}
