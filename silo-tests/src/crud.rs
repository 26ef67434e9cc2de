use crate::records::Author;
use silo_core::{Cond, Entity, Op, Query, RowValues, Store, StoreError, Value, params};

pub(crate) fn crud(store: &mut dyn Store) {
    let types = Author::all_types();
    let all = Query::new(Author::TABLE, types.clone(), Cond::none());
    assert_eq!(store.count(&all, &params! {}).expect("Count did not succeed"), 0);

    let rows: Vec<RowValues> = vec![
        [
            ("name", Value::from("Natsume Soseki")),
            ("country", Value::from("Japan")),
        ]
        .into(),
        [
            ("name", Value::from("Charles Dickens")),
            ("country", Value::from("England")),
        ]
        .into(),
    ];
    store
        .create(Author::TABLE, &rows, &types)
        .expect("Insert did not succeed");
    assert_eq!(store.count(&all, &params! {}).expect("Count did not succeed"), 2);
    assert_eq!(
        store
            .get_max(Author::TABLE, "pkey")
            .expect("Max did not succeed"),
        2
    );

    let row = store
        .get(Author::TABLE, 1, &types, false)
        .expect("Get did not succeed");
    assert_eq!(
        row.get_column("name"),
        Some(&Value::Text("Natsume Soseki".into()))
    );
    assert!(matches!(
        store.get(Author::TABLE, 99, &types, false),
        Err(StoreError::NoData)
    ));

    // The default search keeps only the conditions whose parameter arrives.
    let found = store
        .select(
            &Author::default_query(),
            &params! { "country" => "Japan" },
            false,
        )
        .expect("Select did not succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_column("pkey"), Some(&Value::Int(1)));

    let first_page = store
        .select(
            &all.clone().sorted(vec!["name".into()]).paged(1, 0),
            &params! {},
            false,
        )
        .expect("Select did not succeed");
    assert_eq!(first_page.len(), 1);
    assert_eq!(
        first_page[0].get_column("name"),
        Some(&Value::Text("Charles Dickens".into()))
    );

    let literal = Query::new(
        Author::TABLE,
        types.clone(),
        Cond::leaf("country", Op::Eq, "Japan"),
    );
    assert_eq!(
        store
            .count(&literal, &params! {})
            .expect("Count did not succeed"),
        1
    );

    let updates: Vec<RowValues> = vec![
        [
            ("pkey", Value::from(2)),
            ("name", Value::from("Emily Bronte")),
        ]
        .into(),
    ];
    store
        .update(Author::TABLE, &updates, &types, "pkey")
        .expect("Update did not succeed");
    let row = store
        .get(Author::TABLE, 2, &types, false)
        .expect("Get did not succeed");
    assert_eq!(
        row.get_column("name"),
        Some(&Value::Text("Emily Bronte".into()))
    );

    store
        .delete(Author::TABLE, &[1, 2], "pkey")
        .expect("Delete did not succeed");
    assert_eq!(store.count(&all, &params! {}).expect("Count did not succeed"), 0);

    // A value with no reading in the declared bind class aborts the batch.
    let bad: Vec<RowValues> = vec![
        [
            ("pkey", Value::Text("abc".into())),
            ("name", Value::from("x")),
        ]
        .into(),
    ];
    assert!(matches!(
        store.create(Author::TABLE, &bad, &types),
        Err(StoreError::Bind(..))
    ));
    assert_eq!(store.count(&all, &params! {}).expect("Count did not succeed"), 0);
}
