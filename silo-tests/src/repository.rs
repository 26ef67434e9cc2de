use crate::records::{Author, Book};
use silo_core::{Activation, Entity, PKEY, Registry, Store, Value, params};
use std::rc::Rc;

pub(crate) fn repository(store: &mut dyn Store) {
    let mut registry = Registry::new();
    registry.register_repo::<Author>(Author::create);
    registry.register_repo::<Book>(Book::create);

    let author = {
        let repo = registry.repo::<Author>().expect("Author repository");
        let author = repo.register(
            Author {
                name: Some("Murasaki Shikibu".into()),
                country: Some("Japan".into()),
                ..Default::default()
            },
            false,
        );
        // Unsaved entities carry temporary negative keys and one identity.
        assert_eq!(author.borrow().core.pkey, -1);
        assert!(Rc::ptr_eq(&author, &repo.get_or_create(Some(-1))));
        author
    };
    let book = registry.repo::<Book>().expect("Book repository").register(
        Book {
            title: Some("The Tale of Genji".into()),
            price: Some(24.5),
            ..Default::default()
        },
        false,
    );
    assert_eq!(book.borrow().core.pkey, -1);

    // Saving books flushes authors first, then rekeys both from the
    // backend maximum.
    registry
        .save_all(Book::NAME, store)
        .expect("Save did not succeed");
    assert_eq!(store.transaction_depth(), 0);
    assert_eq!(author.borrow().core.pkey, 1);
    assert_eq!(book.borrow().core.pkey, 1);

    // Edits go through the repository, which queues the update itself.
    let author_key = author.borrow().core.pkey;
    assert!(
        registry
            .repo::<Book>()
            .expect("Book repository")
            .modify(1, |book| book.author_pkey = Some(author_key))
    );
    registry
        .save_all(Book::NAME, store)
        .expect("Save did not succeed");
    let row = store
        .get(Book::TABLE, 1, &Book::all_types(), false)
        .expect("Get did not succeed");
    assert_eq!(row.get_column("author_pkey"), Some(&Value::Int(1)));

    // A fresh unit of work sees the saved state.
    let mut registry = Registry::new();
    registry.register_repo::<Author>(Author::create);
    let repo = registry.repo::<Author>().expect("Author repository");
    repo.load(1, store, false).expect("Load did not succeed");
    let loaded = repo.get(1).expect("Loaded author");
    assert_eq!(loaded.borrow().core.activation, Activation::Activated);
    assert_eq!(loaded.borrow().name.as_deref(), Some("Murasaki Shikibu"));
    repo.ensure_loaded(1, store).expect("Already loaded");

    let keys = repo
        .select(
            &Author::default_query(),
            &params! { "name" => "Murasaki Shikibu" },
            store,
            false,
        )
        .expect("Select did not succeed");
    assert_eq!(keys, vec![1]);
    assert!(Rc::ptr_eq(&loaded, &repo.get(1).expect("Loaded author")));

    // Logical delete keeps the row and flips the flag.
    assert!(repo.delete(1));
    registry
        .save_all(Author::NAME, store)
        .expect("Save did not succeed");
    let row = store
        .get(Author::TABLE, 1, &Author::all_types(), false)
        .expect("Get did not succeed");
    assert_eq!(row.get_column("delete_flag"), Some(&Value::Bool(true)));

    registry
        .repo::<Author>()
        .expect("Author repository")
        .delete_physical(1, store)
        .expect("Physical delete did not succeed");
    store
        .delete(Book::TABLE, &[1], PKEY)
        .expect("Delete did not succeed");

    // An entity with every field unset still persists as a row of nulls.
    let mut registry = Registry::new();
    registry.register_repo::<Author>(Author::create);
    let blank = registry
        .repo::<Author>()
        .expect("Author repository")
        .register(Author::default(), false);
    registry
        .save_all(Author::NAME, store)
        .expect("Save did not succeed");
    assert_eq!(blank.borrow().core.pkey, 1);
    registry
        .repo::<Author>()
        .expect("Author repository")
        .delete_physical(1, store)
        .expect("Physical delete did not succeed");
}
