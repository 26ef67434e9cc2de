use indoc::indoc;
use silo_core::{Entity, EntityCore, FieldDef, FieldRef, TypeTag, core_fields};
use std::sync::LazyLock;

/// Tables backing the driver suite. Every primary key rides the rowid so
/// the backend hands out `max + 1` keys in insertion order.
pub const SCHEMA: &str = indoc! {"
    create table if not exists author (
        pkey integer primary key,
        create_date text,
        update_date text,
        delete_flag integer,
        name text,
        country text
    );
    create table if not exists book (
        pkey integer primary key,
        create_date text,
        update_date text,
        delete_flag integer,
        title text,
        author_pkey integer,
        price real
    );
"};

#[derive(Debug, Clone, Default)]
pub struct Author {
    pub core: EntityCore,
    pub name: Option<String>,
    pub country: Option<String>,
}

impl Author {
    pub fn create(pkey: i64) -> Self {
        Self {
            core: EntityCore {
                pkey,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

static AUTHOR_FIELDS: LazyLock<Vec<FieldDef<Author>>> = LazyLock::new(|| {
    let mut fields = core_fields::<Author>().to_vec();
    fields.extend([
        FieldDef {
            column: "name",
            label: "author name",
            tag: TypeTag::Text,
            reference: None,
            get: |e: &Author| e.name.clone().into(),
            set: |e, v| e.name = v.into_text(),
        },
        FieldDef {
            column: "country",
            label: "author country",
            tag: TypeTag::Text,
            reference: None,
            get: |e| e.country.clone().into(),
            set: |e, v| e.country = v.into_text(),
        },
    ]);
    fields
});

impl Entity for Author {
    const NAME: &'static str = "Author";
    const TABLE: &'static str = "author";

    fn fields() -> &'static [FieldDef<Self>] {
        AUTHOR_FIELDS.as_slice()
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }
}

#[derive(Debug, Clone, Default)]
pub struct Book {
    pub core: EntityCore,
    pub title: Option<String>,
    pub author_pkey: Option<i64>,
    pub price: Option<f64>,
}

impl Book {
    pub fn create(pkey: i64) -> Self {
        Self {
            core: EntityCore {
                pkey,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

static BOOK_FIELDS: LazyLock<Vec<FieldDef<Book>>> = LazyLock::new(|| {
    let mut fields = core_fields::<Book>().to_vec();
    fields.extend([
        FieldDef {
            column: "title",
            label: "book title",
            tag: TypeTag::Text,
            reference: None,
            get: |e: &Book| e.title.clone().into(),
            set: |e, v| e.title = v.into_text(),
        },
        FieldDef {
            column: "author_pkey",
            label: "author key",
            tag: TypeTag::Int,
            reference: Some(FieldRef {
                entity: Author::NAME,
                key_field: "author_pkey",
            }),
            get: |e| e.author_pkey.into(),
            set: |e, v| e.author_pkey = v.as_int(),
        },
        FieldDef {
            column: "price",
            label: "book price",
            tag: TypeTag::Float,
            reference: None,
            get: |e| e.price.into(),
            set: |e, v| e.price = v.as_float(),
        },
    ]);
    fields
});

impl Entity for Book {
    const NAME: &'static str = "Book";
    const TABLE: &'static str = "book";

    fn fields() -> &'static [FieldDef<Self>] {
        BOOK_FIELDS.as_slice()
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }
}
