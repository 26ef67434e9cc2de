use silo_core::{
    Activation, Entity, EntityCore, FieldDef, FieldRef, FieldTypes, Params, Query, Registry,
    Result, RowLabeled, RowValues, Store, StoreError, TypeTag, Value, core_fields,
};
use std::{collections::HashMap, rc::Rc, sync::Arc};

#[derive(Debug, Clone, Default)]
struct Parent {
    core: EntityCore,
    name: Option<String>,
}

impl Parent {
    fn create(pkey: i64) -> Self {
        Self {
            core: EntityCore {
                pkey,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

static PARENT_FIELDS: std::sync::LazyLock<Vec<FieldDef<Parent>>> =
    std::sync::LazyLock::new(|| {
        let mut fields = core_fields::<Parent>().to_vec();
        fields.push(FieldDef {
            column: "name",
            label: "name",
            tag: TypeTag::Text,
            reference: None,
            get: |e| e.name.clone().into(),
            set: |e, v| e.name = v.into_text(),
        });
        fields
    });

impl Entity for Parent {
    const NAME: &'static str = "Parent";
    const TABLE: &'static str = "parent";

    fn fields() -> &'static [FieldDef<Self>] {
        PARENT_FIELDS.as_slice()
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }
}

#[derive(Debug, Clone, Default)]
struct Child {
    core: EntityCore,
    parent_pkey: Option<i64>,
}

impl Child {
    fn create(pkey: i64) -> Self {
        Self {
            core: EntityCore {
                pkey,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

static CHILD_FIELDS: std::sync::LazyLock<Vec<FieldDef<Child>>> =
    std::sync::LazyLock::new(|| {
        let mut fields = core_fields::<Child>().to_vec();
        fields.push(FieldDef {
            column: "parent_pkey",
            label: "parent key",
            tag: TypeTag::Int,
            reference: Some(FieldRef {
                entity: Parent::NAME,
                key_field: "parent_pkey",
            }),
            get: |e| e.parent_pkey.into(),
            set: |e, v| e.parent_pkey = v.as_int(),
        });
        fields
    });

impl Entity for Child {
    const NAME: &'static str = "Child";
    const TABLE: &'static str = "child";

    fn fields() -> &'static [FieldDef<Self>] {
        CHILD_FIELDS.as_slice()
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }
}

/// Scripted store recording every backend call; no SQL involved.
#[derive(Default)]
struct ScriptedStore {
    depth: u32,
    ops: Vec<String>,
    max: HashMap<&'static str, i64>,
    select_rows: Vec<RowLabeled>,
    created_widths: Vec<usize>,
    fail_create: bool,
}

impl Store for ScriptedStore {
    fn transaction_depth(&self) -> u32 {
        self.depth
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.depth == 0 {
            self.ops.push("begin".into());
        }
        self.depth += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.depth == 1 {
            self.ops.push("commit".into());
        }
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.depth > 0 {
            self.ops.push("rollback".into());
            self.depth = 0;
        }
        Ok(())
    }

    fn select(&mut self, query: &Query, _params: &Params, _lock: bool) -> Result<Vec<RowLabeled>> {
        self.ops.push(format!("select {}", query.table));
        Ok(self.select_rows.clone())
    }

    fn get(
        &mut self,
        table: &str,
        pkey: i64,
        _fields: &FieldTypes,
        _lock: bool,
    ) -> Result<RowLabeled> {
        self.ops.push(format!("get {} {}", table, pkey));
        self.select_rows.first().cloned().ok_or(StoreError::NoData)
    }

    fn count(&mut self, _query: &Query, _params: &Params) -> Result<i64> {
        Ok(0)
    }

    fn get_max(&mut self, table: &str, _column: &str) -> Result<i64> {
        Ok(*self.max.get(table).unwrap_or(&0))
    }

    fn create(&mut self, table: &str, rows: &[RowValues], _types: &FieldTypes) -> Result<()> {
        if self.fail_create {
            return Err(StoreError::Execute("scripted failure".into()));
        }
        self.ops.push(format!("create {} x{}", table, rows.len()));
        self.created_widths
            .extend(rows.iter().map(|row| row.len()));
        Ok(())
    }

    fn update(
        &mut self,
        table: &str,
        rows: &[RowValues],
        _types: &FieldTypes,
        _key_column: &str,
    ) -> Result<()> {
        self.ops.push(format!("update {} x{}", table, rows.len()));
        Ok(())
    }

    fn delete(&mut self, table: &str, keys: &[i64], _key_column: &str) -> Result<()> {
        self.ops.push(format!("delete {} x{}", table, keys.len()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}

#[test]
fn to_map_withholds_temporary_keys() {
    let mut parent = Parent::create(-3);
    parent.name = Some("Ada".into());
    let row = parent.to_map(true);
    assert!(row.iter().all(|(name, _)| *name != "pkey"));
    parent.core.pkey = 3;
    let row = parent.to_map(true);
    assert!(
        row.iter()
            .any(|(name, value)| *name == "pkey" && *value == Value::Int(3))
    );
}

#[test]
fn load_from_map_converts_and_skips_bad_values() {
    let labels: std::sync::Arc<[String]> = ["pkey", "name", "delete_flag"]
        .map(String::from)
        .to_vec()
        .into();
    let row = RowLabeled::new(
        labels,
        vec![Value::Int(5), Value::Text("Ada".into()), Value::Text("nope".into())].into(),
    );
    let mut parent = Parent::default();
    parent.load_from_map(&row, false);
    assert_eq!(parent.core.pkey, 5);
    assert_eq!(parent.name.as_deref(), Some("Ada"));
    // "nope" has no boolean reading, the field stays untouched.
    assert_eq!(parent.core.delete_flag, None);
}

#[test]
fn to_map_load_from_map_round_trip() {
    let mut source = Parent::create(8);
    source.name = Some("Ada".into());
    let row = source.to_map(true);
    let labels: Arc<[String]> = row
        .iter()
        .map(|(name, _)| name.to_string())
        .collect::<Vec<_>>()
        .into();
    let values = row
        .iter()
        .map(|(_, value)| value.clone())
        .collect::<Vec<_>>()
        .into();
    let mut copy = Parent::default();
    copy.load_from_map(&RowLabeled::new(labels, values), false);
    assert_eq!(copy.core.pkey, 8);
    assert_eq!(copy.name, source.name);
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_repo::<Parent>(Parent::create);
    registry.register_repo::<Child>(Child::create);
    registry
}

#[test]
fn register_assigns_unique_temporary_keys() {
    let mut registry = registry();
    let repo = registry.repo::<Parent>().unwrap();
    let first = repo.register(Parent::default(), false);
    let second = repo.register(Parent::default(), false);
    assert_eq!(first.borrow().core.pkey, -1);
    assert_eq!(second.borrow().core.pkey, -2);
    assert!(Rc::ptr_eq(&first, &repo.get(-1).unwrap()));
    assert!(!Rc::ptr_eq(&first, &second));
}

#[test]
fn get_or_create_returns_one_instance_per_key() {
    let mut registry = registry();
    let repo = registry.repo::<Parent>().unwrap();
    let shell = repo.get_or_create(Some(7));
    assert_eq!(shell.borrow().core.pkey, 7);
    assert_eq!(shell.borrow().core.activation, Activation::Unloaded);
    assert!(Rc::ptr_eq(&shell, &repo.get_or_create(Some(7))));
}

#[test]
fn save_flushes_referenced_entities_first_and_rekeys_in_order() {
    let mut registry = registry();
    let mut store = ScriptedStore {
        max: HashMap::from([(Parent::TABLE, 10), (Child::TABLE, 5)]),
        ..Default::default()
    };
    let parent = registry.repo::<Parent>().unwrap().register(
        Parent {
            name: Some("p".into()),
            ..Default::default()
        },
        false,
    );
    let (first, second) = {
        let repo = registry.repo::<Child>().unwrap();
        (
            repo.register(Child::default(), false),
            repo.register(Child::default(), false),
        )
    };

    registry.save_all(Child::NAME, &mut store).unwrap();

    assert_eq!(
        store.ops,
        vec!["begin", "create parent x1", "create child x2", "commit"]
    );
    assert_eq!(store.depth, 0);
    assert_eq!(parent.borrow().core.pkey, 11);
    assert_eq!(first.borrow().core.pkey, 6);
    assert_eq!(second.borrow().core.pkey, 7);

    // The batches were consumed, a second save has nothing to write.
    store.ops.clear();
    registry.save_all(Child::NAME, &mut store).unwrap();
    assert_eq!(store.ops, vec!["begin", "commit"]);
}

#[test]
fn failed_save_rolls_back_and_keeps_the_batches() {
    let mut registry = registry();
    let mut store = ScriptedStore {
        fail_create: true,
        ..Default::default()
    };
    let parent = registry
        .repo::<Parent>()
        .unwrap()
        .register(Parent::default(), false);

    let error = registry.save_all(Parent::NAME, &mut store).unwrap_err();
    assert!(matches!(error, StoreError::Execute(..)));
    assert_eq!(store.ops, vec!["begin", "rollback"]);
    assert_eq!(store.depth, 0);
    assert_eq!(parent.borrow().core.pkey, -1);

    // The retry succeeds and picks up where the failure left off.
    store.fail_create = false;
    store.ops.clear();
    registry.save_all(Parent::NAME, &mut store).unwrap();
    assert_eq!(store.ops, vec!["begin", "create parent x1", "commit"]);
    assert_eq!(parent.borrow().core.pkey, 1);
}

#[test]
fn modify_enlists_the_entity_for_update() {
    let mut registry = registry();
    let mut store = ScriptedStore::default();
    {
        let repo = registry.repo::<Parent>().unwrap();
        repo.get_or_create(Some(3));
        assert!(repo.modify(3, |p| p.name = Some("Ada".into())));
        assert!(!repo.modify(99, |p| p.name = None));
        assert_eq!(repo.get(3).unwrap().borrow().name.as_deref(), Some("Ada"));
    }
    // The edit alone queued the update, no explicit mark involved.
    registry.save_all(Parent::NAME, &mut store).unwrap();
    assert_eq!(store.ops, vec!["begin", "update parent x1", "commit"]);
}

#[test]
fn all_null_creations_serialize_the_full_column_set() {
    let mut registry = registry();
    let mut store = ScriptedStore::default();
    {
        let repo = registry.repo::<Parent>().unwrap();
        repo.register(Parent::default(), false);
        repo.register(
            Parent {
                name: Some("p".into()),
                ..Default::default()
            },
            false,
        );
    }
    registry.save_all(Parent::NAME, &mut store).unwrap();
    assert_eq!(store.ops, vec!["begin", "create parent x2", "commit"]);
    // Both rows carry the persisted columns minus the withheld temporary
    // key; neither compiles to an empty insert.
    assert_eq!(store.created_widths, vec![4, 4]);
}

#[test]
fn update_batch_carries_marked_entities_only() {
    let mut registry = registry();
    let mut store = ScriptedStore::default();
    {
        let repo = registry.repo::<Parent>().unwrap();
        repo.get_or_create(Some(3));
        repo.get_or_create(Some(4));
        repo.mark_updated(3);
        repo.mark_updated(3);
    }
    registry.save_all(Parent::NAME, &mut store).unwrap();
    assert_eq!(store.ops, vec!["begin", "update parent x1", "commit"]);
}

#[test]
fn select_hydrates_the_identity_map() {
    let labels: Arc<[String]> = vec!["pkey".to_string(), "name".to_string()].into();
    let mut store = ScriptedStore {
        select_rows: vec![
            RowLabeled::new(
                Arc::clone(&labels),
                vec![3.into(), "Ada".into()].into(),
            ),
            RowLabeled::new(
                Arc::clone(&labels),
                vec![4.into(), "Grace".into()].into(),
            ),
        ],
        ..Default::default()
    };
    let mut registry = registry();
    let repo = registry.repo::<Parent>().unwrap();
    let keys = repo
        .select(&Parent::default_query(), &Params::new(), &mut store, false)
        .unwrap();
    assert_eq!(keys, vec![3, 4]);
    let loaded = repo.get(3).unwrap();
    assert_eq!(loaded.borrow().core.activation, Activation::Activated);
    assert_eq!(loaded.borrow().name.as_deref(), Some("Ada"));
}

#[test]
fn load_marks_failures() {
    let mut registry = registry();
    let mut store = ScriptedStore::default();
    let repo = registry.repo::<Parent>().unwrap();
    assert_eq!(
        repo.load(9, &mut store, false).unwrap_err(),
        StoreError::NoData
    );
    let shell = repo.get(9).unwrap();
    assert_eq!(shell.borrow().core.activation, Activation::LoadFailed);
    // A later ensure retries a failed load.
    store.select_rows = vec![RowLabeled::new(
        vec!["pkey".to_string(), "name".to_string()].into(),
        vec![9.into(), "Ada".into()].into(),
    )];
    repo.ensure_loaded(9, &mut store).unwrap();
    assert_eq!(shell.borrow().core.activation, Activation::Activated);
    assert_eq!(shell.borrow().name.as_deref(), Some("Ada"));
}

#[test]
fn logical_delete_queues_an_update() {
    let mut registry = registry();
    let mut store = ScriptedStore::default();
    {
        let repo = registry.repo::<Parent>().unwrap();
        repo.get_or_create(Some(2));
        assert!(repo.delete(2));
        assert!(!repo.delete(99));
        assert_eq!(
            repo.get(2).unwrap().borrow().core.delete_flag,
            Some(true)
        );
    }
    registry.save_all(Parent::NAME, &mut store).unwrap();
    assert_eq!(store.ops, vec!["begin", "update parent x1", "commit"]);
}
