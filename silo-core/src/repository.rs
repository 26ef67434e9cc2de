use crate::{
    Activation, Entity, PKEY, Params, Query, Result, RowValues, Store, StoreError, Value,
};
use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

/// Identity-mapped cache of one entity type within a unit of work.
///
/// Every entity lives behind `Rc<RefCell<_>>` so that two lookups of the
/// same key observe the same instance. The repository tracks which keys are
/// pending insertion and which are pending update; nothing touches the store
/// until [`Repository::save_all`].
pub struct Repository<E: Entity> {
    identity: HashMap<i64, Rc<RefCell<E>>>,
    created: Vec<i64>,
    updated: Vec<i64>,
    next_tmp: i64,
    factory: fn(i64) -> E,
}

impl<E: Entity> Repository<E> {
    /// `factory` builds a blank entity carrying the given primary key.
    pub fn new(factory: fn(i64) -> E) -> Self {
        Self {
            identity: HashMap::new(),
            created: Vec::new(),
            updated: Vec::new(),
            next_tmp: -1,
            factory,
        }
    }

    pub fn get(&self, pkey: i64) -> Option<Rc<RefCell<E>>> {
        self.identity.get(&pkey).map(Rc::clone)
    }

    pub fn len(&self) -> usize {
        self.identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }

    /// Enlists an entity. A key of 0 means unassigned: the entity receives
    /// the next temporary negative key and is queued for insertion. An
    /// entity with a real key is queued for update only when asked.
    pub fn register(&mut self, mut entity: E, mark_updated: bool) -> Rc<RefCell<E>> {
        let mut pkey = entity.core().pkey;
        if pkey == 0 {
            pkey = self.next_tmp;
            self.next_tmp -= 1;
            entity.core_mut().pkey = pkey;
            self.created.push(pkey);
        } else if mark_updated {
            self.mark_updated(pkey);
        }
        let rc = Rc::new(RefCell::new(entity));
        self.identity.insert(pkey, Rc::clone(&rc));
        rc
    }

    /// Queues a key for the update batch, once.
    pub fn mark_updated(&mut self, pkey: i64) {
        if !self.updated.contains(&pkey) {
            self.updated.push(pkey);
        }
    }

    /// The mutation path: applies the edit to the cached instance and
    /// enlists the key for the update batch, so an edit is never silently
    /// lost. Returns false when the key is not cached.
    pub fn modify(&mut self, pkey: i64, edit: impl FnOnce(&mut E)) -> bool {
        let Some(rc) = self.identity.get(&pkey).map(Rc::clone) else {
            return false;
        };
        edit(&mut *rc.borrow_mut());
        self.mark_updated(pkey);
        true
    }

    /// Drops a key from the identity map and from both pending batches.
    pub fn cancel(&mut self, pkey: i64) {
        self.identity.remove(&pkey);
        self.created.retain(|k| *k != pkey);
        self.updated.retain(|k| *k != pkey);
    }

    /// The instance for a key, building an unloaded shell when absent.
    /// `None` builds a shell under a fresh temporary key without queueing it
    /// anywhere.
    pub fn get_or_create(&mut self, pkey: Option<i64>) -> Rc<RefCell<E>> {
        let key = match pkey {
            Some(key) => {
                if let Some(rc) = self.identity.get(&key) {
                    return Rc::clone(rc);
                }
                key
            }
            None => {
                let key = self.next_tmp;
                self.next_tmp -= 1;
                key
            }
        };
        let rc = Rc::new(RefCell::new((self.factory)(key)));
        self.identity.insert(key, Rc::clone(&rc));
        rc
    }

    /// Fetches one row by key and hydrates the cached instance, filling only
    /// fields still unset so in-memory edits survive the load. `lock`
    /// requests a row lock and queues the entity for update.
    pub fn load(&mut self, pkey: i64, store: &mut dyn Store, lock: bool) -> Result<()> {
        let rc = self.get_or_create(Some(pkey));
        rc.borrow_mut().core_mut().activation = Activation::Loading;
        let types = E::all_types();
        match store.get(E::TABLE, pkey, &types, lock) {
            Ok(row) => {
                let mut entity = rc.borrow_mut();
                entity.load_from_map(&row, true);
                entity.core_mut().activation = Activation::Activated;
                drop(entity);
                if lock {
                    self.mark_updated(pkey);
                }
                Ok(())
            }
            Err(error) => {
                rc.borrow_mut().core_mut().activation = Activation::LoadFailed;
                Err(error)
            }
        }
    }

    /// Loads the key unless its instance is already activated or mid-load.
    pub fn ensure_loaded(&mut self, pkey: i64, store: &mut dyn Store) -> Result<()> {
        let pending = self.identity.get(&pkey).is_none_or(|rc| {
            matches!(
                rc.borrow().core().activation,
                Activation::Unloaded | Activation::LoadFailed
            )
        });
        if pending {
            self.load(pkey, store, false)
        } else {
            Ok(())
        }
    }

    /// Runs a search and hydrates every returned row into the identity map,
    /// overwriting cached field values with the fetched ones. Returns the
    /// primary keys in result order.
    pub fn select(
        &mut self,
        query: &Query,
        params: &Params,
        store: &mut dyn Store,
        lock: bool,
    ) -> Result<Vec<i64>> {
        let rows = store.select(query, params, lock)?;
        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(pkey) = row.get_column(PKEY).and_then(Value::as_int) else {
                return Err(StoreError::Driver(format!(
                    "{}: result row carries no {} column",
                    E::TABLE,
                    PKEY
                )));
            };
            let rc = self.get_or_create(Some(pkey));
            {
                let mut entity = rc.borrow_mut();
                entity.load_from_map(row, false);
                entity.core_mut().activation = Activation::Activated;
            }
            if lock {
                self.mark_updated(pkey);
            }
            keys.push(pkey);
        }
        Ok(keys)
    }

    /// Logical delete: flips the delete flag and queues the update.
    /// Returns false when the key is not cached.
    pub fn delete(&mut self, pkey: i64) -> bool {
        let Some(rc) = self.identity.get(&pkey) else {
            return false;
        };
        rc.borrow_mut().mark_deleted();
        self.mark_updated(pkey);
        true
    }

    /// Removes the row itself and forgets the cached instance.
    pub fn delete_physical(&mut self, pkey: i64, store: &mut dyn Store) -> Result<()> {
        store.delete(E::TABLE, &[pkey], PKEY)?;
        self.cancel(pkey);
        Ok(())
    }

    /// Flushes the pending batches inside one transaction, saving referenced
    /// entity types first so foreign keys always point at persisted rows.
    ///
    /// New rows are inserted without keys and then assigned `max + 1`,
    /// `max + 2`, ... in registration order, mirroring what the backend
    /// computes for them. The unit of work assumes a single writer.
    pub fn save_all(&mut self, registry: &mut Registry, store: &mut dyn Store) -> Result<()> {
        if self.identity.is_empty() {
            return Ok(());
        }
        store.begin_transaction()?;
        match self.save_batches(registry, store) {
            Ok(()) => store.commit(),
            Err(error) => {
                let _ = store.rollback();
                Err(error)
            }
        }
    }

    fn save_batches(&mut self, registry: &mut Registry, store: &mut dyn Store) -> Result<()> {
        for reference in E::depend_entities() {
            registry.save_all(reference.entity, store)?;
        }
        if !self.created.is_empty() {
            let max = store.get_max(E::TABLE, PKEY)?;
            let mut rows = self
                .created
                .iter()
                .filter_map(|k| self.identity.get(k))
                .map(|rc| rc.borrow().to_map(true))
                .collect::<Vec<RowValues>>();
            if rows.iter().any(|row| row.is_empty()) {
                // An all-null record still needs a row; serialize the full
                // column set with explicit nulls instead of an empty insert.
                rows = self
                    .created
                    .iter()
                    .filter_map(|k| self.identity.get(k))
                    .map(|rc| rc.borrow().to_map(false))
                    .collect();
            }
            let types = E::types_for(&rows[0]);
            store.create(E::TABLE, &rows, &types)?;
            let created = std::mem::take(&mut self.created);
            for (offset, tmp) in created.into_iter().enumerate() {
                let pkey = max + 1 + offset as i64;
                if let Some(rc) = self.identity.remove(&tmp) {
                    {
                        let mut entity = rc.borrow_mut();
                        entity.core_mut().pkey = pkey;
                        entity.core_mut().activation = Activation::Unloaded;
                    }
                    self.identity.insert(pkey, rc);
                }
                self.updated.retain(|k| *k != tmp);
            }
        }
        if !self.updated.is_empty() {
            let rows = self
                .updated
                .iter()
                .filter_map(|k| self.identity.get(k))
                .map(|rc| rc.borrow().to_map(true))
                .collect::<Vec<RowValues>>();
            if !rows.is_empty() {
                let types = E::types_for(&rows[0]);
                store.update(E::TABLE, &rows, &types, PKEY)?;
            }
            self.updated.clear();
        }
        Ok(())
    }
}

/// Type-erased view of a [`Repository`], letting the [`Registry`] drive
/// dependency-ordered saves across entity types.
pub trait AnyRepository: Any {
    fn entity_name(&self) -> &'static str;

    fn save_all(&mut self, registry: &mut Registry, store: &mut dyn Store) -> Result<()>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Entity> AnyRepository for Repository<E> {
    fn entity_name(&self) -> &'static str {
        E::NAME
    }

    fn save_all(&mut self, registry: &mut Registry, store: &mut dyn Store) -> Result<()> {
        Repository::save_all(self, registry, store)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The repositories of one unit of work, keyed by entity name. A registry
/// is an explicit context object; create one per unit of work and drop it
/// when done.
#[derive(Default)]
pub struct Registry {
    repos: HashMap<&'static str, Box<dyn AnyRepository>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_repo<E: Entity>(&mut self, factory: fn(i64) -> E) {
        self.repos
            .insert(E::NAME, Box::new(Repository::new(factory)));
    }

    pub fn repo<E: Entity>(&mut self) -> Option<&mut Repository<E>> {
        self.repos
            .get_mut(E::NAME)
            .and_then(|repo| repo.as_any_mut().downcast_mut())
    }

    /// Saves one entity type by name. The repository is taken out of the
    /// map for the duration of its save, so a reference cycle between entity
    /// types settles instead of recursing forever; an unknown or in-flight
    /// name is a no-op.
    pub fn save_all(&mut self, name: &str, store: &mut dyn Store) -> Result<()> {
        let Some(mut repo) = self.repos.remove(name) else {
            return Ok(());
        };
        let result = repo.save_all(self, store);
        self.repos.insert(repo.entity_name(), repo);
        result
    }
}
