use crate::{Cond, Query, RowLabeled, RowValues, TypeTag, Value};
use time::PrimitiveDateTime;

/// Reserved columns present on every entity.
pub const PKEY: &str = "pkey";
pub const CREATE_DATE: &str = "create_date";
pub const UPDATE_DATE: &str = "update_date";
pub const DELETE_FLAG: &str = "delete_flag";

/// Link from a foreign-key field to the entity it references. Repositories
/// use these to persist parents before the children that point at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    /// [`Entity::NAME`] of the referenced entity.
    pub entity: &'static str,
    /// Column of this entity holding the referenced primary key.
    pub key_field: &'static str,
}

/// Static per-field metadata: column name, display label, declared type and
/// a typed accessor pair resolved at compile time. Table order is
/// significant; it defines the default projection and the default
/// AND-joined search.
pub struct FieldDef<E> {
    pub column: &'static str,
    pub label: &'static str,
    pub tag: TypeTag,
    pub reference: Option<FieldRef>,
    pub get: fn(&E) -> Value,
    pub set: fn(&mut E, Value),
}

impl<E> Clone for FieldDef<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for FieldDef<E> {}

/// Load state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Unloaded,
    Loading,
    Activated,
    LoadFailed,
}

/// State shared by every entity: primary key, activation and the reserved
/// bookkeeping columns.
///
/// Key lifecycle: a fresh entity holds 0 (unassigned), registration assigns
/// a unique negative temporary key, and a successful batch save assigns the
/// final positive key.
#[derive(Debug, Clone, Default)]
pub struct EntityCore {
    pub pkey: i64,
    pub activation: Activation,
    pub create_date: Option<PrimitiveDateTime>,
    pub update_date: Option<PrimitiveDateTime>,
    pub delete_flag: Option<bool>,
}

/// Field definitions for the reserved columns, shared by every entity's
/// field table.
pub fn core_fields<E: Entity>() -> [FieldDef<E>; 4] {
    [
        FieldDef {
            column: PKEY,
            label: "primary key",
            tag: TypeTag::Int,
            reference: None,
            get: |e| Value::Int(e.core().pkey),
            set: |e, v| {
                if let Some(v) = v.as_int() {
                    e.core_mut().pkey = v;
                }
            },
        },
        FieldDef {
            column: CREATE_DATE,
            label: "creation date",
            tag: TypeTag::Datetime,
            reference: None,
            get: |e| e.core().create_date.into(),
            set: |e, v| e.core_mut().create_date = v.as_datetime(),
        },
        FieldDef {
            column: UPDATE_DATE,
            label: "update date",
            tag: TypeTag::Datetime,
            reference: None,
            get: |e| e.core().update_date.into(),
            set: |e, v| e.core_mut().update_date = v.as_datetime(),
        },
        FieldDef {
            column: DELETE_FLAG,
            label: "delete flag",
            tag: TypeTag::Bool,
            reference: None,
            get: |e| e.core().delete_flag.into(),
            set: |e, v| e.core_mut().delete_flag = v.as_bool(),
        },
    ]
}

/// One persisted record type: a static field table plus the shared
/// [`EntityCore`] state.
pub trait Entity: Sized + 'static {
    /// Entity name used by repositories and dependency references.
    const NAME: &'static str;
    /// Backing table.
    const TABLE: &'static str;

    fn fields() -> &'static [FieldDef<Self>];

    fn core(&self) -> &EntityCore;

    fn core_mut(&mut self) -> &mut EntityCore;

    fn field(name: &str) -> Option<&'static FieldDef<Self>> {
        Self::fields().iter().find(|f| f.column == name)
    }

    /// Best-effort hydration from a fetched row. Entity-typed fields are
    /// skipped, and a value that fails conversion to its declared type is
    /// reported and skipped without aborting the rest of the load.
    fn load_from_map(&mut self, row: &RowLabeled, only_if_unset: bool) {
        for field in Self::fields() {
            if !field.tag.is_persisted() {
                continue;
            }
            if only_if_unset && !(field.get)(self).is_null() {
                continue;
            }
            let Some(value) = row.get_column(field.column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match Value::convert(field.tag, value.clone()) {
                Some(converted) => (field.set)(self, converted),
                None => log::warn!(
                    "{}.{}: cannot convert {:?} to {:?}, field skipped",
                    Self::NAME,
                    field.column,
                    value,
                    field.tag
                ),
            }
        }
    }

    /// Serializes the persisted fields. Entity-typed fields are excluded and
    /// the primary key is withheld while it is still a temporary value.
    fn to_map(&self, skip_nulls: bool) -> RowValues {
        Self::fields()
            .iter()
            .filter_map(|field| {
                if !field.tag.is_persisted() {
                    return None;
                }
                if field.column == PKEY && self.core().pkey < 0 {
                    return None;
                }
                let value = (field.get)(self);
                if skip_nulls && value.is_null() {
                    return None;
                }
                Some((field.column, value))
            })
            .collect()
    }

    /// Declared types of every persisted field, in field-table order.
    fn all_types() -> Vec<(String, TypeTag)> {
        Self::fields()
            .iter()
            .filter(|f| f.tag.is_persisted())
            .map(|f| (f.column.to_string(), f.tag))
            .collect()
    }

    /// Declared types of the columns present in a serialized row.
    fn types_for(row: &[(&'static str, Value)]) -> Vec<(String, TypeTag)> {
        row.iter()
            .filter_map(|(name, _)| Self::field(name).map(|f| (name.to_string(), f.tag)))
            .collect()
    }

    /// The referenced entities that must be persisted before this one.
    fn depend_entities() -> Vec<FieldRef> {
        Self::fields().iter().filter_map(|f| f.reference).collect()
    }

    /// The default search: every persisted field equal to a placeholder of
    /// its own name, joined with AND. Callers supply only the parameters
    /// they actually filled in.
    fn default_query() -> Query {
        let conditions = Cond::all(
            Self::fields()
                .iter()
                .filter(|f| f.tag.is_persisted())
                .map(|f| Cond::leaf(f.column, crate::Op::Eq, f.column))
                .collect(),
        );
        Query::new(Self::TABLE, Self::all_types(), conditions)
    }

    /// Logical delete: flips the delete flag, the row stays.
    fn mark_deleted(&mut self) {
        self.core_mut().delete_flag = Some(true);
    }
}
