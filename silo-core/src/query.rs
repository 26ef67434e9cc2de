use crate::{Cond, TypeTag, Value};
use std::collections::HashMap;

/// Named values resolved into a condition tree at compile time.
pub type Params = HashMap<String, Value>;

/// A reusable search definition: table, projected columns with their
/// declared types, a condition tree and optional sort and paging.
///
/// A query never embeds parameter values; they come from a [`Params`] map
/// supplied at execution time, so the same definition serves both full and
/// partial searches.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Projected columns, in order, with their declared types.
    pub fields: Vec<(String, TypeTag)>,
    pub conditions: Cond,
    pub sort: Vec<String>,
    /// Rows per page, 0 for no limit.
    pub page_lines: u32,
    /// Page number, 0-based.
    pub page: u32,
}

impl Query {
    pub fn new(
        table: impl Into<String>,
        fields: Vec<(String, TypeTag)>,
        conditions: Cond,
    ) -> Self {
        Self {
            table: table.into(),
            fields,
            conditions,
            sort: Vec::new(),
            page_lines: 0,
            page: 0,
        }
    }

    pub fn sorted(mut self, sort: Vec<String>) -> Self {
        self.sort = sort;
        self
    }

    pub fn paged(mut self, page_lines: u32, page: u32) -> Self {
        self.page_lines = page_lines;
        self.page = page;
        self
    }

    /// Declared type of a projected column, if it is part of the query.
    pub fn field_tag(&self, name: &str) -> Option<TypeTag> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, tag)| *tag)
    }
}

/// Builds a [`Params`] map from `name => value` pairs.
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Params::new();
        $(map.insert($name.into(), $crate::Value::from($value));)+
        map
    }};
}
