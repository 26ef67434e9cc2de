use crate::{SqliteSqlWriter, extract::extract_value};
use silo_core::{
    BindClass, Cond, FieldTypes, Op, PKEY, Params, Query, Result, RowLabeled, RowNames, RowValues,
    SqlWriter, Store, StoreError, TypeTag, Value, clip, params, tag_of,
};
use std::sync::Arc;

/// One sqlite connection with its reference-counted transaction depth.
pub struct SqliteStore {
    connection: Option<rusqlite::Connection>,
    depth: u32,
    writer: SqliteSqlWriter,
}

impl SqliteStore {
    /// Opens `sqlite://<path>`, where the path `:memory:` yields an
    /// in-memory database.
    pub fn connect(url: &str) -> Result<Self> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        let connection = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(path)
        }
        .map_err(|e| StoreError::Connect(e.to_string()))?;
        log::info!("Connected to sqlite database {}", path);
        Ok(Self {
            connection: Some(connection),
            depth: 0,
            writer: SqliteSqlWriter,
        })
    }

    /// Runs raw DDL, for schema setup.
    pub fn execute_ddl(&mut self, sql: &str) -> Result<()> {
        log::debug!("Executing:\n{}", clip(sql));
        self.connection()?
            .execute_batch(sql)
            .map_err(|e| StoreError::Execute(e.to_string()))
    }

    fn connection(&self) -> Result<&rusqlite::Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| StoreError::Driver("connection is closed".into()))
    }

    fn query_int(&mut self, sql: &str) -> Result<Option<i64>> {
        log::debug!("Executing:\n{}", clip(sql));
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(sql)
            .map_err(|e| StoreError::Statement(e.to_string()))?;
        let mut rows = statement.raw_query();
        let row = rows
            .next()
            .map_err(|e| StoreError::Fetch(e.to_string()))?
            .ok_or(StoreError::NoData)?;
        let raw = row
            .get_ref(0)
            .map_err(|e| StoreError::Fetch(e.to_string()))?;
        match extract_value(raw, TypeTag::Int)? {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(v)),
            other => Err(StoreError::Fetch(format!(
                "expected an integer column, got {:?}",
                other
            ))),
        }
    }

    fn execute_batch_rows(
        &mut self,
        sql: &str,
        rows: &[RowValues],
        types: &FieldTypes,
    ) -> Result<()> {
        log::debug!("Executing:\n{}", clip(sql));
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(sql)
            .map_err(|e| StoreError::Statement(e.to_string()))?;
        for row in rows {
            for (name, value) in row.iter() {
                let index = statement
                    .parameter_index(&format!(":{}", name))
                    .map_err(|e| StoreError::Bind(e.to_string()))?
                    .ok_or_else(|| StoreError::Bind(format!("unknown parameter :{}", name)))?;
                let class = tag_of(types, name).unwrap_or(TypeTag::Text).bind_class();
                statement
                    .raw_bind_parameter(index, bind_value(value, class)?)
                    .map_err(|e| StoreError::Bind(e.to_string()))?;
            }
            statement
                .raw_execute()
                .map_err(|e| StoreError::Execute(e.to_string()))?;
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn transaction_depth(&self) -> u32 {
        self.depth
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.depth == 0 {
            self.connection()?
                .execute_batch("begin")
                .map_err(|e| StoreError::TransactionBegin(e.to_string()))?;
        }
        self.depth += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        match self.depth {
            0 => Ok(()),
            1 => {
                self.connection()?
                    .execute_batch("commit")
                    .map_err(|e| StoreError::Commit(e.to_string()))?;
                self.depth = 0;
                Ok(())
            }
            _ => {
                self.depth -= 1;
                Ok(())
            }
        }
    }

    fn rollback(&mut self) -> Result<()> {
        if self.depth > 0 {
            self.depth = 0;
            self.connection()?
                .execute_batch("rollback")
                .map_err(|e| StoreError::Rollback(e.to_string()))?;
        }
        Ok(())
    }

    fn select(&mut self, query: &Query, params: &Params, lock: bool) -> Result<Vec<RowLabeled>> {
        let mut sql = String::new();
        self.writer.write_select(&mut sql, query, params, lock);
        log::debug!("Executing:\n{}", clip(&sql));
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(&sql)
            .map_err(|e| StoreError::Statement(e.to_string()))?;
        let labels: RowNames = statement
            .column_names()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into();
        let tags = labels
            .iter()
            .map(|name| query.field_tag(name).unwrap_or(TypeTag::Text))
            .collect::<Vec<_>>();
        let mut rows = statement.raw_query();
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| StoreError::Fetch(e.to_string()))? {
            let mut values = Vec::with_capacity(tags.len());
            for (i, tag) in tags.iter().enumerate() {
                let raw = row
                    .get_ref(i)
                    .map_err(|e| StoreError::Fetch(e.to_string()))?;
                values.push(extract_value(raw, *tag)?);
            }
            result.push(RowLabeled::new(Arc::clone(&labels), values.into()));
        }
        Ok(result)
    }

    fn get(
        &mut self,
        table: &str,
        pkey: i64,
        fields: &FieldTypes,
        lock: bool,
    ) -> Result<RowLabeled> {
        let query = Query::new(table, fields.to_vec(), Cond::leaf(PKEY, Op::Eq, PKEY));
        let params = params! { PKEY => pkey };
        let rows = self.select(&query, &params, lock)?;
        rows.into_iter().next().ok_or(StoreError::NoData)
    }

    fn count(&mut self, query: &Query, params: &Params) -> Result<i64> {
        let mut sql = String::new();
        self.writer.write_count(&mut sql, query, params);
        Ok(self.query_int(&sql)?.unwrap_or(0))
    }

    fn get_max(&mut self, table: &str, column: &str) -> Result<i64> {
        let mut sql = String::new();
        self.writer.write_max(&mut sql, table, column);
        Ok(self.query_int(&sql)?.unwrap_or(0))
    }

    fn create(&mut self, table: &str, rows: &[RowValues], types: &FieldTypes) -> Result<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let columns = first.iter().map(|(name, _)| *name).collect::<Vec<_>>();
        let mut sql = String::new();
        self.writer.write_insert(&mut sql, table, &columns);
        self.execute_batch_rows(&sql, rows, types)
    }

    fn update(
        &mut self,
        table: &str,
        rows: &[RowValues],
        types: &FieldTypes,
        key_column: &str,
    ) -> Result<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let columns = first
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| *name != key_column)
            .collect::<Vec<_>>();
        let mut sql = String::new();
        self.writer.write_update(&mut sql, table, &columns, key_column);
        self.execute_batch_rows(&sql, rows, types)
    }

    fn delete(&mut self, table: &str, keys: &[i64], key_column: &str) -> Result<()> {
        let mut sql = String::new();
        self.writer.write_delete(&mut sql, table, key_column);
        log::debug!("Executing:\n{}", clip(&sql));
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(&sql)
            .map_err(|e| StoreError::Statement(e.to_string()))?;
        let index = statement
            .parameter_index(&format!(":{}", key_column))
            .map_err(|e| StoreError::Bind(e.to_string()))?
            .ok_or_else(|| StoreError::Bind(format!("unknown parameter :{}", key_column)))?;
        for key in keys {
            statement
                .raw_bind_parameter(index, *key)
                .map_err(|e| StoreError::Bind(e.to_string()))?;
            statement
                .raw_execute()
                .map_err(|e| StoreError::Execute(e.to_string()))?;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        if self.depth > 0 {
            self.depth = 0;
            let _ = connection.execute_batch("rollback");
        }
        connection.close().map_err(|(connection, e)| {
            self.connection = Some(connection);
            StoreError::Disconnect(e.to_string())
        })
    }
}

/// Converts a value to its sqlite bind representation according to the
/// declared column's bind class. Mismatches that cannot be converted
/// losslessly are bind errors, never silent coercions.
fn bind_value(value: &Value, class: BindClass) -> Result<rusqlite::types::Value> {
    use rusqlite::types::Value as Sql;
    if value.is_null() {
        return Ok(Sql::Null);
    }
    match class {
        BindClass::Null => Ok(Sql::Null),
        BindClass::Bool => match value {
            Value::Bool(v) => Ok(Sql::Integer(*v as i64)),
            Value::Int(v @ (0 | 1)) => Ok(Sql::Integer(*v)),
            Value::Text(v) => match v.as_str() {
                "true" | "1" => Ok(Sql::Integer(1)),
                "false" | "0" => Ok(Sql::Integer(0)),
                _ => Err(StoreError::Bind(format!("not a boolean: {:?}", v))),
            },
            other => Err(StoreError::Bind(format!("not a boolean: {:?}", other))),
        },
        BindClass::Int => match value {
            Value::Int(v) => Ok(Sql::Integer(*v)),
            Value::Text(v) => v
                .parse()
                .map(Sql::Integer)
                .map_err(|_| StoreError::Bind(format!("not an integer: {:?}", v))),
            other => Err(StoreError::Bind(format!("not an integer: {:?}", other))),
        },
        BindClass::Text => Ok(Sql::Text(value.to_text())),
    }
}
