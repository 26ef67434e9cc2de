use rusqlite::types::ValueRef;
use silo_core::{Result, StoreError, TypeTag, Value};

/// Reads one column, converting to the declared tag where a lossless
/// conversion exists and keeping the natural value otherwise.
pub(crate) fn extract_value(raw: ValueRef<'_>, tag: TypeTag) -> Result<Value> {
    let value = match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(..) => {
            return Err(StoreError::Fetch("unexpected blob column".into()));
        }
    };
    Ok(Value::convert(tag, value.clone()).unwrap_or(value))
}
