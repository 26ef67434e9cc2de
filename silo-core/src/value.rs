use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

/// Column datetime format, `2024-01-31 09:30:00`.
pub const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Declared type of an entity field. Drives value conversion on hydration
/// and the parameter bind classification on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    Text,
    List,
    Enum,
    Datetime,
    Object,
    Entity,
}

/// How a value of a given [`TypeTag`] is bound to a prepared statement:
/// null as null, bool as bool, int as int, everything else as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindClass {
    Null,
    Bool,
    Int,
    Text,
}

impl TypeTag {
    pub fn bind_class(&self) -> BindClass {
        match self {
            TypeTag::Null => BindClass::Null,
            TypeTag::Bool => BindClass::Bool,
            TypeTag::Int => BindClass::Int,
            _ => BindClass::Text,
        }
    }

    /// Entity-typed fields are framework links, never stored columns.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, TypeTag::Entity)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Datetime(PrimitiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The natural tag of the value itself, regardless of any declared type.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(..) => TypeTag::Bool,
            Value::Int(..) => TypeTag::Int,
            Value::Float(..) => TypeTag::Float,
            Value::Text(..) => TypeTag::Text,
            Value::List(..) => TypeTag::List,
            Value::Datetime(..) => TypeTag::Datetime,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<PrimitiveDateTime> {
        match self {
            Value::Datetime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Plain text rendering used when a value is bound as a text parameter.
    /// This is not SQL: no quoting, no escaping.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => ["false", "true"][*v as usize].into(),
            Value::Int(v) => {
                let mut buffer = itoa::Buffer::new();
                buffer.format(*v).into()
            }
            Value::Float(v) => {
                let mut buffer = ryu::Buffer::new();
                buffer.format(*v).into()
            }
            Value::Text(v) => v.clone(),
            Value::List(items) => {
                let texts = items.iter().map(Value::to_text).collect::<Vec<_>>();
                texts.join(",")
            }
            Value::Datetime(v) => v
                .format(DATETIME_FORMAT)
                .unwrap_or_else(|_| String::new()),
        }
    }

    /// Convert a raw value to the declared tag. Only lossless paths succeed;
    /// `None` means the field must be skipped and the mismatch reported.
    pub fn convert(tag: TypeTag, value: Value) -> Option<Value> {
        if value.is_null() || tag == TypeTag::Null {
            return Some(Value::Null);
        }
        match (tag, value) {
            (TypeTag::Bool, Value::Bool(v)) => Some(Value::Bool(v)),
            (TypeTag::Bool, Value::Int(0)) => Some(Value::Bool(false)),
            (TypeTag::Bool, Value::Int(1)) => Some(Value::Bool(true)),
            (TypeTag::Bool, Value::Text(v)) => match v.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (TypeTag::Int, Value::Int(v)) => Some(Value::Int(v)),
            (TypeTag::Int, Value::Text(v)) => v.parse().ok().map(Value::Int),
            (TypeTag::Float, Value::Float(v)) => Some(Value::Float(v)),
            (TypeTag::Float, Value::Int(v)) => Some(Value::Float(v as f64)),
            (TypeTag::Float, Value::Text(v)) => v.parse().ok().map(Value::Float),
            (TypeTag::Text, Value::Text(v)) => Some(Value::Text(v)),
            (TypeTag::Text, v @ (Value::Int(..) | Value::Float(..))) => {
                Some(Value::Text(v.to_text()))
            }
            (TypeTag::List, Value::List(v)) => Some(Value::List(v)),
            (TypeTag::Datetime, Value::Datetime(v)) => Some(Value::Datetime(v)),
            (TypeTag::Datetime, Value::Text(v)) => {
                PrimitiveDateTime::parse(&v, DATETIME_FORMAT)
                    .ok()
                    .map(Value::Datetime)
            }
            // Enums travel as their raw database representation.
            (TypeTag::Enum, v @ (Value::Int(..) | Value::Text(..))) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(value: PrimitiveDateTime) -> Self {
        Value::Datetime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
