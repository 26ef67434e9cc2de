use silo_core::{TypeTag, Value};
use time::macros::datetime;

#[test]
fn convert_follows_lossless_paths_only() {
    assert_eq!(
        Value::convert(TypeTag::Bool, Value::Int(1)),
        Some(Value::Bool(true))
    );
    assert_eq!(
        Value::convert(TypeTag::Bool, Value::Text("false".into())),
        Some(Value::Bool(false))
    );
    assert_eq!(Value::convert(TypeTag::Bool, Value::Int(2)), None);
    assert_eq!(
        Value::convert(TypeTag::Int, Value::Text("42".into())),
        Some(Value::Int(42))
    );
    assert_eq!(Value::convert(TypeTag::Int, Value::Text("4.2".into())), None);
    assert_eq!(
        Value::convert(TypeTag::Float, Value::Int(3)),
        Some(Value::Float(3.0))
    );
    assert_eq!(
        Value::convert(TypeTag::Text, Value::Int(7)),
        Some(Value::Text("7".into()))
    );
    // Ints never silently become floats' inverse: no float to int path.
    assert_eq!(Value::convert(TypeTag::Int, Value::Float(1.0)), None);
}

#[test]
fn convert_passes_nulls_through() {
    assert_eq!(Value::convert(TypeTag::Int, Value::Null), Some(Value::Null));
    assert_eq!(
        Value::convert(TypeTag::Null, Value::Int(1)),
        Some(Value::Null)
    );
}

#[test]
fn convert_enums_keep_their_raw_representation() {
    assert_eq!(
        Value::convert(TypeTag::Enum, Value::Int(2)),
        Some(Value::Int(2))
    );
    assert_eq!(
        Value::convert(TypeTag::Enum, Value::Text("red".into())),
        Some(Value::Text("red".into()))
    );
    assert_eq!(Value::convert(TypeTag::Enum, Value::Float(1.0)), None);
}

#[test]
fn datetime_round_trips_through_the_column_format() {
    let moment = datetime!(2024-01-31 09:30:00);
    assert_eq!(Value::Datetime(moment).to_text(), "2024-01-31 09:30:00");
    assert_eq!(
        Value::convert(TypeTag::Datetime, Value::Text("2024-01-31 09:30:00".into())),
        Some(Value::Datetime(moment))
    );
    assert_eq!(
        Value::convert(TypeTag::Datetime, Value::Text("31/01/2024".into())),
        None
    );
}

#[test]
fn to_text_renders_plain_values() {
    assert_eq!(Value::Null.to_text(), "");
    assert_eq!(Value::Bool(true).to_text(), "true");
    assert_eq!(Value::Int(-5).to_text(), "-5");
    assert_eq!(Value::Float(2.5).to_text(), "2.5");
    assert_eq!(
        Value::List(vec![Value::Int(1), Value::Text("a".into())]).to_text(),
        "1,a"
    );
}

#[test]
fn optional_values_fold_into_null() {
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some(5)), Value::Int(5));
}
