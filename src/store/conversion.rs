use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

use crate::storage::table::{DataType, Value};

/// Reads one SQLite cell, keeping its storage class.
pub fn value_from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Maps a declared column type to a table data type using SQLite's affinity
/// rules. Expression columns carry no declared type.
pub fn data_type_from_decl(decl_type: Option<&str>) -> DataType {
    let Some(decl) = decl_type else {
        return DataType::Null;
    };

    match decl.to_uppercase().as_str() {
        t if t.contains("INT") => DataType::Integer,
        t if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") => DataType::String,
        t if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") => DataType::Float,
        _ => DataType::Null,
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::String(s) => ToSqlOutput::from(s.as_str()),
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
        })
    }
}

/// Double-quotes an identifier for use in generated SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
