//! JSON and JSON Lines readers.
//!
//! Both formats use the records orientation: every row is a JSON object and
//! its keys are column names. A `.json` document must be a top-level array of
//! such objects; a `.jsonl` file holds one object per non-blank line.
//! Every value is coerced to text before import, except `null` which stays
//! NULL.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::table::{Column, DataType, Row, Schema, Table, Value};

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("invalid JSON on line {line}: {source}")]
    Line {
        line: usize,
        source: serde_json::Error,
    },
    #[error("expected a top-level array of objects, found {0}")]
    NotAnArray(&'static str),
    #[error("row {index} is {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },
    #[error("line {line} is {found}, expected an object")]
    LineNotAnObject { line: usize, found: &'static str },
}

#[derive(Debug, Default)]
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses a single JSON document holding an array of row objects.
    pub fn read_document(&self, text: &str, table_name: &str) -> Result<Table, JsonError> {
        let document: JsonValue = serde_json::from_str(text)?;
        let items = match document {
            JsonValue::Array(items) => items,
            other => return Err(JsonError::NotAnArray(kind_of(&other))),
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                JsonValue::Object(map) => Ok(map),
                other => Err(JsonError::NotAnObject {
                    index,
                    found: kind_of(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records_to_table(table_name, records))
    }

    /// Parses one JSON object per line; blank lines are ignored.
    pub fn read_lines(&self, text: &str, table_name: &str) -> Result<Table, JsonError> {
        let mut records = Vec::new();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: JsonValue = serde_json::from_str(line).map_err(|source| JsonError::Line {
                line: index + 1,
                source,
            })?;
            match value {
                JsonValue::Object(map) => records.push(map),
                other => {
                    return Err(JsonError::LineNotAnObject {
                        line: index + 1,
                        found: kind_of(&other),
                    })
                }
            }
        }

        Ok(records_to_table(table_name, records))
    }
}

/// Builds a text-typed table; columns are the union of keys in first-seen order.
fn records_to_table(table_name: &str, records: Vec<Map<String, JsonValue>>) -> Table {
    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let rows = records
        .into_iter()
        .map(|mut record| {
            let values = names
                .iter()
                .map(|name| record.remove(name).map(coerce_to_text).unwrap_or(Value::Null))
                .collect();
            Row::new(values)
        })
        .collect();

    let columns = names
        .into_iter()
        .map(|name| Column::new(name, DataType::String))
        .collect();

    Table::with_rows(table_name, Schema::new(columns), rows)
}

fn coerce_to_text(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::String(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
