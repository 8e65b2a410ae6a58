use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde_json::{Map, Value as JsonValue};

use crate::storage::table::{Row, Table};
use crate::store::error::FqError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Csv,
    Tsv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            other => Err(FqError::InvalidOutputFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `table` to `out` in `format`.
///
/// The JSON formats key each value by column name. The delimited formats
/// print a header only when there is at least one row, so an empty result
/// produces no output at all, while `json` still prints `[]`.
pub fn write_table<W: Write>(out: &mut W, table: &Table, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Jsonl => {
            for row in &table.rows {
                serde_json::to_writer(&mut *out, &row_to_json(table, row))?;
                writeln!(out)?;
            }
        }
        OutputFormat::Json => {
            let rows: Vec<JsonValue> = table.rows.iter().map(|r| row_to_json(table, r)).collect();
            serde_json::to_writer(&mut *out, &rows)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_delimited(out, table, ',')?,
        OutputFormat::Tsv => write_delimited(out, table, '\t')?,
    }

    out.flush()
}

fn row_to_json(table: &Table, row: &Row) -> JsonValue {
    let mut object = Map::new();
    for (column, value) in table.schema.columns.iter().zip(row.values.iter()) {
        // First occurrence wins for repeated result names
        if !object.contains_key(&column.name) {
            object.insert(column.name.clone(), value.to_json());
        }
    }
    JsonValue::Object(object)
}

fn write_delimited<W: Write>(out: &mut W, table: &Table, delimiter: char) -> io::Result<()> {
    if table.rows.is_empty() {
        return Ok(());
    }

    let separator = delimiter.to_string();
    let header: Vec<String> = table
        .column_names()
        .iter()
        .map(|name| escape_field(name, delimiter))
        .collect();
    writeln!(out, "{}", header.join(&separator))?;

    for row in &table.rows {
        let values: Vec<String> = row
            .values
            .iter()
            .map(|v| escape_field(&v.to_field(), delimiter))
            .collect();
        writeln!(out, "{}", values.join(&separator))?;
    }

    Ok(())
}

fn escape_field(s: &str, delimiter: char) -> String {
    if s.contains(delimiter) || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
