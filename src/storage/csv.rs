use std::io::BufRead;

use super::table::{dedupe_column_names, Column, DataType, Row, Schema, Table, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No columns to parse from file")]
    EmptyFile,
}

/// Tokens read as NULL in delimited input.
const NULL_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null"];

/// Best-effort reader for comma or tab separated text with a header row.
///
/// Parsing is lossy on purpose: a record with more fields than the header,
/// or one whose quote never closes before end of input, is dropped and
/// counted in [`CsvOutcome::skipped`]. Records with fewer fields are padded
/// with NULL.
pub struct CsvReader {
    delimiter: char,
}

/// A parsed table plus the number of malformed records that were dropped.
#[derive(Debug)]
pub struct CsvOutcome {
    pub table: Table,
    pub skipped: usize,
}

enum Record {
    Fields(Vec<String>),
    Unterminated,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    pub fn tsv() -> Self {
        Self::new().with_delimiter('\t')
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read_from_reader<R: BufRead>(
        &self,
        reader: R,
        table_name: &str,
    ) -> Result<CsvOutcome, CsvError> {
        let mut lines = reader.lines();
        let mut skipped = 0;

        // Header: first non-blank record
        let headers = loop {
            match self.next_record(&mut lines)? {
                None => return Err(CsvError::EmptyFile),
                Some(Record::Fields(fields)) => break dedupe_column_names(fields),
                Some(Record::Unterminated) => return Err(CsvError::EmptyFile),
            }
        };

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        while let Some(record) = self.next_record(&mut lines)? {
            match record {
                Record::Fields(fields) if fields.len() <= headers.len() => raw_rows.push(fields),
                _ => skipped += 1,
            }
        }

        let types = infer_types(&raw_rows, headers.len());

        let columns: Vec<Column> = headers
            .iter()
            .zip(types.iter())
            .map(|(name, dtype)| Column::new(name.clone(), dtype.clone()))
            .collect();
        let schema = Schema::new(columns);

        let rows: Vec<Row> = raw_rows
            .iter()
            .map(|raw_row| {
                let values: Vec<Value> = types
                    .iter()
                    .enumerate()
                    .map(|(i, dtype)| match raw_row.get(i) {
                        Some(s) => parse_value(s, dtype),
                        None => Value::Null,
                    })
                    .collect();
                Row::new(values)
            })
            .collect();

        Ok(CsvOutcome {
            table: Table::with_rows(table_name, schema, rows),
            skipped,
        })
    }

    /// Pulls the next non-blank record, joining physical lines while a quoted
    /// field is still open. Each physical line is scanned once.
    fn next_record<I>(&self, lines: &mut I) -> Result<Option<Record>, CsvError>
    where
        I: Iterator<Item = std::io::Result<String>>,
    {
        let mut record = RecordParser::new(self.delimiter);

        loop {
            let line = match lines.next() {
                Some(line) => line?,
                None if record.is_empty() => return Ok(None),
                None => return Ok(Some(Record::Unterminated)),
            };
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if record.is_empty() && line.trim().is_empty() {
                continue;
            }

            if record.feed(line) {
                return Ok(Some(Record::Fields(record.finish())));
            }
        }
    }
}

/// Incremental splitter for one logical record.
///
/// A quote opens a quoted section only at the start of a field; anywhere
/// else it is a literal character.
struct RecordParser {
    delimiter: char,
    fields: Vec<String>,
    current_field: String,
    field_started: bool,
    in_quotes: bool,
    lines: usize,
}

impl RecordParser {
    fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            fields: Vec::new(),
            current_field: String::new(),
            field_started: false,
            in_quotes: false,
            lines: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Consumes one physical line; `true` once the record is complete.
    fn feed(&mut self, line: &str) -> bool {
        if self.lines > 0 {
            // Only reachable inside an open quote
            self.current_field.push('\n');
        }
        self.lines += 1;

        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if self.in_quotes {
                if c == '"' {
                    // Check for escaped quote
                    if chars.peek() == Some(&'"') {
                        self.current_field.push('"');
                        chars.next();
                    } else {
                        self.in_quotes = false;
                    }
                } else {
                    self.current_field.push(c);
                }
            } else if c == '"' && !self.field_started {
                self.in_quotes = true;
                self.field_started = true;
            } else if c == self.delimiter {
                self.fields.push(std::mem::take(&mut self.current_field));
                self.field_started = false;
            } else {
                self.current_field.push(c);
                self.field_started = true;
            }
        }

        !self.in_quotes
    }

    fn finish(mut self) -> Vec<String> {
        self.fields.push(self.current_field);
        self.fields
    }
}

fn is_null_token(value: &str) -> bool {
    let value = value.trim();
    NULL_TOKENS.iter().any(|t| value.eq_ignore_ascii_case(t))
}

fn infer_types(rows: &[Vec<String>], num_columns: usize) -> Vec<DataType> {
    let mut types = vec![DataType::Null; num_columns];

    for row in rows {
        for (i, value) in row.iter().enumerate().take(num_columns) {
            let inferred = infer_single_type(value);
            types[i] = merge_types(&types[i], &inferred);
        }
    }

    // All-NULL columns are imported as text
    for dtype in &mut types {
        if *dtype == DataType::Null {
            *dtype = DataType::String;
        }
    }

    types
}

fn infer_single_type(value: &str) -> DataType {
    if is_null_token(value) {
        return DataType::Null;
    }

    let value = value.trim();
    if value.parse::<i64>().is_ok() {
        return DataType::Integer;
    }
    if value.parse::<f64>().is_ok() {
        return DataType::Float;
    }

    DataType::String
}

fn merge_types(current: &DataType, new: &DataType) -> DataType {
    match (current, new) {
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
            DataType::Float
        }
        (a, b) if a == b => a.clone(),
        _ => DataType::String,
    }
}

fn parse_value(value: &str, dtype: &DataType) -> Value {
    if is_null_token(value) {
        return Value::Null;
    }

    match dtype {
        DataType::Integer => value.trim().parse::<i64>().map(Value::Integer).unwrap_or(Value::Null),
        DataType::Float => value.trim().parse::<f64>().map(Value::Float).unwrap_or(Value::Null),
        DataType::String => Value::String(value.to_string()),
        DataType::Null => Value::Null,
    }
}
