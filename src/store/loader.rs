use std::path::Path;

use tracing::{debug, warn};

use crate::storage::compression::{self, Compression};
use crate::storage::csv::CsvReader;
use crate::storage::json::JsonReader;
use crate::storage::table::Table;

use super::context::Store;
use super::error::{FqError, Result};

/// Logical layout of an input file, independent of compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Jsonl,
    Csv,
    Tsv,
}

/// Format and compression resolved from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputKind {
    pub format: FileFormat,
    pub compression: Compression,
}

/// Imports input files into a [`Store`], one table per file.
pub struct FileLoader {
    store: Store,
}

impl FileLoader {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Loads `path` and replaces the table named after it. Returns the table name.
    pub fn load_file(&mut self, path: &Path) -> Result<String> {
        detect_input_kind(path)?;
        let table_name = table_name_for(path)?;
        let table = load_table(path, &table_name)?;
        self.store.import_table(&table_name, &table)?;
        Ok(table_name)
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// Reads one input file into a table named `table_name`.
///
/// The extension is checked before the path, and both before any read.
pub fn load_table(path: &Path, table_name: &str) -> Result<Table> {
    let kind = detect_input_kind(path)?;

    if !path.exists() {
        return Err(FqError::FileNotFound(path.display().to_string()));
    }

    let bytes = compression::read_to_bytes(path, kind.compression)?;
    let shown = path.display().to_string();
    let text = String::from_utf8(bytes).map_err(|e| FqError::Encoding {
        path: shown.clone(),
        offset: e.utf8_error().valid_up_to(),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let table = match kind.format {
        FileFormat::Json | FileFormat::Jsonl => {
            let reader = JsonReader::new();
            let parsed = if kind.format == FileFormat::Json {
                reader.read_document(text, table_name)
            } else {
                reader.read_lines(text, table_name)
            };
            parsed.map_err(|source| FqError::Json {
                path: shown.clone(),
                source,
            })?
        }
        FileFormat::Csv | FileFormat::Tsv => {
            let reader = if kind.format == FileFormat::Tsv {
                CsvReader::tsv()
            } else {
                CsvReader::new()
            };
            let outcome = reader
                .read_from_reader(text.as_bytes(), table_name)
                .map_err(|source| FqError::Csv {
                    path: shown.clone(),
                    source,
                })?;
            if outcome.skipped > 0 {
                warn!(path = %shown, skipped = outcome.skipped, "skipped malformed records");
            }
            outcome.table
        }
    };

    debug!(
        path = %shown,
        format = ?kind.format,
        compression = kind.compression.name(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded file"
    );

    Ok(table)
}

/// Resolves format and compression from the file name, case-insensitively.
/// `users.csv.gz` is gzip-wrapped CSV; a bare `data.gz` is rejected.
pub fn detect_input_kind(path: &Path) -> Result<InputKind> {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut parts = file_name.rsplit('.');
    let last = parts.next().unwrap_or_default();
    let unsupported = || {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| path.display().to_string());
        FqError::UnsupportedFormat(ext)
    };

    // rsplit always yields at least one piece; a name without a dot has no extension
    if !file_name.contains('.') {
        return Err(unsupported());
    }

    let (inner, compression) = match Compression::from_extension(last) {
        Some(compression) => {
            let inner = parts.next().ok_or_else(unsupported)?;
            if parts.next().is_none() {
                // "gz" alone, no inner extension
                return Err(unsupported());
            }
            (inner, compression)
        }
        None => (last, Compression::None),
    };

    let format = match inner {
        "json" => FileFormat::Json,
        "jsonl" => FileFormat::Jsonl,
        "csv" => FileFormat::Csv,
        "tsv" => FileFormat::Tsv,
        _ => return Err(unsupported()),
    };

    Ok(InputKind {
        format,
        compression,
    })
}

/// Table name for an input file: its file name up to the first `.`.
pub fn table_name_for(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| FqError::InvalidTableName(path.display().to_string()))?;

    let name = file_name.split('.').next().unwrap_or_default();
    if name.is_empty() {
        return Err(FqError::InvalidTableName(file_name.to_string()));
    }

    Ok(name.to_string())
}
