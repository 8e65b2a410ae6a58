use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

use crate::storage::table::{Column, Row, Schema, Table};

use super::conversion::{data_type_from_decl, quote_identifier, value_from_sqlite};
use super::error::{FqError, Result};

/// Default cache file, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = ".fq_cache.db";

/// The SQLite database that imported tables live in for one run.
///
/// The file persists between runs; a table is only replaced when a file
/// with the same derived name is imported again.
pub struct Store {
    conn: Connection,
    table_names: Vec<String>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened store");

        Ok(Self {
            conn,
            table_names: Vec::new(),
        })
    }

    /// A private store that never touches disk.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            table_names: Vec::new(),
        })
    }

    /// Replaces `name` with the contents of `table`.
    ///
    /// Drop, create and load run in one transaction, so a failure leaves the
    /// previous table (if any) in place. Every column is declared `TEXT`.
    pub fn import_table(&mut self, name: &str, table: &Table) -> Result<()> {
        if table.column_count() == 0 {
            return Err(FqError::EmptyTable(name.to_string()));
        }

        let quoted_table = quote_identifier(name);
        let column_defs: Vec<String> = table
            .schema
            .columns
            .iter()
            .map(|c| format!("{} TEXT", quote_identifier(&c.name)))
            .collect();
        let placeholders = vec!["?"; table.column_count()].join(", ");

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quoted_table), [])?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", quoted_table, column_defs.join(", ")),
            [],
        )?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quoted_table, placeholders
            ))?;
            for row in &table.rows {
                insert.execute(rusqlite::params_from_iter(row.values.iter()))?;
            }
        }
        tx.commit()?;

        debug!(
            table = name,
            rows = table.row_count(),
            columns = table.column_count(),
            "imported table"
        );
        if !self.table_names.iter().any(|t| t == name) {
            self.table_names.push(name.to_string());
        }
        Ok(())
    }

    /// Runs one SQL statement and collects every result row.
    ///
    /// Anything the engine rejects (syntax, unknown table or column, more
    /// than one statement) comes back as [`FqError::Query`].
    pub fn execute_sql(&self, sql: &str) -> Result<Table> {
        debug!(sql, "executing query");
        let mut stmt = self.conn.prepare(sql).map_err(query_error)?;

        let columns: Vec<Column> = stmt
            .columns()
            .iter()
            .map(|c| Column::new(c.name(), data_type_from_decl(c.decl_type())))
            .collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(query_error)?;
        while let Some(row) = cursor.next().map_err(query_error)? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_from_sqlite(row.get_ref(i)?));
            }
            rows.push(Row::new(values));
        }

        Ok(Table::with_rows("result", Schema::new(columns), rows))
    }

    /// Tables imported through this handle, in import order.
    pub fn list_tables(&self) -> Vec<String> {
        self.table_names.clone()
    }

    /// Closes the underlying connection, reporting any failure to flush.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| FqError::Sqlite(e))
    }
}

fn query_error(e: rusqlite::Error) -> FqError {
    FqError::Query(e.to_string())
}
