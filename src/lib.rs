pub mod cli;
pub mod output;
pub mod storage;
pub mod store;

pub use output::{write_table, OutputFormat};
pub use storage::table::{Column, DataType, Row, Schema, Table, Value};
pub use store::{FileLoader, FqError, Result, Store};
