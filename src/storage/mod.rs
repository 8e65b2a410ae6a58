pub mod compression;
pub mod csv;
pub mod json;
pub mod table;

pub use compression::Compression;
pub use csv::CsvReader;
pub use json::JsonReader;
pub use table::{Column, DataType, Schema, Table, Value};
