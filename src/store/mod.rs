mod context;
mod conversion;
pub mod error;
mod loader;

pub use context::{Store, DEFAULT_CACHE_FILE};
pub use error::{FqError, Result};
pub use loader::{detect_input_kind, load_table, table_name_for, FileFormat, FileLoader, InputKind};
