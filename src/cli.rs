use clap::Parser;
use std::path::PathBuf;

use crate::store::DEFAULT_CACHE_FILE;

#[derive(Parser, Debug)]
#[command(name = "fq")]
#[command(author, version, about = "Run a SQL query over JSON, JSONL, CSV and TSV files")]
pub struct Cli {
    /// SQL query to run; each input file is a table named after the file
    #[arg(short, long)]
    pub query: String,

    /// Output format: json, jsonl, csv or tsv
    #[arg(short, long)]
    pub output: String,

    /// SQLite file that imported tables are cached in
    #[arg(long, env = "FQ_CACHE", default_value = DEFAULT_CACHE_FILE)]
    pub cache: PathBuf,

    /// Input files (.json, .jsonl, .csv, .tsv, optionally .gz, .bz2, .zip or .xz)
    pub files: Vec<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
