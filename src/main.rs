use std::io::{stdout, BufWriter};
use std::process::ExitCode;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use fq::cli::Cli;
use fq::{write_table, FileLoader, FqError, OutputFormat, Store};

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse_args();
    init_tracing();

    let format = match cli.output.parse::<OutputFormat>() {
        Ok(format) => format,
        Err(e) => return report(&e),
    };

    let store = match Store::open(&cli.cache) {
        Ok(store) => store,
        Err(e) => return report(&e),
    };

    let mut loader = FileLoader::new(store);
    let result = run(&mut loader, &cli, format);
    // The connection is closed on every path, before anything is reported
    let closed = loader.into_store().close();

    match result.and_then(|rows| closed.map(|_| rows)) {
        Ok(rows) => {
            eprintln!(
                "{} rows selected ({:.2} seconds)",
                rows,
                start.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

/// Imports every input in order, runs the query and prints the result.
/// Returns the number of rows selected.
fn run(loader: &mut FileLoader, cli: &Cli, format: OutputFormat) -> fq::Result<usize> {
    for path in &cli.files {
        loader.load_file(path)?;
    }

    let result = loader.store().execute_sql(&cli.query)?;

    let mut out = BufWriter::new(stdout().lock());
    write_table(&mut out, &result, format)?;

    Ok(result.row_count())
}

fn report(e: &FqError) -> ExitCode {
    if e.is_operational() || e.is_usage() {
        eprintln!("{}", e);
    } else {
        eprintln!("Internal error. cause {}", e);
        eprintln!("{:?}", e);
    }
    ExitCode::from(1)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
