use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fq::{write_table, FileLoader, FqError, OutputFormat, Store, Value};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn loader_in(dir: &TempDir) -> FileLoader {
    let store = Store::open(&dir.path().join("cache.db")).expect("open store");
    FileLoader::new(store)
}

fn render(loader: &FileLoader, sql: &str, format: OutputFormat) -> String {
    let result = loader.store().execute_sql(sql).expect("query");
    let mut buf = Vec::new();
    write_table(&mut buf, &result, format).expect("write");
    String::from_utf8(buf).expect("utf8")
}

#[test]
fn test_jsonl_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = "{\"id\":\"1\",\"name\":\"a\"}\n{\"id\":\"2\",\"name\":\"b\"}\n";
    let path = write_file(dir.path(), "people.jsonl", input.as_bytes());

    let mut loader = loader_in(&dir);
    assert_eq!(loader.load_file(&path).unwrap(), "people");

    assert_eq!(render(&loader, "SELECT * FROM people", OutputFormat::Jsonl), input);
}

#[test]
fn test_json_values_are_text() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "items.json",
        br#"[{"id": 1, "price": 2.5, "ok": true}, {"id": 2, "price": null}]"#,
    );

    let mut loader = loader_in(&dir);
    loader.load_file(&path).unwrap();

    assert_eq!(
        render(&loader, "SELECT * FROM items", OutputFormat::Json),
        "[{\"id\":\"1\",\"price\":\"2.5\",\"ok\":\"true\"},{\"id\":\"2\",\"price\":null,\"ok\":null}]\n"
    );
    assert_eq!(
        render(&loader, "SELECT * FROM items", OutputFormat::Csv),
        "id,price,ok\n1,2.5,true\n2,,\n"
    );
}

#[test]
fn test_reimport_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "users.csv", b"id,name\n1,a\n2,b\n3,c\n");

    let mut loader = loader_in(&dir);
    loader.load_file(&path).unwrap();
    let first = render(&loader, "SELECT * FROM users", OutputFormat::Csv);
    loader.load_file(&path).unwrap();
    let second = render(&loader, "SELECT * FROM users", OutputFormat::Csv);

    assert_eq!(first, second);
    assert_eq!(first, "id,name\n1,a\n2,b\n3,c\n");
}

#[test]
fn test_reimport_is_idempotent_for_every_format() {
    let dir = TempDir::new().unwrap();
    let inputs: [(&str, &[u8]); 3] = [
        ("items.json", br#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#),
        ("items.jsonl", b"{\"id\": 1, \"name\": \"a\"}\n{\"id\": 2, \"name\": \"b\"}\n"),
        ("items.tsv", b"id\tname\n1\ta\n2\tb\n"),
    ];

    for (name, contents) in inputs {
        let path = write_file(dir.path(), name, contents);
        let mut loader = loader_in(&dir);

        loader.load_file(&path).unwrap();
        let first = render(&loader, "SELECT * FROM items", OutputFormat::Jsonl);
        loader.load_file(&path).unwrap();
        let second = render(&loader, "SELECT * FROM items", OutputFormat::Jsonl);

        assert_eq!(first, second, "{}", name);
        assert_eq!(
            first,
            "{\"id\":\"1\",\"name\":\"a\"}\n{\"id\":\"2\",\"name\":\"b\"}\n",
            "{}",
            name
        );
        loader.into_store().close().unwrap();
    }
}

#[test]
fn test_tables_persist_across_runs() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "users.tsv", b"id\tname\n1\ta\n");

    let mut loader = loader_in(&dir);
    loader.load_file(&path).unwrap();
    loader.into_store().close().unwrap();

    let reopened = loader_in(&dir);
    assert_eq!(
        render(&reopened, "SELECT name FROM users", OutputFormat::Tsv),
        "name\na\n"
    );
}

#[test]
fn test_join_across_formats() {
    let dir = TempDir::new().unwrap();
    let users = write_file(dir.path(), "users.csv", b"id,name\n1,alice\n2,bob\n");
    let orders = write_file(
        dir.path(),
        "orders.jsonl",
        b"{\"user_id\": 1, \"total\": 10}\n{\"user_id\": 1, \"total\": 5}\n{\"user_id\": 2, \"total\": 7}\n",
    );

    let mut loader = loader_in(&dir);
    loader.load_file(&users).unwrap();
    loader.load_file(&orders).unwrap();
    assert_eq!(loader.store().list_tables(), vec!["users", "orders"]);

    let result = loader
        .store()
        .execute_sql(
            "SELECT u.name, SUM(o.total) AS total FROM users u \
             JOIN orders o ON o.user_id = u.id GROUP BY u.name ORDER BY u.name",
        )
        .unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(result.value(0, "name"), Some(&Value::String("alice".into())));
    // SUM over integer-looking text yields an integer
    assert_eq!(result.value(0, "total"), Some(&Value::Integer(15)));
    assert_eq!(result.value(1, "total"), Some(&Value::Integer(7)));
}

#[test]
fn test_gzip_input() {
    let dir = TempDir::new().unwrap();
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(b"{\"k\": \"v\"}\n").unwrap();
    let path = write_file(dir.path(), "events.jsonl.gz", &encoder.finish().unwrap());

    let mut loader = loader_in(&dir);
    assert_eq!(loader.load_file(&path).unwrap(), "events");
    assert_eq!(
        render(&loader, "SELECT k FROM events", OutputFormat::Jsonl),
        "{\"k\":\"v\"}\n"
    );
}

#[test]
fn test_bzip2_xz_and_zip_inputs() {
    let dir = TempDir::new().unwrap();
    let csv = b"id,name\n1,a\n2,b\n";

    let mut bz = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    bz.write_all(csv).unwrap();
    let bz_path = write_file(dir.path(), "bz.csv.bz2", &bz.finish().unwrap());

    let mut xz = xz2::write::XzEncoder::new(Vec::new(), 6);
    xz.write_all(b"{\"id\": 1, \"name\": \"a\"}\n{\"id\": 2, \"name\": \"b\"}\n")
        .unwrap();
    let xz_path = write_file(dir.path(), "xz.jsonl.xz", &xz.finish().unwrap());

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("inner.tsv", zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(b"id\tname\n1\ta\n2\tb\n").unwrap();
    let zip_path = write_file(
        dir.path(),
        "zipped.tsv.zip",
        &zip.finish().unwrap().into_inner(),
    );

    let mut loader = loader_in(&dir);
    assert_eq!(loader.load_file(&bz_path).unwrap(), "bz");
    assert_eq!(loader.load_file(&xz_path).unwrap(), "xz");
    assert_eq!(loader.load_file(&zip_path).unwrap(), "zipped");

    for table in ["bz", "xz", "zipped"] {
        assert_eq!(
            render(&loader, &format!("SELECT * FROM {} ORDER BY id", table), OutputFormat::Csv),
            "id,name\n1,a\n2,b\n",
            "{}",
            table
        );
    }
}

#[test]
fn test_stray_quote_keeps_following_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "screens.csv", b"id,desc\n1,5\" screen\n2,b\n3,c\n");

    let mut loader = loader_in(&dir);
    loader.load_file(&path).unwrap();

    assert_eq!(
        render(&loader, "SELECT count(*) AS n FROM screens", OutputFormat::Csv),
        "n\n3\n"
    );
}

#[test]
fn test_malformed_csv_rows_are_dropped() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "data.csv", b"a,b\n1,2\n3,4,5\n6,7\n");

    let mut loader = loader_in(&dir);
    loader.load_file(&path).unwrap();

    assert_eq!(
        render(&loader, "SELECT * FROM data", OutputFormat::Csv),
        "a,b\n1,2\n6,7\n"
    );
}

#[test]
fn test_empty_result_formats() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "users.csv", b"id,name\n1,a\n");

    let mut loader = loader_in(&dir);
    loader.load_file(&path).unwrap();
    let sql = "SELECT * FROM users WHERE id = 'none'";

    assert_eq!(render(&loader, sql, OutputFormat::Json), "[]\n");
    assert_eq!(render(&loader, sql, OutputFormat::Jsonl), "");
    assert_eq!(render(&loader, sql, OutputFormat::Csv), "");
    assert_eq!(render(&loader, sql, OutputFormat::Tsv), "");
}

#[test]
fn test_missing_table_is_operational_error() {
    let dir = TempDir::new().unwrap();
    let loader = loader_in(&dir);

    let err = loader.store().execute_sql("SELECT * FROM ghosts").unwrap_err();
    assert!(err.is_operational());
    assert_eq!(err.to_string(), "no such table: ghosts");
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();
    let mut loader = loader_in(&dir);

    let txt = write_file(dir.path(), "notes.txt", b"hello");
    assert!(matches!(
        loader.load_file(&txt),
        Err(FqError::UnsupportedFormat(_))
    ));

    assert!(matches!(
        loader.load_file(&dir.path().join("absent.csv")),
        Err(FqError::FileNotFound(_))
    ));

    let bad_json = write_file(dir.path(), "bad.json", br#"{"a": 1}"#);
    assert!(matches!(
        loader.load_file(&bad_json),
        Err(FqError::Json { .. })
    ));
}
