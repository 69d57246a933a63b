use std::fs::File;
use std::io::Write;

use tabular_csv::{CellValue, ColumnType, CsvReadOptions, TableError, read_csv_table};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_read_survey_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "survey.csv",
        "hole_id,depth,azimuth,dip,logged\n\
         DH1,0,90,60,2023-05-01\n\
         DH1,50,92,61,2023-05-01\n\
         DH2,0,180,90,\n",
    );

    let table = read_csv_table(&path, &CsvReadOptions::default()).unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column("depth").unwrap().data_type(), ColumnType::Numeric);
    assert_eq!(table.column("logged").unwrap().data_type(), ColumnType::Timestamp);
    assert_eq!(table.column("logged").unwrap().values()[2], CellValue::Missing);
    assert_eq!(
        table.column("hole_id").unwrap().values()[1],
        CellValue::Text("DH1".to_string())
    );
}

#[test]
fn test_quoted_fields_keep_delimiters() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "points.csv",
        "x,y,z,note\n1,2,3,\"weathered, oxidised\"\n",
    );

    let table = read_csv_table(&path, &CsvReadOptions::default()).unwrap();
    assert_eq!(
        table.column("note").unwrap().values()[0],
        CellValue::Text("weathered, oxidised".to_string())
    );
}

#[test]
fn test_ragged_file_reports_position() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "ragged.csv", "a,b\n1,2\n3,4,5\n");

    let err = read_csv_table(&path, &CsvReadOptions::default()).unwrap_err();
    match err {
        TableError::Malformed {
            position, context, ..
        } => {
            let position = position.expect("position should be reported");
            assert_eq!(position.line, Some(3));
            assert!(context.unwrap().ends_with("ragged.csv"));
        },
        other => panic!("expected malformed source, got {other:?}"),
    }
}

#[test]
fn test_missing_source() {
    let dir = TempDir::new().unwrap();
    let err = read_csv_table(dir.path().join("nope.csv"), &CsvReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, TableError::NotFound { .. }));
    assert!(err.to_string().contains("nope.csv"));
}
