use std::fs;
use std::path::PathBuf;

use odds_terminal::artifact::{Artifact, ArtifactSource};
use odds_terminal::fake_rows::generate_raw_rows;
use odds_terminal::schema::{SCHEMA_VERSION, SchemaError, column_names};
use odds_terminal::transform::transform_collection;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("odds_terminal_test_{}", std::process::id()))
        .join(name)
}

#[test]
fn saved_artifact_loads_back() {
    let rows = transform_collection(generate_raw_rows(40, 3)).unwrap();
    let artifact = Artifact::build(rows.clone());
    let path = scratch_path("roundtrip/odds.json");
    artifact.save(&path).unwrap();

    let loaded = Artifact::load(&ArtifactSource::File(path.clone()), None).unwrap();
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    assert_eq!(loaded.columns, column_names());
    assert_eq!(loaded.rows, rows);
    assert!(loaded.generated_at.is_some());

    let _ = fs::remove_file(&path);
}

#[test]
fn renamed_column_is_rejected() {
    let mut columns = column_names();
    columns[3] = "ft".to_string();
    let raw = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "columns": columns,
        "rows": [],
    })
    .to_string();
    let err = Artifact::from_json(&raw).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SchemaError>(),
        Some(&SchemaError::ColumnMismatch { index: 3 })
    );
}

#[test]
fn short_row_is_rejected() {
    let raw = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "columns": column_names(),
        "rows": [["Sat", "League"]],
    })
    .to_string();
    let err = Artifact::from_json(&raw).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SchemaError>(),
        Some(SchemaError::RowLength { row: 0, found: 2, .. })
    ));
}

#[test]
fn missing_file_reports_the_path() {
    let path = scratch_path("does-not-exist.json");
    let err = Artifact::load(&ArtifactSource::File(path.clone()), None).unwrap_err();
    assert!(format!("{err:#}").contains("does-not-exist.json"));
}
