use std::fs;

use tempfile::tempdir;
use thaw_core::TrialId;
use thaw_exp::{from_json_slice, to_canonical_json_bytes, TrialTable};

fn sample_table() -> TrialTable {
    let mut table =
        TrialTable::new("trial", vec!["k0".to_string(), "qgeo0".to_string()]).unwrap();
    table
        .push_row(TrialId::from_raw(0), vec![Some(1.0), Some(0.01)])
        .unwrap();
    table
        .push_row(TrialId::from_raw(1), vec![Some(2.5), None])
        .unwrap();
    table
}

#[test]
fn csv_keeps_missing_cells_empty() {
    let mut table = sample_table();
    table
        .set_column("t", vec![Some(1.5e9), None])
        .unwrap();
    let mut out = Vec::new();
    table.to_writer(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "trial,k0,qgeo0,t\n0,1,0.01,1500000000\n1,2.5,,\n"
    );
    let back = TrialTable::from_reader(text.as_bytes()).unwrap();
    assert_eq!(back, table);
}

#[test]
fn reads_tables_written_by_other_tools() {
    let text = "trial, k0 ,t\n 7 ,3.0,NaN\n2,4.0,12.5\n";
    let table = TrialTable::from_reader(text.as_bytes()).unwrap();
    assert_eq!(table.index_name(), "trial");
    assert_eq!(table.columns(), ["k0".to_string(), "t".to_string()]);
    assert_eq!(
        table.trials().collect::<Vec<_>>(),
        vec![TrialId::from_raw(7), TrialId::from_raw(2)]
    );
    assert_eq!(table.value(TrialId::from_raw(7), "t"), None);
    assert_eq!(table.value(TrialId::from_raw(2), "t"), Some(12.5));
}

#[test]
fn malformed_csv_is_rejected_with_location() {
    let err = TrialTable::from_reader("trial,k0\nx,1\n".as_bytes()).unwrap_err();
    assert_eq!(err.info().code, "table_bad_index");
    assert_eq!(err.info().context.get("line").map(String::as_str), Some("2"));

    let err = TrialTable::from_reader("trial,k0\n0,abc\n".as_bytes()).unwrap_err();
    assert_eq!(err.info().code, "table_bad_value");
    assert_eq!(err.info().context.get("column").map(String::as_str), Some("k0"));

    let err = TrialTable::from_reader("trial,k0\n0,1\n0,2\n".as_bytes()).unwrap_err();
    assert_eq!(err.info().code, "table_duplicate_trial");
}

#[test]
fn set_column_replaces_existing_values() {
    let mut table = sample_table();
    table.set_column("t", vec![Some(1.0), Some(2.0)]).unwrap();
    table.set_column("t", vec![None, Some(3.0)]).unwrap();
    assert_eq!(table.columns().len(), 3);
    assert_eq!(table.column("t"), Some(vec![None, Some(3.0)]));

    let err = table.set_column("t", vec![None]).unwrap_err();
    assert_eq!(err.info().code, "table_column_length");
    let err = table.set_column("trial", vec![None, None]).unwrap_err();
    assert_eq!(err.info().code, "table_index_column");
}

#[test]
fn write_csv_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/batch/trials.csv");
    let table = sample_table();
    table.write_csv(&path).unwrap();
    assert!(fs::metadata(&path).unwrap().len() > 0);
    assert_eq!(TrialTable::read_csv(&path).unwrap(), table);
}

#[test]
fn json_form_revalidates_rows() {
    let table = sample_table();
    let bytes = to_canonical_json_bytes(&table).unwrap();
    let back: TrialTable = from_json_slice(&bytes).unwrap();
    assert_eq!(back, table);

    let bad = br#"{"index_name":"trial","columns":["k0"],"rows":[{"trial":1,"values":[1.0]},{"trial":1,"values":[2.0]}]}"#;
    let err = from_json_slice::<TrialTable>(bad).unwrap_err();
    assert_eq!(err.info().code, "json_deserialize");
}
