use tempfile::tempdir;
use thaw_core::io::write_f64_file;
use thaw_core::TrialId;
use thaw_exp::{DirStore, MemoryStore, ResultsStore};

#[test]
fn snapshots_are_ordered_numerically() {
    let dir = tempdir().unwrap();
    for n in [10u64, 2, 1] {
        let profile: Vec<f64> = (0..4).map(|i| n as f64 * 100.0 + i as f64).collect();
        write_f64_file(&dir.path().join(format!("5_T_{n}")), &profile).unwrap();
    }
    // neither belongs to trial 5's T stack
    write_f64_file(&dir.path().join("5_T_x1"), &[0.0]).unwrap();
    write_f64_file(&dir.path().join("15_T_3"), &[0.0]).unwrap();

    let stack = DirStore::new(dir.path())
        .snapshots(TrialId::from_raw(5), "T")
        .unwrap();
    assert_eq!(stack.indices(), [1, 2, 10]);
    assert_eq!(stack.n_rows(), 4);
    assert_eq!(stack.n_snapshots(), 3);
    assert_eq!(stack.column(2).unwrap(), [1000.0, 1001.0, 1002.0, 1003.0]);
    assert_eq!(stack.row(3).unwrap(), vec![103.0, 203.0, 1003.0]);
    assert!(stack.row(4).is_none());
}

#[test]
fn ragged_or_absent_snapshots_fail() {
    let dir = tempdir().unwrap();
    let store = DirStore::new(dir.path());
    let err = store.snapshots(TrialId::from_raw(0), "T").unwrap_err();
    assert_eq!(err.info().code, "store_no_snapshots");

    write_f64_file(&dir.path().join("0_T_0"), &[1.0, 2.0]).unwrap();
    write_f64_file(&dir.path().join("0_T_1"), &[1.0]).unwrap();
    let err = store.snapshots(TrialId::from_raw(0), "T").unwrap_err();
    assert_eq!(err.info().code, "store_ragged_snapshots");
    assert_eq!(err.info().context.get("trial").map(String::as_str), Some("0"));
}

#[test]
fn series_paths_follow_the_solver_layout() {
    let dir = tempdir().unwrap();
    let store = DirStore::new(dir.path());
    let trial = TrialId::from_raw(42);
    assert_eq!(store.series_path(trial, "Tmin"), dir.path().join("42_Tmin"));
    write_f64_file(&store.series_path(trial, "Tmin"), &[250.0, 260.0]).unwrap();
    assert_eq!(store.series(trial, "Tmin").unwrap(), vec![250.0, 260.0]);
    assert_eq!(store.series(trial, "t").unwrap_err().info().code, "raw_read");
}

#[test]
fn memory_store_mirrors_directory_semantics() {
    let mut store = MemoryStore::new();
    let trial = TrialId::from_raw(1);
    store.insert_snapshot(trial, "T", 3, vec![3.0]);
    store.insert_snapshot(trial, "T", 1, vec![1.0]);
    let stack = store.snapshots(trial, "T").unwrap();
    assert_eq!(stack.indices(), [1, 3]);
    assert_eq!(store.series(trial, "t").unwrap_err().info().code, "store_missing");
}

#[test]
fn snapshot_stack_exports_one_row_per_cell() {
    let mut store = MemoryStore::new();
    let trial = TrialId::from_raw(0);
    store.insert_snapshot(trial, "T", 12, vec![251.5, 260.0]);
    store.insert_snapshot(trial, "T", 3, vec![250.0, 1e-7]);
    let stack = store.snapshots(trial, "T").unwrap();

    let mut out = Vec::new();
    stack.to_writer("T", &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "T_3,T_12\n250,251.5\n0.0000001,260\n"
    );

    let dir = tempdir().unwrap();
    let path = dir.path().join("export/snaps.csv");
    stack.write_csv("T", &path).unwrap();
    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, ["T_3", "T_12"]);
    let rows: Vec<Vec<f64>> = rdr
        .records()
        .map(|record| record.unwrap().iter().map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows, vec![vec![250.0, 251.5], vec![1e-7, 260.0]]);
}
