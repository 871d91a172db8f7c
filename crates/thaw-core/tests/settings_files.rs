use std::fs;

use thaw_core::settings::{read_values, Settings};
use thaw_core::{read_f64_file, write_f64_file};

const SOLVER_SETTINGS: &str = "\
# grid
depth = 2.5
delz0 = 0.02
delzfrac = 1.01
delzmax = 0.08
save_grid = true

# model
tint = 1e6   # years, scaled by tunit
tunit = 3.15e7
Tmin = true
";

#[test]
fn grid_keys_are_typed_and_the_rest_preserved() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("settings.txt");
    fs::write(&path, SOLVER_SETTINGS).expect("write settings");

    let settings = Settings::load(&path).expect("load");
    assert_eq!(settings.grid.depth, 2.5);
    assert_eq!(settings.grid.delz0, 0.02);
    assert_eq!(settings.grid.delzfrac, 1.01);
    assert_eq!(settings.grid.delzmax, 0.08);
    assert!(settings.grid.save_grid);
    assert_eq!(settings.entry("tint"), Some("1e6"));
    assert_eq!(settings.entry("Tmin"), Some("true"));
    assert_eq!(settings.entries.len(), 3);

    let pairs = read_values(&path).expect("pairs");
    assert_eq!(pairs.len(), 8);
    assert_eq!(pairs[0], ("depth".to_string(), "2.5".to_string()));
}

#[test]
fn defaults_apply_when_keys_are_absent() {
    let settings = Settings::from_pairs(Vec::new()).expect("empty");
    assert_eq!(settings.grid.depth, 1.0);
    assert_eq!(settings.grid.delz0, 0.01);
    assert!(!settings.grid.save_grid);
}

#[test]
fn malformed_numbers_are_config_errors() {
    let err = Settings::from_pairs(vec![("depth".to_string(), "deep".to_string())]).unwrap_err();
    assert!(matches!(err, thaw_core::ThawError::Config(_)));
    assert_eq!(err.info().context.get("key").map(String::as_str), Some("depth"));
}

#[test]
fn missing_settings_file_is_io() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let err = Settings::load(&dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, thaw_core::ThawError::Io(_)));
}

#[test]
fn raw_arrays_roundtrip_through_disk() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("0_t");
    write_f64_file(&path, &[0.0, 10.5, 1e9]).expect("write");
    assert_eq!(fs::metadata(&path).expect("meta").len(), 24);
    assert_eq!(read_f64_file(&path).expect("read"), vec![0.0, 10.5, 1e9]);
}
