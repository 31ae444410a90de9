//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Configuration discovery and validation tests."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use evhub_common::config::{AppConfig, MapBackend};
use tempfile::NamedTempFile;

#[test]
fn first_existing_candidate_is_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[refresh]
dashboard_interval_ms = 1500

[simulation]
random_seed = 77
utc_offset_minutes = -300

[map]
provider = "mapbox"
mapbox_token = "pk.test"
"#
    )
    .unwrap();
    file.flush().unwrap();

    let missing = PathBuf::from("/nonexistent/evhub.toml");
    let candidates = vec![missing, file.path().to_path_buf()];
    let loaded = AppConfig::load_with_source(&candidates).unwrap();

    assert_eq!(loaded.source.as_deref(), Some(file.path()));
    let config = loaded.config;
    assert_eq!(config.refresh.dashboard_interval, Duration::from_millis(1500));
    assert_eq!(config.refresh.chart_interval, Duration::from_secs(10));
    assert_eq!(config.simulation.random_seed, Some(77));
    assert_eq!(
        config.simulation.utc_offset().unwrap().local_minus_utc(),
        -300 * 60
    );
    assert_eq!(config.map.provider, MapBackend::Mapbox);
}

#[test]
fn defaults_apply_when_no_candidate_exists() {
    let candidates = vec![PathBuf::from("/nonexistent/evhub.toml")];
    let loaded = AppConfig::load_with_source(&candidates).unwrap();
    assert!(loaded.source.is_none());
    assert_eq!(loaded.config.fleet.stations.len(), 4);
}

#[test]
fn invalid_file_reports_its_path() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[fleet]\nmax_progress_step = -1.0").unwrap();
    file.flush().unwrap();
    let err = AppConfig::from_path(file.path()).unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("max_progress_step"));
    assert!(rendered.contains(&file.path().display().to_string()));
}

#[test]
fn shipped_example_config_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/evhubd.example.toml");
    let config = AppConfig::from_path(&path).unwrap();
    assert_eq!(config.fleet.stations.len(), 4);
    assert_eq!(config.fleet.stations[2].time_remaining, "2h 15min");
    assert_eq!(config.map.provider, MapBackend::OpenStreetMap);
}

#[test]
fn missing_explicit_path_is_an_error() {
    let explicit = PathBuf::from("/nonexistent/typo.toml");
    let fallback = vec![PathBuf::from("/nonexistent/evhub.toml")];
    let err = AppConfig::load_explicit_or(Some(&explicit), &fallback).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/typo.toml"));

    let loaded = AppConfig::load_explicit_or(None, &fallback).unwrap();
    assert!(loaded.source.is_none());
}

#[test]
fn explicit_path_wins_over_candidates() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[simulation]\nrandom_seed = 5").unwrap();
    file.flush().unwrap();

    let candidates = vec![PathBuf::from("/nonexistent/evhub.toml")];
    let loaded = AppConfig::load_explicit_or(Some(file.path()), &candidates).unwrap();
    assert_eq!(loaded.source.as_deref(), Some(file.path()));
    assert_eq!(loaded.config.simulation.random_seed, Some(5));
}
