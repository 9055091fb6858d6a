use soul_mobile_sim::{SimConfig, SimError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn environment(vars: &[(&str, &str)]) -> config::Environment {
    let mut map = config::Map::new();
    for (key, value) in vars {
        map.insert((*key).to_string(), (*value).to_string());
    }
    config::Environment::with_prefix("SOUL")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(Some(map))
}

// ============================================================================
// LOADING
// ============================================================================

#[test]
fn test_defaults_without_sources() {
    let config = SimConfig::load_with(None, environment(&[])).unwrap();

    assert_eq!(config.playback.prepare_timeout_ms, 10_000);
    assert!((config.playback.duck_volume - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.simulation.prepare_latency_ms, 300);
    assert_eq!(config.session.file, PathBuf::from("./data/session.json"));
    assert!(!config.session.ephemeral);
    config.validate().unwrap();
}

#[test]
fn test_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sim.toml");
    fs::write(
        &path,
        r#"
[playback]
duck_volume = 0.5

[simulation]
prepare_latency_ms = 5
track_duration_ms = 1000

[session]
file = "other.json"
ephemeral = true
"#,
    )
    .unwrap();

    let config = SimConfig::load_with(Some(&path), environment(&[])).unwrap();

    assert!((config.playback.duck_volume - 0.5).abs() < f32::EPSILON);
    // Keys absent from the file keep their defaults
    assert_eq!(config.playback.prepare_timeout_ms, 10_000);
    assert_eq!(config.simulation.prepare_latency_ms, 5);
    assert_eq!(config.simulation.track_duration_ms, 1000);
    assert_eq!(config.session.file, PathBuf::from("other.json"));
    assert!(config.session.ephemeral);
}

#[test]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sim.toml");
    fs::write(&path, "[playback]\nprepare_timeout_ms = 500\n").unwrap();

    let config = SimConfig::load_with(
        Some(&path),
        environment(&[
            ("SOUL_PLAYBACK__PREPARE_TIMEOUT_MS", "250"),
            ("SOUL_SIMULATION__VERIFY_LOCAL_SOURCES", "true"),
        ]),
    )
    .unwrap();

    assert_eq!(config.playback.prepare_timeout_ms, 250);
    assert!(config.simulation.verify_local_sources);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let result = SimConfig::load_with(Some(&path), environment(&[]));
    assert!(matches!(result, Err(SimError::Config(_))));
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_validate_rejects_bad_duck_volume() {
    let mut config = SimConfig::default();
    config.playback.duck_volume = 1.5;
    assert!(matches!(config.validate(), Err(SimError::Playback(_))));
}

#[test]
fn test_validate_rejects_zero_track_duration() {
    let mut config = SimConfig::default();
    config.simulation.track_duration_ms = 0;
    assert!(matches!(config.validate(), Err(SimError::Platform(_))));
}

#[test]
fn test_validate_rejects_empty_session_path() {
    let mut config = SimConfig::default();
    config.session.file = PathBuf::new();
    assert!(matches!(config.validate(), Err(SimError::Config(_))));
}
