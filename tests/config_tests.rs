// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use qr_scanner::ScannerConfig;
use qr_scanner::constants::{detection, timing};

#[test]
fn test_config_default() {
    // Test that default config has sensible values
    let config = ScannerConfig::default();

    assert_eq!(config.max_dimension, detection::MAX_DIMENSION);
    assert_eq!(config.stream_fps, timing::DEFAULT_STREAM_FPS);
    assert!(config.stream_fps > 0, "Default fps must be positive");
}

#[test]
fn test_config_json_roundtrip() {
    let config = ScannerConfig {
        max_dimension: 480,
        stream_fps: 15,
    };

    let json = serde_json::to_string(&config).expect("config serializes");
    let parsed: ScannerConfig = serde_json::from_str(&json).expect("config parses back");
    assert_eq!(parsed, config);
}

#[test]
fn test_config_load_from_file() {
    let path = std::env::temp_dir().join(format!("qr-scanner-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"max_dimension": 320, "stream_fps": 10}"#)
        .expect("write temp config");

    let config = ScannerConfig::load(&path).expect("load temp config");
    assert_eq!(config.max_dimension, 320);
    assert_eq!(config.stream_fps, 10);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_config_load_rejects_invalid_json() {
    let path = std::env::temp_dir().join(format!("qr-scanner-bad-{}.json", std::process::id()));
    std::fs::write(&path, "{not json").expect("write temp config");

    let result = ScannerConfig::load(&path);
    assert!(result.is_err(), "Malformed config must be rejected");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_config_load_missing_file() {
    let result = ScannerConfig::load(std::path::Path::new("/nonexistent/qr-scanner.json"));
    assert!(result.is_err(), "Missing config file must be an error");
}
