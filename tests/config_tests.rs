// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use frame_beauty::config::{BeautyLevels, PowerPreference};
use frame_beauty::{BeautyError, ComputeBackend, Config, GraphVariant};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.backend, ComputeBackend::Auto);
    assert_eq!(config.power_preference, PowerPreference::HighPerformance);
    assert_eq!(config.levels, BeautyLevels::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_variant_follows_platform() {
    let expected = if cfg!(target_os = "android") {
        GraphVariant::RawData
    } else {
        GraphVariant::Sink
    };
    assert_eq!(Config::default().variant, expected);
}

#[test]
fn test_config_from_json() {
    let config = Config::from_json(
        r#"{
            "variant": "raw_data",
            "backend": "software",
            "levels": { "whiten": 0.5, "lipstick": 0.25 },
            "lip_color": [1.0, 0.0, 0.0, 1.0]
        }"#,
    )
    .unwrap();

    assert_eq!(config.variant, GraphVariant::RawData);
    assert_eq!(config.backend, ComputeBackend::Software);
    assert_eq!(config.levels.whiten, 0.5);
    assert_eq!(config.levels.lipstick, 0.25);
    assert_eq!(config.lip_color, [1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_config_rejects_bad_color() {
    let result = Config::from_json(r#"{ "blush_color": [2.0, 0.0, 0.0, 1.0] }"#);
    assert!(matches!(result, Err(BeautyError::Config(_))));
}

#[test]
fn test_config_rejects_malformed_json() {
    let result = Config::from_json(r#"{ "variant": "#);
    assert!(matches!(result, Err(BeautyError::Config(_))));
}

#[test]
fn test_config_serialization_roundtrip() {
    let mut config = Config::default();
    config.levels.face_slim = 0.3;
    config.backend = ComputeBackend::Gpu;

    let json = serde_json::to_string(&config).unwrap();
    let back = Config::from_json(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_config_load_missing_file() {
    let result = Config::load("/nonexistent/frame-beauty.json");
    assert!(matches!(result, Err(BeautyError::Io(_))));
}
