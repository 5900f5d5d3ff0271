#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn defaults_mirror_constants() {
    let config = EngineConfig::default();
    assert_eq!(config.max_layers, 100);
    assert_eq!(config.default_layer_size, 100.0);
    assert_eq!(config.selection_net_threshold, 5.0);
    assert_eq!(config.history_limit, 100);
    assert_eq!(config.default_color, Color::BLACK);
}

#[test]
fn empty_object_yields_defaults() {
    assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
}

#[test]
fn partial_object_overrides_only_named_fields() {
    let config = EngineConfig::from_json(r#"{"max_layers": 3, "default_color": {"r": 1, "g": 2, "b": 3}}"#).unwrap();
    assert_eq!(config.max_layers, 3);
    assert_eq!(config.default_color, Color::new(1, 2, 3));
    assert_eq!(config.history_limit, 100);
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Parse(_))));
    assert!(matches!(EngineConfig::from_json(r#"{"max_layers": "lots"}"#), Err(ConfigError::Parse(_))));
}

#[test]
fn zero_max_layers_is_rejected() {
    let err = EngineConfig::from_json(r#"{"max_layers": 0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "max_layers", .. }));
}

#[test]
fn non_positive_layer_size_is_rejected() {
    let err = EngineConfig::from_json(r#"{"default_layer_size": 0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "default_layer_size", .. }));
}

#[test]
fn negative_threshold_is_rejected_but_zero_is_allowed() {
    let err = EngineConfig::from_json(r#"{"selection_net_threshold": -1}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "selection_net_threshold", .. }));
    assert!(EngineConfig::from_json(r#"{"selection_net_threshold": 0}"#).is_ok());
}

#[test]
fn zero_history_limit_is_rejected() {
    let err = EngineConfig::from_json(r#"{"history_limit": 0}"#).unwrap_err();
    assert_eq!(err.to_string(), "invalid engine config `history_limit`: must be greater than zero");
}
