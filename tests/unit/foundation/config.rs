use super::*;

#[test]
fn defaults_match_pool_sizes() {
    let cfg = RuntimeConfig::default();
    assert_eq!(cfg.max_layers, 2048);
    assert_eq!(cfg.max_frames, 1024);
    assert_eq!(cfg.max_animations, 64);
    cfg.validate().unwrap();
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let cfg = RuntimeConfig::from_json_str(r#"{ "max_animations": 4 }"#).unwrap();
    assert_eq!(cfg.max_animations, 4);
    assert_eq!(cfg.max_layers, 2048);
}

#[test]
fn json_rejects_unknown_fields_and_zero_capacity() {
    let err = RuntimeConfig::from_json_str(r#"{ "max_sprites": 4 }"#).unwrap_err();
    assert!(matches!(err, SpriteError::Config(_)));

    let err = RuntimeConfig::from_json_str(r#"{ "max_frames": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("max_frames must be > 0"));
}

#[test]
fn from_path_reports_missing_file() {
    let err = RuntimeConfig::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, SpriteError::Other(_)));
}
