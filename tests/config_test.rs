//! Integration tests for Settings loading with layered precedence.
//!
//! These tests point `load_from` at temp files only, so the user's global
//! config never leaks in.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use warish::config::{RawSettings, Settings};
use warish::domain::ReferencePolicy;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("warish.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_missing_global_file_when_loading_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).expect("load");

    assert_eq!(settings.reference_policy, ReferencePolicy::Strict);
    assert!(!settings.render.show_ids);
    assert!(settings.render.show_status);
}

#[test]
fn given_global_file_when_loading_then_overrides_only_specified_fields() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
reference_policy = "lenient"

[render]
show_ids = true
"#,
    );

    // Act
    let settings = Settings::load_from(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.reference_policy, ReferencePolicy::Lenient);
    assert!(settings.render.show_ids);
    assert!(settings.render.show_status, "unspecified keeps default");
}

#[test]
fn given_data_dir_with_tilde_when_loading_then_expanded() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"data_dir = "~/warish-data""#);

    let settings = Settings::load_from(Some(&path)).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(settings.data_dir, PathBuf::from(home).join("warish-data"));
}

#[test]
fn given_unknown_policy_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"reference_policy = "forgiving""#);

    let result = Settings::load_from(Some(&path));

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("config error: parse"), "{err}");
}

#[test]
fn given_settings_when_dumping_toml_then_loads_back_equal() {
    let dir = TempDir::new().unwrap();
    let original = Settings {
        data_dir: dir.path().join("store"),
        reference_policy: ReferencePolicy::Lenient,
        ..Settings::default()
    };
    let path = write_config(&dir, &original.to_toml().unwrap());

    let loaded = Settings::load_from(Some(&path)).expect("load settings");

    assert_eq!(loaded, original);
}

#[test]
fn given_template_when_parsing_then_all_keys_commented() {
    let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();

    assert!(raw.data_dir.is_none());
    assert!(raw.render.show_ids.is_none());
    assert!(raw.render.show_status.is_none());
}
