use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use restable::config::{default_pool_size, OverlaySettings, Settings};

fn settings_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("restable-{}-{}.toml", name, std::process::id()));
    fs::write(&path, contents).expect("settings file");
    path
}

#[test]
fn defaults_fill_every_setting() {
    let settings = Settings::default();
    assert_eq!(settings.framework_package, "android");
    assert_eq!(settings.qualifiers, "");
    assert_eq!(settings.log_filter, "info");
    assert!(settings.cache_path.is_none());
    assert_eq!(settings.overlay.merge_timeout(), Duration::from_secs(300));
}

#[test]
fn pool_size_falls_back_to_the_default() {
    let default = default_pool_size();
    assert!((1..=4).contains(&default));
    let unset = OverlaySettings::default();
    assert_eq!(unset.pool_size(), default);
    let zero = OverlaySettings {
        pool_size: Some(0),
        ..OverlaySettings::default()
    };
    assert_eq!(zero.pool_size(), default);
    let two = OverlaySettings {
        pool_size: Some(2),
        ..OverlaySettings::default()
    };
    assert_eq!(two.pool_size(), 2);
}

#[test]
fn file_settings_override_defaults() {
    let path = settings_file(
        "override",
        r#"
qualifiers = "en-rUS-v21"
cache_path = "/tmp/restable.cache"

[overlay]
pool_size = 3
merge_timeout_secs = 60
"#,
    );
    let settings = Settings::load(Some(path.as_path())).expect("settings");
    fs::remove_file(&path).ok();
    assert_eq!(settings.qualifiers, "en-rUS-v21");
    assert_eq!(settings.cache_path, Some(PathBuf::from("/tmp/restable.cache")));
    assert_eq!(settings.overlay.pool_size(), 3);
    assert_eq!(settings.overlay.merge_timeout(), Duration::from_secs(60));
    // untouched keys keep their defaults
    assert_eq!(settings.framework_package, "android");
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn missing_settings_file_is_an_error() {
    let path = std::env::temp_dir().join("restable-does-not-exist.toml");
    assert!(Settings::load(Some(path.as_path())).is_err());
}
