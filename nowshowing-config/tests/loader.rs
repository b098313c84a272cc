use std::{fs, time::Duration};

use nowshowing_config::{
    ConfigGuardRailError, ConfigLoadError, ConfigLoader, CredentialStore, Credentials,
    DeviceKind,
    models::sources::EnvConfig,
};
use nowshowing_core::geometry::FillMode;

fn write_store(dir: &tempfile::TempDir, credentials: &Credentials) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    CredentialStore::new(&path).save(credentials).unwrap();
    path
}

fn complete_credentials() -> Credentials {
    Credentials {
        trakt_username: "viewer".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        redirect_uri: "urn:ietf:wg:oauth:2.0:oob".into(),
        tmdb_api_key: "tmdb".into(),
        access_token: Some("access".into()),
        refresh_token: Some("refresh".into()),
    }
}

#[test]
fn json_settings_file_and_credentials_compose() {
    let dir = tempfile::tempdir().unwrap();
    let credentials_path = write_store(&dir, &complete_credentials());
    let settings = dir.path().join("settings.json");
    fs::write(
        &settings,
        r#"{
            "display": {"fill_mode": "fit", "offset_pixels": 4},
            "device": {"kind": "dry-run", "width": 32, "height": 16},
            "http": {"timeout": "3s"},
            "tmdb": {"image_size": "w500"}
        }"#,
    )
    .unwrap();

    let load = ConfigLoader::new()
        .with_credentials_path(&credentials_path)
        .with_settings_path(&settings)
        .load_with_env(EnvConfig::default(), false)
        .unwrap();
    let config = load.config;

    assert_eq!(config.display.geometry.fill_mode, FillMode::Fit);
    assert_eq!(config.display.geometry.offset_pixels, 4);
    assert_eq!(config.display.device.kind, DeviceKind::DryRun);
    assert_eq!(
        (config.display.device.width, config.display.device.height),
        (32, 16)
    );
    assert_eq!(config.http.timeout, Duration::from_secs(3));
    assert_eq!(config.tmdb_settings().image_size, "w500");
    assert_eq!(
        config.trakt_settings().access_token.as_deref(),
        Some("access")
    );
    // dry-run is worth a warning
    assert_eq!(load.warnings.len(), 1);
}

#[test]
fn incomplete_store_is_rejected_by_guard_rails() {
    let dir = tempfile::tempdir().unwrap();
    let mut credentials = complete_credentials();
    credentials.tmdb_api_key.clear();
    let credentials_path = write_store(&dir, &credentials);

    let err = ConfigLoader::new()
        .with_credentials_path(&credentials_path)
        .load_with_env(EnvConfig::default(), false)
        .unwrap_err();
    assert!(err.to_string().contains("tmdb_api_key"), "{err}");
    assert!(matches!(err, ConfigLoadError::GuardRail(_)));
}

#[test]
fn unparseable_settings_report_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let credentials_path = write_store(&dir, &complete_credentials());
    let settings = dir.path().join("nowshowing.toml");
    fs::write(&settings, "display = [").unwrap();

    let err = ConfigLoader::new()
        .with_credentials_path(&credentials_path)
        .with_settings_path(&settings)
        .load_with_env(EnvConfig::default(), false)
        .unwrap_err();
    match err {
        ConfigLoadError::Parse { path, .. } => assert_eq!(path, settings),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn runaway_zoom_from_the_environment_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let credentials_path = write_store(&dir, &complete_credentials());
    let env = EnvConfig {
        zoom_percent: Some("1000000".into()),
        ..EnvConfig::default()
    };

    let err = ConfigLoader::new()
        .with_credentials_path(&credentials_path)
        .load_with_env(env, false)
        .unwrap_err();
    assert!(
        matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidZoom { .. })
        ),
        "{err}"
    );
}

#[test]
fn led_matrix_device_kind_points_at_the_framebuffer() {
    let dir = tempfile::tempdir().unwrap();
    let credentials_path = write_store(&dir, &complete_credentials());
    let env = EnvConfig {
        device_kind: Some("led-matrix".into()),
        ..EnvConfig::default()
    };

    let err = ConfigLoader::new()
        .with_credentials_path(&credentials_path)
        .load_with_env(env, false)
        .unwrap_err();
    match err {
        ConfigLoadError::InvalidValue { key, reason, .. } => {
            assert_eq!(key, "DEVICE_KIND");
            assert!(reason.contains("framebuffer"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
