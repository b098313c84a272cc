//! Raw settings as read from the settings file and the environment.

use nowshowing_core::geometry::FillMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::DeviceKind;

/// Optional settings file (`nowshowing.toml`). Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// `[display]` section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<FileDisplayConfig>,
    /// `[device]` section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<FileDeviceConfig>,
    /// `[poll]` section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<FilePollConfig>,
    /// `[http]` section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<FileHttpConfig>,
    /// `[tmdb]` section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<FileTmdbConfig>,
}

impl FileConfig {
    /// Parse TOML, falling back to JSON for `.json` settings files.
    pub fn parse_from_str(raw: &str) -> Result<Self, FileConfigParseError> {
        match toml::from_str(raw) {
            Ok(parsed) => Ok(parsed),
            Err(toml_err) => serde_json::from_str(raw).map_err(|json_err| {
                FileConfigParseError {
                    toml: toml_err.to_string(),
                    json: json_err.to_string(),
                }
            }),
        }
    }
}

/// The settings file parsed as neither TOML nor JSON.
#[derive(Debug, Clone, thiserror::Error)]
#[error("not valid TOML ({toml}) nor JSON ({json})")]
pub struct FileConfigParseError {
    /// Error from the TOML parser.
    pub toml: String,
    /// Error from the JSON parser.
    pub json: String,
}

/// `[display]` overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileDisplayConfig {
    /// `fill` or `fit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_mode: Option<FillMode>,
    /// Extra zoom in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_percent: Option<f64>,
    /// Vertical offset in panel pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_pixels: Option<i32>,
}

/// `[device]` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileDeviceConfig {
    /// Backend name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeviceKind>,
    /// Output file or framebuffer node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Panel width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Panel height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Durations are strings such as `"5s"` or `"1m"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilePollConfig {
    /// Delay between cycles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// `[http]` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileHttpConfig {
    /// Per-request timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// `[tmdb]` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileTmdbConfig {
    /// Poster size segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

/// Raw environment overrides. Values are parsed by the loader so a bad value
/// can be reported with the variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// `NOWSHOWING_CONFIG`
    pub credentials_path: Option<String>,
    /// `NOWSHOWING_SETTINGS_PATH`
    pub settings_path: Option<String>,
    /// `POLL_INTERVAL`
    pub poll_interval: Option<String>,
    /// `FILL_MODE`
    pub fill_mode: Option<String>,
    /// `ZOOM_PERCENT`
    pub zoom_percent: Option<String>,
    /// `OFFSET_PIXELS`
    pub offset_pixels: Option<String>,
    /// `DEVICE_KIND`
    pub device_kind: Option<String>,
    /// `DEVICE_PATH`
    pub device_path: Option<String>,
    /// `DEVICE_WIDTH`
    pub device_width: Option<String>,
    /// `DEVICE_HEIGHT`
    pub device_height: Option<String>,
    /// `HTTP_TIMEOUT`
    pub http_timeout: Option<String>,
    /// `TMDB_IMAGE_SIZE`
    pub tmdb_image_size: Option<String>,
}

impl EnvConfig {
    /// Read the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            credentials_path: get("NOWSHOWING_CONFIG"),
            settings_path: get("NOWSHOWING_SETTINGS_PATH"),
            poll_interval: get("POLL_INTERVAL"),
            fill_mode: get("FILL_MODE"),
            zoom_percent: get("ZOOM_PERCENT"),
            offset_pixels: get("OFFSET_PIXELS"),
            device_kind: get("DEVICE_KIND"),
            device_path: get("DEVICE_PATH"),
            device_width: get("DEVICE_WIDTH"),
            device_height: get("DEVICE_HEIGHT"),
            http_timeout: get("HTTP_TIMEOUT"),
            tmdb_image_size: get("TMDB_IMAGE_SIZE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_settings_parse() {
        let raw = r#"
            [display]
            fill_mode = "fit"
            zoom_percent = 12.5

            [device]
            kind = "framebuffer"
            path = "/dev/fb1"

            [poll]
            interval = "10s"
        "#;
        let parsed = FileConfig::parse_from_str(raw).unwrap();
        let display = parsed.display.unwrap();
        assert_eq!(display.fill_mode, Some(FillMode::Fit));
        assert_eq!(display.zoom_percent, Some(12.5));
        assert_eq!(display.offset_pixels, None);
        assert_eq!(parsed.device.unwrap().kind, Some(DeviceKind::Framebuffer));
        assert_eq!(parsed.poll.unwrap().interval.as_deref(), Some("10s"));
        assert!(parsed.http.is_none());
    }

    #[test]
    fn json_settings_are_accepted() {
        let raw = r#"{"device": {"kind": "dry-run", "width": 32}}"#;
        let parsed = FileConfig::parse_from_str(raw).unwrap();
        let device = parsed.device.unwrap();
        assert_eq!(device.kind, Some(DeviceKind::DryRun));
        assert_eq!(device.width, Some(32));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FileConfig::parse_from_str("[display]\nzoom = 3\n").unwrap_err();
        assert!(err.toml.contains("zoom"));
    }

    #[test]
    fn env_lookup_ignores_blank_values() {
        let vars: HashMap<&str, &str> = [
            ("FILL_MODE", "fit"),
            ("ZOOM_PERCENT", "   "),
            ("DEVICE_KIND", "png"),
        ]
        .into_iter()
        .collect();
        let env = EnvConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(env.fill_mode.as_deref(), Some("fit"));
        assert_eq!(env.zoom_percent, None);
        assert_eq!(env.device_kind.as_deref(), Some("png"));
        assert_eq!(env.poll_interval, None);
    }
}
