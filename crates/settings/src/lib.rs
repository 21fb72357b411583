use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which fragment program the background should compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderPreference {
    /// Probe the adapter and pick the lite program on slow compilers.
    #[default]
    Auto,
    Full,
    Lite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }
}

/// Top-level background configuration (`config.toml`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub version: u32,
    /// Fraction of the device-pixel backing store that is actually rendered.
    pub resolution_scale: f32,
    /// Upper bound applied to the monitor's device pixel ratio.
    pub max_device_pixel_ratio: f32,
    /// Emit rolling FPS / frame-time summaries.
    pub diagnostics: bool,
    pub shader: ShaderPreference,
    /// Number of selectable projects (indices `1..=project_count`).
    pub project_count: u32,
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
    pub visibility: VisibilitySettings,
    pub pointer: PointerSettings,
    pub transition: TransitionSettings,
    pub window: WindowSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VisibilitySettings {
    /// Minimum visible area ratio (0-1) before the surface counts as visible.
    pub threshold: f32,
    /// Pixels added around the viewport so rendering resumes slightly early.
    pub margin: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PointerSettings {
    /// Exponential smoothing rate; higher is snappier.
    pub smoothing: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitionSettings {
    #[serde(deserialize_with = "deserialize_duration", serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Share of in-flight progress carried into an interrupting transition.
    pub momentum_carry: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            resolution_scale: 0.6,
            max_device_pixel_ratio: 2.0,
            diagnostics: false,
            shader: ShaderPreference::Auto,
            project_count: 6,
            antialias: None,
            visibility: VisibilitySettings::default(),
            pointer: PointerSettings::default(),
            transition: TransitionSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            margin: 100.0,
        }
    }
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            smoothing: 16.0,
        }
    }
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: default_transition_duration(),
            momentum_carry: 0.4,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            title: "folio".to_string(),
        }
    }
}

fn default_transition_duration() -> Duration {
    Duration::from_millis(800)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or(default_transition_duration()))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            let raw = value.to_string();
            Some(parse_antialias(&raw).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl Settings {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: Settings = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates a config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`Settings::from_path`] but falls back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if !(self.resolution_scale > 0.0 && self.resolution_scale <= 2.0) {
            return Err(ConfigError::Invalid(format!(
                "resolution_scale must be in (0, 2], got {}",
                self.resolution_scale
            )));
        }

        if !(self.max_device_pixel_ratio >= 1.0) {
            return Err(ConfigError::Invalid(
                "max_device_pixel_ratio must be >= 1".into(),
            ));
        }

        if self.project_count == 0 || self.project_count > 32 {
            return Err(ConfigError::Invalid(format!(
                "project_count must be between 1 and 32, got {}",
                self.project_count
            )));
        }

        if !(0.0..=1.0).contains(&self.visibility.threshold) {
            return Err(ConfigError::Invalid(
                "visibility.threshold must be within [0, 1]".into(),
            ));
        }

        if !(self.visibility.margin >= 0.0) {
            return Err(ConfigError::Invalid(
                "visibility.margin must be >= 0".into(),
            ));
        }

        if !(self.pointer.smoothing > 0.0) {
            return Err(ConfigError::Invalid(
                "pointer.smoothing must be greater than zero".into(),
            ));
        }

        if self.transition.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "transition.duration must be greater than zero".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.transition.momentum_carry) {
            return Err(ConfigError::Invalid(
                "transition.momentum_carry must be within [0, 1]".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window.width and window.height must be non-zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1
resolution_scale = 0.5
diagnostics = true
shader = "lite"
antialias = 4

[visibility]
threshold = 0.05
margin = 50

[pointer]
smoothing = 8

[transition]
duration = "1s 200ms"
momentum_carry = 0.25

[window]
width = 800
height = 600
"#;

    #[test]
    fn parses_sample_config() {
        let config = Settings::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.resolution_scale, 0.5);
        assert!(config.diagnostics);
        assert_eq!(config.shader, ShaderPreference::Lite);
        assert_eq!(config.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(config.visibility.margin, 50.0);
        assert_eq!(config.pointer.smoothing, 8.0);
        assert_eq!(config.transition.duration, Duration::from_millis(1200));
        assert_eq!(config.transition.momentum_carry, 0.25);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.project_count, 6);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = Settings::from_toml_str("").expect("parse empty config");
        assert_eq!(config, Settings::default());
        assert_eq!(config.resolution_scale, 0.6);
        assert_eq!(config.transition.duration, Duration::from_millis(800));
        assert_eq!(config.visibility.threshold, 0.01);
    }

    #[test]
    fn numeric_duration_is_seconds() {
        let config = Settings::from_toml_str("[transition]\nduration = 2\n").unwrap();
        assert_eq!(config.transition.duration, Duration::from_secs(2));
    }

    #[test]
    fn rejects_out_of_range_scale() {
        let err = Settings::from_toml_str("resolution_scale = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_duration() {
        let err = Settings::from_toml_str("[transition]\nduration = \"0s\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unrepresentable_float_duration() {
        for document in [
            "[transition]\nduration = inf\n",
            "[transition]\nduration = 1e300\n",
        ] {
            let err = Settings::from_toml_str(document).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{document}: {err}");
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let err = Settings::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_antialias() {
        let err = Settings::from_toml_str("antialias = \"lots\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Settings::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Settings::default());
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "diagnostics = true\n").unwrap();
        let config = Settings::from_path(&path).unwrap();
        assert!(config.diagnostics);
    }

    #[test]
    fn serialises_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        let parsed = Settings::from_toml_str(&text).unwrap();
        assert_eq!(parsed.transition.duration, Duration::from_millis(800));
    }
}
