use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

pub const QUERY_PLACEHOLDER: &str = "{query}";
pub const DEFAULT_SHADERS: [&str; 4] = ["mslfWr", "3dXyWj", "dt3GDl", "7lKSWW"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete scene configuration. Every section and field is optional in the
/// TOML source; missing values fall back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    pub shadertoy: ShadertoySection,
    pub search: SearchSection,
    pub window: WindowSection,
    pub scene: SceneSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderOrder {
    /// Start from a random entry.
    #[default]
    Shuffle,
    /// Start from the first entry.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShadertoySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_base: String,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
    pub shaders: Vec<String>,
    pub order: ShaderOrder,
}

impl Default for ShadertoySection {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://www.shadertoy.com/api/v1/".to_string(),
            timeout: Duration::from_secs(10),
            shaders: DEFAULT_SHADERS.iter().map(|id| id.to_string()).collect(),
            order: ShaderOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSetting {
    #[default]
    Field,
    Window,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSection {
    pub url: String,
    pub input: InputSetting,
    pub placeholder: String,
    pub exit_on_submit: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            url: format!("https://www.google.com/search?q={QUERY_PLACEHOLDER}"),
            input: InputSetting::default(),
            placeholder: "Search...".to_string(),
            exit_on_submit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub antialias: AntialiasSetting,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            antialias: AntialiasSetting::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneSection {
    pub rotation_step: f64,
    pub cube_size: f64,
    pub position: [f64; 3],
    pub scale: f64,
    pub clicked_scale: f64,
    pub fov_degrees: f64,
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            rotation_step: 0.05,
            cube_size: 30.0,
            position: [0.0, 0.0, -30.0],
            scale: 1.5,
            clicked_scale: 1.0,
            fov_degrees: 75.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AntialiasSetting {
    #[default]
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

    /// Explicit MSAA sample count, `None` for `Auto`.
    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

impl std::str::FromStr for AntialiasSetting {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "auto" | "max" | "default" => Ok(Self::Auto),
            "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(Self::Off),
            "2" => Ok(Self::Samples2),
            "4" => Ok(Self::Samples4),
            "8" => Ok(Self::Samples8),
            "16" => Ok(Self::Samples16),
            other => Err(format!("invalid antialias setting '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for AntialiasSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Str(String),
            Num(i64),
        }
        match Helper::deserialize(deserializer)? {
            Helper::Str(raw) => raw.parse().map_err(de::Error::custom),
            Helper::Num(value) => {
                if value < 0 {
                    return Err(de::Error::custom("antialias value must be non-negative"));
                }
                value.to_string().parse().map_err(de::Error::custom)
            }
        }
    }
}

impl Serialize for AntialiasSetting {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Off => serializer.serialize_str("off"),
            other => serializer.serialize_u32(other.samples().unwrap_or(1)),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }
    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.shadertoy.api_key.is_some() {
            copy.shadertoy.api_key = Some("<redacted>".to_string());
        }
        copy
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let shadertoy = &self.shadertoy;
        if shadertoy.shaders.is_empty() {
            return Err(ConfigError::Invalid(
                "shadertoy.shaders must list at least one shader id".into(),
            ));
        }
        if let Some(index) = shadertoy.shaders.iter().position(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "shadertoy.shaders[{index}] is empty"
            )));
        }
        if shadertoy.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "shadertoy.api_base must not be empty".into(),
            ));
        }
        if shadertoy.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "shadertoy.timeout must be greater than zero".into(),
            ));
        }
        if let Some(key) = &shadertoy.api_key {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "shadertoy.api_key must not be blank; omit it instead".into(),
                ));
            }
        }

        if !self.search.url.contains(QUERY_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "search.url '{}' must contain the {QUERY_PLACEHOLDER} placeholder",
                self.search.url
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero; got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let scene = &self.scene;
        for (name, value) in [
            ("rotation_step", scene.rotation_step),
            ("cube_size", scene.cube_size),
            ("scale", scene.scale),
            ("clicked_scale", scene.clicked_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "scene.{name} must be greater than zero; got {value}"
                )));
            }
        }
        if !(scene.fov_degrees > 0.0 && scene.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "scene.fov_degrees must be between 0 and 180; got {}",
                scene.fov_degrees
            )));
        }
        if scene.position.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::Invalid(
                "scene.position must contain finite numbers".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[shadertoy]
api_key = "secret"
timeout = "2s 500ms"
shaders = ["mslfWr", "3dXyWj"]
order = "sequential"

[search]
url = "https://duckduckgo.com/?q={query}"
input = "window"
exit_on_submit = false

[window]
width = 800
height = 600
antialias = 4

[scene]
rotation_step = 0.1
position = [0.0, 1.0, -20.0]
"#;

    #[test]
    fn parses_sample_config() {
        let config = SceneConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.shadertoy.api_key.as_deref(), Some("secret"));
        assert_eq!(config.shadertoy.timeout, Duration::from_millis(2500));
        assert_eq!(config.shadertoy.order, ShaderOrder::Sequential);
        assert_eq!(config.search.input, InputSetting::Window);
        assert!(!config.search.exit_on_submit);
        assert_eq!(config.search.placeholder, "Search...");
        assert_eq!(config.window.antialias, AntialiasSetting::Samples4);
        assert_eq!(config.scene.rotation_step, 0.1);
        assert_eq!(config.scene.cube_size, 30.0);
        assert_eq!(config.scene.position, [0.0, 1.0, -20.0]);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = SceneConfig::from_toml_str("").expect("defaults are valid");
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.shadertoy.shaders, DEFAULT_SHADERS);
        assert_eq!(config.shadertoy.timeout, Duration::from_secs(10));
        assert!(config.search.exit_on_submit);
    }

    #[test]
    fn rejects_empty_shader_list() {
        let err = SceneConfig::from_toml_str("[shadertoy]\nshaders = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one shader"));
    }

    #[test]
    fn rejects_url_without_placeholder() {
        let err =
            SceneConfig::from_toml_str("[search]\nurl = \"https://example.com/\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("{query}"));
    }

    #[test]
    fn rejects_non_positive_scene_values() {
        let err = SceneConfig::from_toml_str("[scene]\nrotation_step = 0\n").unwrap_err();
        assert!(err.to_string().contains("rotation_step"));
        let err = SceneConfig::from_toml_str("[scene]\nfov_degrees = 180\n").unwrap_err();
        assert!(err.to_string().contains("fov_degrees"));
    }

    #[test]
    fn rejects_zero_window() {
        let err = SceneConfig::from_toml_str("[window]\nwidth = 0\n").unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn antialias_accepts_words_and_numbers() {
        for (raw, expected) in [
            ("\"off\"", AntialiasSetting::Off),
            ("\"auto\"", AntialiasSetting::Auto),
            ("16", AntialiasSetting::Samples16),
        ] {
            let config =
                SceneConfig::from_toml_str(&format!("[window]\nantialias = {raw}\n")).unwrap();
            assert_eq!(config.window.antialias, expected);
        }
        assert!(SceneConfig::from_toml_str("[window]\nantialias = 3\n").is_err());
    }

    #[test]
    fn rendered_config_parses_back() {
        let config = SceneConfig::from_toml_str(SAMPLE).unwrap();
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("timeout = \"2s 500ms\""));
        assert!(rendered.contains("antialias = 4"));
        assert_eq!(SceneConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn redaction_masks_api_key() {
        let config = SceneConfig::from_toml_str(SAMPLE).unwrap();
        let shown = config.redacted().to_toml_string().unwrap();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("<redacted>"));
    }
}
