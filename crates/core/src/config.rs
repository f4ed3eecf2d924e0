use std::{
    collections::HashMap,
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, ensure};
use palette::Srgb;
use serde::{Deserialize, Deserializer};

use crate::models::Theme;

pub const CONFIG_PATH_ENV: &str = "OGCARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fonts: FontConfig,
    pub defaults: Defaults,
    pub brand: BrandConfig,
    pub themes: HashMap<Theme, ThemeOverride>,
}

impl Config {
    /// Loads the configuration file named by `OGCARD_CONFIG` (or `config.yml`).
    /// A missing file yields the built-in configuration.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let defaults = &self.defaults;
        ensure!(defaults.max_text_len > 0, "defaults.max_text_len must be at least 1");
        for (name, value) in
            [("title", &defaults.title), ("subtitle", &defaults.subtitle), ("cta", &defaults.cta)]
        {
            ensure!(!value.trim().is_empty(), "defaults.{name} must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self { Self { port: 3000, timeout_secs: 30, max_body_bytes: 64 * 1024 } }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directories scanned recursively for font files.
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    /// Also load fonts installed on the host.
    pub system: bool,
    /// Family used for the generic `sans-serif` fallback.
    pub sans_serif_family: Option<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("fonts")],
            files: vec![],
            system: true,
            sans_serif_family: None,
        }
    }
}

/// Values substituted for absent or empty request fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub title: String,
    pub subtitle: String,
    pub cta: String,
    /// Longer text is truncated, in characters.
    pub max_text_len: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            title: "Start Your Health Coaching Career".to_string(),
            subtitle: "Get paying clients in 90 days • No experience needed".to_string(),
            cta: "Reserve My Spot Now".to_string(),
            max_text_len: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub name: String,
    pub secondary_cta: String,
    pub font_family: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "YOU CAN TRANSFORM™".to_string(),
            secondary_cta: "DM “COACH” to Register".to_string(),
            font_family: "Inter, Arial, sans-serif".to_string(),
        }
    }
}

/// Per-theme color overrides. Absent fields keep the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThemeOverride {
    pub background_from: Option<HexColor>,
    pub background_to: Option<HexColor>,
    pub accent: Option<HexColor>,
    pub accent_foreground: Option<HexColor>,
    pub foreground: Option<HexColor>,
    pub glow: Option<HexColor>,
    pub glow_opacity: Option<f32>,
}

/// `#RRGGBB` color as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub Srgb<u8>);

impl FromStr for HexColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let color = Srgb::<u8>::from_str(s.trim())
            .map_err(|e| anyhow::anyhow!("Invalid color {s:?}: {e}"))?;
        Ok(Self(color))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.0.into_components();
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
