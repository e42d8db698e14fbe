//! rune-hud configuration
//!
//! Settings come from `hud.toml` in the working directory; environment
//! variables override individual values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors raised while reading `hud.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure for rune-hud
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HudConfig {
    /// TrueType font settings
    pub font: FontSection,
    /// Embedded bitmap font settings
    pub bitmap: BitmapSection,
    /// Text drawing settings
    pub render: RenderSection,
    /// Demo window settings
    pub demo: DemoSection,
}

/// TrueType font configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontSection {
    /// Path to a .ttf file; no TrueType font is loaded when unset
    pub path: Option<PathBuf>,
    /// First code point to rasterize
    pub low: u32,
    /// Last code point to rasterize (inclusive)
    pub high: u32,
    /// Pixel height
    pub scale: u32,
    pub direction: DirectionSetting,
}

/// Embedded bitmap font configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BitmapSection {
    /// Integer upscale factors; one font is loaded per entry
    pub scales: Vec<u32>,
}

/// Text drawing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSection {
    /// Texture sampling filter
    pub filter: FilterSetting,
    /// What to do with characters outside a font's range
    pub missing_glyph: MissingGlyphSetting,
    /// Replacement character for `missing_glyph = "substitute"`
    pub substitute: char,
}

/// Demo application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoSection {
    pub title: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DirectionSetting {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FilterSetting {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MissingGlyphSetting {
    #[default]
    Skip,
    Substitute,
    Reject,
}

impl FromStr for DirectionSetting {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ltr" | "left-to-right" => Ok(Self::LeftToRight),
            "rtl" | "right-to-left" => Ok(Self::RightToLeft),
            "ttb" | "top-to-bottom" => Ok(Self::TopToBottom),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

impl FromStr for FilterSetting {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

impl FromStr for MissingGlyphSetting {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "substitute" => Ok(Self::Substitute),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown missing-glyph policy '{other}'")),
        }
    }
}

impl Default for FontSection {
    fn default() -> Self {
        Self {
            path: None,
            low: 32,
            high: 126,
            scale: 32,
            direction: DirectionSetting::LeftToRight,
        }
    }
}

impl Default for BitmapSection {
    fn default() -> Self {
        Self { scales: vec![1, 2, 3] }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            filter: FilterSetting::Nearest,
            missing_glyph: MissingGlyphSetting::Skip,
            substitute: '?',
        }
    }
}

impl Default for DemoSection {
    fn default() -> Self {
        Self { title: "rune-hud".to_string() }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl HudConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `hud.toml` from the current directory, or defaults if it is
    /// missing or unreadable
    pub fn load_or_default() -> Self {
        Self::load_from_file("hud.toml").unwrap_or_default()
    }

    /// Apply `HUD_*` environment overrides. Unparseable values are ignored.
    pub fn merge_with_env(&mut self) {
        // Font settings
        if let Ok(path) = std::env::var("HUD_FONT") {
            self.font.path = Some(PathBuf::from(path));
        }
        if let Some(scale) = parse_env("HUD_FONT_SCALE") {
            self.font.scale = scale;
        }
        if let Some(low) = parse_env("HUD_FONT_LOW") {
            self.font.low = low;
        }
        if let Some(high) = parse_env("HUD_FONT_HIGH") {
            self.font.high = high;
        }
        if let Some(direction) = parse_env("HUD_DIRECTION") {
            self.font.direction = direction;
        }

        // Bitmap settings
        if let Ok(val) = std::env::var("HUD_BITMAP_SCALES") {
            let scales: Option<Vec<u32>> = val
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse().ok())
                .collect();
            if let Some(scales) = scales {
                self.bitmap.scales = scales;
            }
        }

        // Render settings
        if let Some(filter) = parse_env("HUD_FILTER") {
            self.render.filter = filter;
        }
        if let Some(policy) = parse_env("HUD_MISSING_GLYPH") {
            self.render.missing_glyph = policy;
        }
    }

    /// Load `hud.toml` (or defaults) and apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
