use std::fmt;

use mime::Mime;
use serde::Deserialize;

/// Named color scheme applied to the whole image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Blue,
    Purple,
    Orange,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Blue, Theme::Purple, Theme::Orange, Theme::Dark];

    /// Maps any request value to a theme. Unrecognized input yields the default.
    pub fn from_param(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Blue => "blue",
            Theme::Purple => "purple",
            Theme::Orange => "orange",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Ratio {
    #[default]
    Square,
    Portrait,
    Landscape,
}

impl Ratio {
    pub const ALL: [Ratio; 3] = [Ratio::Square, Ratio::Portrait, Ratio::Landscape];

    /// Maps any request value to a ratio. Unrecognized input yields the default.
    ///
    /// Besides the canonical `W:H` form, `WxH`, `W/H` and the names `square`,
    /// `portrait` and `landscape` are accepted.
    pub fn from_param(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace(['x', '/'], ":");
        match normalized.as_str() {
            "1:1" | "square" => Ratio::Square,
            "4:5" | "portrait" => Ratio::Portrait,
            "16:9" | "landscape" => Ratio::Landscape,
            _ => Ratio::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ratio::Square => "1:1",
            Ratio::Portrait => "4:5",
            Ratio::Landscape => "16:9",
        }
    }

    pub fn dimensions(self) -> Dimensions {
        match self {
            Ratio::Square => Dimensions { width: 1080, height: 1080 },
            Ratio::Portrait => Dimensions { width: 1080, height: 1350 },
            Ratio::Landscape => Dimensions { width: 1920, height: 1080 },
        }
    }

    #[inline]
    pub fn is_widescreen(self) -> bool { matches!(self, Ratio::Landscape) }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Fully defaulted request configuration. Every field holds a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub title: String,
    pub subtitle: String,
    pub cta: String,
    pub theme: Theme,
    pub ratio: Ratio,
}

impl ResolvedConfig {
    #[inline]
    pub fn dimensions(&self) -> Dimensions { self.ratio.dimensions() }
}

/// Encoding of the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Png,
    WebP,
    Jpeg,
    Svg,
}

impl OutputFormat {
    /// Maps an explicit `format` parameter. Unrecognized input yields PNG.
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "webp" => OutputFormat::WebP,
            "jpg" | "jpeg" => OutputFormat::Jpeg,
            "svg" => OutputFormat::Svg,
            _ => OutputFormat::Png,
        }
    }

    /// Matches a single `Accept` entry. Wildcards select PNG.
    pub fn from_mime(mime: &Mime) -> Option<Self> {
        if mime.type_() == mime::STAR && mime.subtype() == mime::STAR {
            return Some(OutputFormat::Png);
        }
        if mime.type_() != mime::IMAGE {
            return None;
        }
        if mime.subtype() == mime::STAR || mime.subtype() == mime::PNG {
            Some(OutputFormat::Png)
        } else if mime.subtype() == mime::SVG {
            Some(OutputFormat::Svg)
        } else if mime.subtype() == mime::JPEG || mime.subtype() == "jpg" {
            Some(OutputFormat::Jpeg)
        } else if mime.subtype() == "webp" {
            Some(OutputFormat::WebP)
        } else {
            None
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}
