use std::collections::HashMap;

use ogcard_core::{
    config::{HexColor, ThemeOverride},
    models::Theme,
};
use palette::Srgb;

/// Two-stop diagonal (135°) background gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub from: Srgb<u8>,
    pub to: Srgb<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub background: Gradient,
    pub accent: Srgb<u8>,
    /// Text drawn on top of the accent color.
    pub accent_foreground: Srgb<u8>,
    pub foreground: Srgb<u8>,
    pub glow: Srgb<u8>,
    pub glow_opacity: f32,
}

impl ThemePalette {
    pub fn builtin(theme: Theme) -> Self {
        match theme {
            Theme::Blue => Self {
                background: Gradient { from: rgb(0x0A46FF), to: rgb(0x0066FF) },
                accent: rgb(0xFFD600),
                accent_foreground: rgb(0x121416),
                foreground: rgb(0xFFFFFF),
                glow: rgb(0x008CFF),
                glow_opacity: 0.35,
            },
            Theme::Purple => Self {
                background: Gradient { from: rgb(0x5D2BFF), to: rgb(0x9D40FF) },
                accent: rgb(0xFFD35A),
                accent_foreground: rgb(0x121416),
                foreground: rgb(0xFFFFFF),
                glow: rgb(0x9D40FF),
                glow_opacity: 0.35,
            },
            Theme::Orange => Self {
                background: Gradient { from: rgb(0xFF6A00), to: rgb(0xFF8A00) },
                accent: rgb(0x1B1B1B),
                accent_foreground: rgb(0x111111),
                foreground: rgb(0xFFFFFF),
                glow: rgb(0xFF7A00),
                glow_opacity: 0.35,
            },
            Theme::Dark => Self {
                background: Gradient { from: rgb(0x0E1016), to: rgb(0x1A1F2B) },
                accent: rgb(0x65D7FF),
                accent_foreground: rgb(0x121416),
                foreground: rgb(0xEAF6FF),
                glow: rgb(0x65D7FF),
                glow_opacity: 0.25,
            },
        }
    }

    fn apply(&mut self, o: &ThemeOverride) {
        let set = |slot: &mut Srgb<u8>, value: Option<HexColor>| {
            if let Some(HexColor(color)) = value {
                *slot = color;
            }
        };
        set(&mut self.background.from, o.background_from);
        set(&mut self.background.to, o.background_to);
        set(&mut self.accent, o.accent);
        set(&mut self.accent_foreground, o.accent_foreground);
        set(&mut self.foreground, o.foreground);
        set(&mut self.glow, o.glow);
        if let Some(opacity) = o.glow_opacity {
            self.glow_opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

/// Theme lookup table, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Palettes {
    entries: HashMap<Theme, ThemePalette>,
    fallback: ThemePalette,
}

impl Palettes {
    pub fn new(overrides: &HashMap<Theme, ThemeOverride>) -> Self {
        let entries = Theme::ALL
            .into_iter()
            .map(|theme| {
                let mut palette = ThemePalette::builtin(theme);
                if let Some(o) = overrides.get(&theme) {
                    tracing::debug!("Applying color overrides for theme {theme}");
                    palette.apply(o);
                }
                (theme, palette)
            })
            .collect();
        Self { entries, fallback: ThemePalette::builtin(Theme::Blue) }
    }

    /// Returns the palette for `theme`, or the built-in blue palette.
    pub fn get(&self, theme: Theme) -> &ThemePalette {
        self.entries.get(&theme).unwrap_or(&self.fallback)
    }
}

impl Default for Palettes {
    fn default() -> Self { Self::new(&HashMap::new()) }
}

fn rgb(hex: u32) -> Srgb<u8> {
    Srgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

pub fn html_color(c: Srgb<u8>) -> String {
    let (r, g, b) = c.into_components();
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_palettes() {
        let cases: &[(Theme, &str, &str, &str)] = &[
            (Theme::Blue, "#0A46FF", "#FFD600", "#FFFFFF"),
            (Theme::Purple, "#5D2BFF", "#FFD35A", "#FFFFFF"),
            (Theme::Orange, "#FF6A00", "#1B1B1B", "#FFFFFF"),
            (Theme::Dark, "#0E1016", "#65D7FF", "#EAF6FF"),
        ];
        let palettes = Palettes::default();
        for &(theme, bg, accent, fg) in cases {
            let palette = palettes.get(theme);
            assert_eq!(html_color(palette.background.from), bg);
            assert_eq!(html_color(palette.accent), accent);
            assert_eq!(html_color(palette.foreground), fg);
        }
        assert_eq!(html_color(palettes.get(Theme::Orange).accent_foreground), "#111111");
        assert_eq!(palettes.get(Theme::Dark).glow_opacity, 0.25);
    }

    #[test]
    fn test_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert(Theme::Dark, ThemeOverride {
            accent: Some("#FF0000".parse().unwrap()),
            glow_opacity: Some(3.0),
            ..ThemeOverride::default()
        });
        let palettes = Palettes::new(&overrides);
        let dark = palettes.get(Theme::Dark);
        assert_eq!(html_color(dark.accent), "#FF0000");
        assert_eq!(html_color(dark.foreground), "#EAF6FF");
        assert_eq!(dark.glow_opacity, 1.0);
        assert_eq!(palettes.get(Theme::Blue), &ThemePalette::builtin(Theme::Blue));
    }

    #[test]
    fn test_fallback() {
        let palettes =
            Palettes { entries: HashMap::new(), fallback: ThemePalette::builtin(Theme::Blue) };
        assert_eq!(palettes.get(Theme::Purple), &ThemePalette::builtin(Theme::Blue));
    }
}
