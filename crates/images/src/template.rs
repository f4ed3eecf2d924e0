//! Composes the share image as an SVG document.
//!
//! The structure is fixed: gradient background, two glow overlays, a brand
//! badge, the headline, the subheading and a row of two call-to-action
//! buttons. Only text, palette and the per-ratio metrics in [`Layout`] vary.
//! SVG has no text flow, so lines are wrapped here using an average glyph
//! width per font size.

use maud::{PreEscaped, html};
use ogcard_core::{
    config::BrandConfig,
    models::{Ratio, ResolvedConfig},
};

use crate::theme::{ThemePalette, html_color};

const TITLE_MAX_LINES: usize = 4;
const SUBTITLE_MAX_LINES: usize = 3;
const CTA_MAX_LINES: usize = 2;
const ELLIPSIS: char = '…';

// Average advance per character, in thousandths of the font size.
const BOLD_GLYPH_WIDTH: u32 = 560;
const REGULAR_GLYPH_WIDTH: u32 = 500;

/// Spacing and font sizes, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub padding_x: u32,
    pub padding_y: u32,
    pub gap: u32,
    pub brand_size: u32,
    pub title_size: u32,
    pub subtitle_size: u32,
    pub cta_size: u32,
    pub secondary_size: u32,
}

impl Layout {
    pub fn for_ratio(ratio: Ratio) -> Self {
        let base = Self {
            padding_x: 100,
            padding_y: 100,
            gap: 28,
            brand_size: 28,
            title_size: 100,
            subtitle_size: 44,
            cta_size: 38,
            secondary_size: 34,
        };
        if ratio.is_widescreen() {
            Self { padding_x: 140, padding_y: 80, title_size: 92, subtitle_size: 40, ..base }
        } else {
            base
        }
    }
}

/// Renders `config` into a standalone SVG document.
pub fn compose(config: &ResolvedConfig, palette: &ThemePalette, brand: &BrandConfig) -> String {
    let dims = config.dimensions();
    let (w, h) = (dims.width, dims.height);
    let layout = Layout::for_ratio(config.ratio);
    let content_w = w.saturating_sub(layout.padding_x * 2);

    let fg = html_color(palette.foreground);
    let accent = html_color(palette.accent);
    let glow = html_color(palette.glow);
    let glow_opacity = format!("{:.2}", palette.glow_opacity);

    // Brand badge: pill with padding 10/16, an 18px dot and a 10px gap
    let brand_w = 16 + 18 + 10 + text_width(&brand.name, layout.brand_size, 620) + 16;
    let brand_h = 20 + line_height(layout.brand_size, 120);

    let title_lh = line_height(layout.title_size, 105);
    let title_lines = wrap_text(
        &config.title,
        max_chars(content_w, layout.title_size, BOLD_GLYPH_WIDTH),
        TITLE_MAX_LINES,
    );
    let subtitle_lh = line_height(layout.subtitle_size, 125);
    let subtitle_lines = wrap_text(
        &config.subtitle,
        max_chars(content_w * 9 / 10, layout.subtitle_size, REGULAR_GLYPH_WIDTH),
        SUBTITLE_MAX_LINES,
    );

    // Buttons: padding 22/34 for the CTA and 22/28 for the secondary, 16px apart
    let cta_lh = line_height(layout.cta_size, 120);
    let cta_lines = wrap_text(
        &config.cta,
        max_chars(content_w.saturating_sub(34 * 2), layout.cta_size, BOLD_GLYPH_WIDTH),
        CTA_MAX_LINES,
    );
    let cta_text_w = cta_lines
        .iter()
        .map(|line| text_width(line, layout.cta_size, BOLD_GLYPH_WIDTH))
        .max()
        .unwrap_or(0);
    let cta_w = (34 * 2 + cta_text_w).min(content_w);
    let cta_h = 22 * 2 + cta_lh * cta_lines.len().max(1) as u32;
    let secondary_line = wrap_text(
        &brand.secondary_cta,
        max_chars(content_w.saturating_sub(28 * 2), layout.secondary_size, 540),
        1,
    )
    .concat();
    let secondary_w =
        (28 * 2 + text_width(&secondary_line, layout.secondary_size, 540)).min(content_w);
    let secondary_h = 22 * 2 + line_height(layout.secondary_size, 120);
    let stacked = cta_w + 16 + secondary_w > content_w;
    let buttons_h = if stacked { cta_h + 16 + secondary_h } else { cta_h.max(secondary_h) };

    let title_h = title_lh * title_lines.len() as u32;
    let subtitle_h = subtitle_lh * subtitle_lines.len() as u32;
    let total_h =
        brand_h + layout.gap + title_h + layout.gap + subtitle_h + layout.gap + 8 + buttons_h;
    let top = (h.saturating_sub(total_h) / 2).max(layout.padding_y);
    let left = layout.padding_x;

    let title_y = top + brand_h + layout.gap;
    let subtitle_y = title_y + title_h + layout.gap;
    let buttons_y = subtitle_y + subtitle_h + layout.gap + 8;
    let (secondary_x, secondary_y) =
        if stacked { (left, buttons_y + cta_h + 16) } else { (left + cta_w + 16, buttons_y) };

    html! {
        (PreEscaped("<?xml version=\"1.0\" encoding=\"utf-8\"?>"))
        svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox=(format!("0 0 {w} {h}")) width=(w) height=(h)
            font-family=(brand.font_family) {
            defs {
                linearGradient #bg x1="0" y1="0" x2="1" y2="1" {
                    stop offset="0%" stop-color=(html_color(palette.background.from)) {}
                    stop offset="100%" stop-color=(html_color(palette.background.to)) {}
                }
                radialGradient #glow-a {
                    stop offset="0%" stop-color=(glow) stop-opacity=(glow_opacity) {}
                    stop offset="60%" stop-color=(glow) stop-opacity="0" {}
                }
                radialGradient #glow-b {
                    stop offset="0%" stop-color=(glow) stop-opacity=(glow_opacity) {}
                    stop offset="70%" stop-color=(glow) stop-opacity="0" {}
                }
                filter #title-shadow x="-10%" y="-50%" width="120%" height="200%" {
                    feDropShadow dx="0" dy="6" stdDeviation="15" flood-color="#000000" flood-opacity="0.25" {}
                }
                filter #dot-glow x="-200%" y="-200%" width="500%" height="500%" {
                    feDropShadow dx="0" dy="0" stdDeviation="11" flood-color=(glow) flood-opacity=(glow_opacity) {}
                }
                filter #cta-shadow x="-30%" y="-60%" width="160%" height="260%" {
                    feDropShadow dx="0" dy="12" stdDeviation="20" flood-color=(glow) flood-opacity=(glow_opacity) {}
                }
            }
            rect width=(w) height=(h) fill="url(#bg)" {}
            ellipse cx=(w * 3 / 4) cy=(h / 4) rx="600" ry="400" fill="url(#glow-a)" {}
            ellipse cx=(w / 4) cy=(h * 17 / 20) rx="500" ry="300" fill="url(#glow-b)" {}

            g #brand {
                rect x=(left) y=(top) width=(brand_w) height=(brand_h) rx=(brand_h / 2)
                    fill="#FFFFFF" fill-opacity="0.12" {}
                circle cx=(left + 16 + 9) cy=(top + brand_h / 2) r="9" fill=(accent) filter="url(#dot-glow)" {}
                text x=(left + 16 + 18 + 10) y=(baseline(top, brand_h, layout.brand_size))
                    fill=(fg) font-size=(layout.brand_size) font-weight="700" letter-spacing="1.2" {
                    (brand.name)
                }
            }

            text #title fill=(fg) font-size=(layout.title_size) font-weight="800" letter-spacing="-1.2"
                filter="url(#title-shadow)" {
                @for (i, line) in title_lines.iter().enumerate() {
                    tspan x=(left) y=(baseline(title_y + title_lh * i as u32, title_lh, layout.title_size)) {
                        (line)
                    }
                }
            }

            text #subtitle fill=(fg) fill-opacity="0.96" font-size=(layout.subtitle_size) {
                @for (i, line) in subtitle_lines.iter().enumerate() {
                    tspan x=(left) y=(baseline(subtitle_y + subtitle_lh * i as u32, subtitle_lh, layout.subtitle_size)) {
                        (line)
                    }
                }
            }

            g #cta {
                rect x=(left) y=(buttons_y) width=(cta_w) height=(cta_h) rx="14"
                    fill=(accent) filter="url(#cta-shadow)" {}
                text fill=(html_color(palette.accent_foreground)) font-size=(layout.cta_size)
                    font-weight="800" {
                    @for (i, line) in cta_lines.iter().enumerate() {
                        @let line_y = buttons_y + 22 + cta_lh * i as u32;
                        tspan x=(left + 34) y=(baseline(line_y, cta_lh, layout.cta_size)) {
                            (line)
                        }
                    }
                }
            }
            g #secondary-cta {
                rect x=(secondary_x + 1) y=(secondary_y + 1) width=(secondary_w - 2) height=(secondary_h - 2) rx="14"
                    fill="none" stroke="#FFFFFF" stroke-opacity="0.25" stroke-width="2" {}
                text x=(secondary_x + 28) y=(baseline(secondary_y, secondary_h, layout.secondary_size))
                    fill=(fg) font-size=(layout.secondary_size) font-weight="700" {
                    (secondary_line)
                }
            }
        }
    }
    .into_string()
}

/// Greedy word wrap. Words longer than a line are split. Text beyond
/// `max_lines` is cut and the last line ends with an ellipsis.
pub fn wrap_text(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while !word.is_empty() {
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed <= max_chars {
                if current_len > 0 {
                    current.push(' ');
                }
                current.extend(word.iter());
                current_len = needed;
                break;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            // Word alone does not fit on an empty line
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let mut chars: Vec<char> = last.chars().collect();
            chars.truncate(max_chars - 1);
            while chars.last() == Some(&' ') {
                chars.pop();
            }
            chars.push(ELLIPSIS);
            *last = chars.into_iter().collect();
        }
    }
    lines
}

fn max_chars(width: u32, font_size: u32, glyph_width: u32) -> usize {
    (width * 1000 / (font_size * glyph_width).max(1)) as usize
}

fn text_width(text: &str, font_size: u32, glyph_width: u32) -> u32 {
    text.chars().count() as u32 * font_size * glyph_width / 1000
}

fn line_height(font_size: u32, percent: u32) -> u32 { font_size * percent / 100 }

/// Baseline for text vertically centered in a box starting at `top`.
fn baseline(top: u32, box_height: u32, font_size: u32) -> u32 {
    top + box_height / 2 + font_size * 35 / 100
}

#[cfg(test)]
mod tests {
    use ogcard_core::{
        config::Defaults,
        models::Theme,
        params::{RawParams, resolve},
    };

    use super::*;

    fn config(query: &str) -> ResolvedConfig {
        resolve(&RawParams::from_query(query), &Defaults::default())
    }

    #[test]
    fn test_layout_for_ratio() {
        let square = Layout::for_ratio(Ratio::Square);
        let portrait = Layout::for_ratio(Ratio::Portrait);
        let wide = Layout::for_ratio(Ratio::Landscape);
        assert_eq!(square, portrait);
        assert_eq!((square.padding_x, square.padding_y), (100, 100));
        assert_eq!((wide.padding_x, wide.padding_y), (140, 80));
        assert!(square.title_size > wide.title_size);
        assert!(square.subtitle_size > wide.subtitle_size);
    }

    #[test]
    fn test_compose_deterministic() {
        let brand = BrandConfig::default();
        for query in ["", "title=Hi&theme=purple&ratio=4:5", "ratio=16:9&theme=dark"] {
            let config = config(query);
            let palette = ThemePalette::builtin(config.theme);
            assert_eq!(compose(&config, &palette, &brand), compose(&config, &palette, &brand));
        }
    }

    #[test]
    fn test_compose_structure() {
        let brand = BrandConfig::default();
        let config = config("title=Hello%20World&cta=Join&theme=dark&ratio=16:9");
        let palette = ThemePalette::builtin(Theme::Dark);
        let svg = compose(&config, &palette, &brand);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="0 0 1920 1080""#));
        assert!(svg.contains(r#"width="1920" height="1080""#));
        assert!(svg.contains("Hello World"));
        assert!(svg.contains(">Join<"));
        assert!(svg.contains("YOU CAN TRANSFORM™"));
        assert!(svg.contains("DM “COACH” to Register"));
        assert!(svg.contains(r##"stop-color="#0E1016""##));
        assert!(svg.contains(r##"fill="#65D7FF""##));
        for id in ["bg", "brand", "title", "subtitle", "cta", "secondary-cta"] {
            assert!(svg.contains(&format!(r#"id="{id}""#)), "missing {id}");
        }
    }

    #[test]
    fn test_compose_escapes_text() {
        let brand = BrandConfig::default();
        let config = config("title=%3Cscript%3E%26");
        let svg = compose(&config, &ThemePalette::builtin(Theme::Blue), &brand);
        assert!(svg.contains("&lt;script&gt;&amp;"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_compose_fits_long_text() {
        let brand = BrandConfig::default();
        let title = "word ".repeat(100);
        let config = ResolvedConfig { title, ..config("") };
        let svg = compose(&config, &ThemePalette::builtin(Theme::Blue), &brand);
        let title_part = element(&svg, "title");
        assert_eq!(title_part.matches("<tspan").count(), TITLE_MAX_LINES);
        assert!(title_part.contains(ELLIPSIS));
    }

    #[test]
    fn test_compose_wraps_cta() {
        let brand = BrandConfig { secondary_cta: "Register ".repeat(30), ..BrandConfig::default() };
        for ratio in Ratio::ALL {
            let config = ResolvedConfig { cta: "Reserve".repeat(28), ratio, ..config("") };
            let layout = Layout::for_ratio(ratio);
            let width = config.dimensions().width;
            let svg = compose(&config, &ThemePalette::builtin(Theme::Blue), &brand);

            let lines = tspans(element(&svg, "cta"));
            assert_eq!(lines.len(), CTA_MAX_LINES, "{ratio}");
            assert!(lines.last().is_some_and(|line| line.ends_with(ELLIPSIS)));
            for line in &lines {
                let text_w = text_width(line, layout.cta_size, BOLD_GLYPH_WIDTH);
                let right = layout.padding_x + 34 + text_w;
                assert!(right <= width - layout.padding_x, "{ratio}: CTA text ends at x={right}");
            }

            let secondary = element(&svg, "secondary-cta");
            assert!(secondary.contains(ELLIPSIS));
            assert!(!secondary.contains(brand.secondary_cta.trim_end()));
        }

        let short = compose(&config("cta=Join"), &ThemePalette::builtin(Theme::Blue), &brand);
        assert_eq!(tspans(element(&short, "cta")), ["Join"]);
    }

    /// Markup of the element with the given id, up to its closing tag.
    fn element<'a>(svg: &'a str, id: &str) -> &'a str {
        let start = svg.find(&format!(r#"id="{id}""#)).unwrap();
        let rest = &svg[start..];
        let end = rest.find("</text>").unwrap();
        &rest[..end]
    }

    fn tspans(markup: &str) -> Vec<String> {
        markup
            .split("<tspan")
            .skip(1)
            .map(|part| part.split('>').nth(1).unwrap().split('<').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_wrap_text() {
        let cases: &[(&str, usize, usize, &[&str])] = &[
            ("", 10, 3, &[]),
            ("hello", 10, 3, &["hello"]),
            ("hello world", 11, 3, &["hello world"]),
            ("hello world", 10, 3, &["hello", "world"]),
            ("  spaced   out  ", 20, 3, &["spaced out"]),
            ("abcdefghij", 4, 5, &["abcd", "efgh", "ij"]),
            ("one two three four", 5, 2, &["one", "two…"]),
            ("aaaa bbbb cccc", 4, 2, &["aaaa", "bbb…"]),
        ];
        for &(text, max_chars, max_lines, expected) in cases {
            assert_eq!(wrap_text(text, max_chars, max_lines), expected, "{text:?}");
        }
    }
}
