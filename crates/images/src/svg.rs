use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, ImageFormat, RgbaImage};
use ogcard_core::{
    config::FontConfig,
    models::{Dimensions, OutputFormat},
};
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg::{self, fontdb},
};

use crate::{ImageRenderer, encode_image};

/// Builds the font database used for text rendering.
pub fn load_fonts(config: &FontConfig) -> fontdb::Database {
    let mut db = fontdb::Database::new();
    if config.system {
        db.load_system_fonts();
    }
    for dir in &config.dirs {
        if dir.is_dir() {
            db.load_fonts_dir(dir);
        } else {
            tracing::debug!("Font directory {} does not exist", dir.display());
        }
    }
    for file in &config.files {
        if let Err(e) = db.load_font_file(file) {
            tracing::warn!("Failed to load font {}: {e}", file.display());
        }
    }
    if let Some(family) = &config.sans_serif_family {
        db.set_sans_serif_family(family.clone());
    }
    if db.is_empty() {
        tracing::warn!("No fonts loaded, text will not be rendered");
    } else {
        tracing::info!("Loaded {} font faces", db.len());
    }
    db
}

/// Rasterizes SVG documents with resvg.
#[derive(Clone)]
pub struct SvgRenderer {
    fontdb: Arc<fontdb::Database>,
}

impl SvgRenderer {
    pub fn new(fontdb: fontdb::Database) -> Self { Self { fontdb: Arc::new(fontdb) } }

    fn parse(&self, svg: &str) -> Result<usvg::Tree> {
        let options = usvg::Options { fontdb: self.fontdb.clone(), ..usvg::Options::default() };
        usvg::Tree::from_str(svg, &options).context("Failed to parse SVG")
    }

    pub fn render_pixmap(&self, svg: &str, dimensions: Dimensions) -> Result<Pixmap> {
        let tree = self.parse(svg)?;
        let Dimensions { width, height } = dimensions;
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("Failed to create {width}x{height} pixmap"))?;
        let size = tree.size();
        let transform =
            Transform::from_scale(width as f32 / size.width(), height as f32 / size.height());
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

impl ImageRenderer for SvgRenderer {
    fn render(&self, svg: &str, dimensions: Dimensions, format: OutputFormat) -> Result<Vec<u8>> {
        let image_format = match format {
            OutputFormat::Svg => {
                // Validate before handing the document out as-is
                self.parse(svg)?;
                return Ok(svg.as_bytes().to_vec());
            }
            OutputFormat::Png => {
                let pixmap = self.render_pixmap(svg, dimensions)?;
                return pixmap.encode_png().context("Failed to encode PNG");
            }
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
        };
        let pixmap = self.render_pixmap(svg, dimensions)?;
        encode_image(&pixmap_to_image(&pixmap)?, image_format)
    }
}

fn pixmap_to_image(pixmap: &Pixmap) -> Result<DynamicImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    let buffer = RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| anyhow!("Pixmap size mismatch"))?;
    Ok(DynamicImage::ImageRgba8(buffer))
}

#[cfg(test)]
mod tests {
    use image::GenericImageView;
    use ogcard_core::{
        config::{BrandConfig, Defaults},
        models::Ratio,
        params::{RawParams, resolve},
    };

    use super::*;
    use crate::{template::compose, theme::Palettes};

    fn renderer() -> SvgRenderer { SvgRenderer::new(fontdb::Database::new()) }

    fn composed(query: &str) -> (String, Dimensions) {
        let config = resolve(&RawParams::from_query(query), &Defaults::default());
        let palettes = Palettes::default();
        let svg = compose(&config, palettes.get(config.theme), &BrandConfig::default());
        (svg, config.dimensions())
    }

    #[test]
    fn test_render_dimensions() {
        let renderer = renderer();
        for ratio in Ratio::ALL {
            let (svg, dims) = composed(&format!("ratio={}", ratio.as_str()));
            let png = renderer.render(&svg, dims, OutputFormat::Png).unwrap();
            let image = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
            assert_eq!(image.dimensions(), (dims.width, dims.height));
        }
    }

    #[test]
    fn test_render_formats() {
        let renderer = renderer();
        let (svg, dims) = composed("theme=orange&ratio=16:9");
        let jpeg = renderer.render(&svg, dims, OutputFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let webp = renderer.render(&svg, dims, OutputFormat::WebP).unwrap();
        assert_eq!(image::guess_format(&webp).unwrap(), ImageFormat::WebP);
        let out = renderer.render(&svg, dims, OutputFormat::Svg).unwrap();
        assert_eq!(out, svg.as_bytes());
    }

    #[test]
    fn test_render_background() {
        let (svg, dims) = composed("theme=dark");
        let pixmap = renderer().render_pixmap(&svg, dims).unwrap();
        // Bottom-right corner is the dark gradient end, fully opaque
        let pixel = pixmap.pixel(dims.width - 1, dims.height - 1).unwrap();
        assert_eq!(pixel.alpha(), 255);
        assert!(pixel.red() < 0x40 && pixel.green() < 0x40 && pixel.blue() < 0x50);
    }

    #[test]
    fn test_render_invalid_svg() {
        let dims = Ratio::Square.dimensions();
        assert!(renderer().render("<svg", dims, OutputFormat::Png).is_err());
        assert!(renderer().render("not svg", dims, OutputFormat::Svg).is_err());
    }
}
