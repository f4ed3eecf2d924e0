pub mod svg;
pub mod template;
pub mod theme;

use std::io::Cursor;

use anyhow::{Result, anyhow};
use image::{DynamicImage, ImageFormat, codecs::jpeg::JpegEncoder};
use ogcard_core::models::{Dimensions, OutputFormat};

const WEBP_QUALITY: f32 = 85.0;
const JPEG_QUALITY: u8 = 90;

/// Turns a composed SVG document into response bytes.
///
/// Any error is reported to the client as a generic rendering failure.
pub trait ImageRenderer: Send + Sync {
    fn render(&self, svg: &str, dimensions: Dimensions, format: OutputFormat) -> Result<Vec<u8>>;
}

pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    match format {
        ImageFormat::WebP => {
            let encoder = webp::Encoder::from_image(image).map_err(|e| anyhow!("{e}"))?;
            Ok(encoder.encode(WEBP_QUALITY).to_vec())
        }
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            let mut out = Vec::new();
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
            Ok(out)
        }
        _ => {
            let mut out = Cursor::new(Vec::new());
            image.write_to(&mut out, format)?;
            Ok(out.into_inner())
        }
    }
}
