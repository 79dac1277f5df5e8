//! Per-page debug output
//!
//! Writes one PNG per page with every typeset glyph's ink quad filled
//! in, which is enough to eyeball layout and tag placement without a
//! runtime renderer. Quads are clamped to the page surface; glyphs
//! whose ink falls entirely outside it simply leave no mark.

use std::fs;
use std::path::Path;

use image::{ExtendedColorType, ImageEncoder};

use textmesh_core::error::{Result, TextmeshError};
use textmesh_core::types::TypesetPage;

/// Render a page's glyph bounds and write them as an RGBA PNG.
pub fn write_page_bounds(page: &TypesetPage, width: u32, height: u32, path: &Path) -> Result<()> {
    let pixels = render_page_bounds(page, width, height);

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|err| TextmeshError::InternalConsistency(format!("png encoding failed: {err}")))?;
    fs::write(path, &png)?;
    Ok(())
}

fn render_page_bounds(page: &TypesetPage, width: u32, height: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (width * height * 4) as usize];

    for glyph in &page.glyphs {
        let q = glyph.quad;
        let x_min = q.x0.floor().max(0.0) as u32;
        let y_min = q.y0.floor().max(0.0) as u32;
        let x_max = q.x1.ceil().min(width as f32) as u32;
        let y_max = q.y1.ceil().min(height as f32) as u32;

        for y in y_min..y_max {
            for x in x_min..x_max {
                let at = ((y * width + x) * 4) as usize;
                for c in 0..4 {
                    pixels[at + c] = pixels[at + c].max(0x7F);
                }
            }
        }
    }

    pixels
}
