//! Atlas packing: every unique glyph into one square image
//!
//! Shelf packing over descending heights. The canvas starts at the
//! smallest power of two that fits the largest single glyph, rows fill
//! left to right, and a glyph that would overflow the canvas height
//! doubles the canvas and repacks everything from scratch. Packing is
//! never resumed from partial state; a restart at the larger size is
//! cheap and keeps the layout a pure function of the input order.

use crate::error::{CollabError, Result};
use crate::types::{AtlasImage, UvRect};

/// Fixed padding margin baked into every glyph window, in pixels per
/// side. Trimmed back off when the normalized UVs are computed.
pub const GLYPH_PADDING: u32 = 2;

/// One rasterized glyph: a fixed-size RGBA tile from the raster tool
/// plus the padded window of it that actually holds the glyph.
///
/// Window coordinates are inclusive-min, exclusive-max, and already
/// include [`GLYPH_PADDING`] on all four sides.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    /// `tile_size * tile_size * 4` bytes, row-major RGBA, y-up.
    pub tile: Vec<u8>,
    pub tile_size: u32,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl GlyphBitmap {
    pub fn width(&self) -> u32 {
        (self.x1 - self.x0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y1 - self.y0) as u32
    }

    fn validate(&self) -> Result<()> {
        let tile = self.tile_size as i32;
        if self.x0 < 0
            || self.y0 < 0
            || self.x1 > tile
            || self.y1 > tile
            || self.x1 < self.x0
            || self.y1 < self.y0
        {
            return Err(CollabError::Raster(format!(
                "glyph window ({},{})..({},{}) outside {}px raster tile",
                self.x0, self.y0, self.x1, self.y1, self.tile_size
            ))
            .into());
        }
        let expected = (self.tile_size * self.tile_size * 4) as usize;
        if self.tile.len() != expected {
            return Err(CollabError::Raster(format!(
                "raster tile is {} bytes, expected {}",
                self.tile.len(),
                expected
            ))
            .into());
        }
        Ok(())
    }
}

/// Result of rectangle packing: a pixel position per input glyph, in
/// input order, plus the square canvas side that was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packing {
    pub positions: Vec<(u32, u32)>,
    pub size: u32,
}

/// Shelf-pack the given `(width, height)` rectangles.
pub fn pack(sizes: &[(u32, u32)]) -> Packing {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1));

    let max_dim = sizes.iter().map(|&(w, h)| w.max(h)).max().unwrap_or(0);
    let mut size = 1;
    while size < max_dim {
        size *= 2;
    }

    loop {
        if let Some(positions) = try_pack(sizes, &order, size) {
            return Packing { positions, size };
        }
        size *= 2;
        log::debug!("atlas overflow, retrying at {size}px");
    }
}

fn try_pack(sizes: &[(u32, u32)], order: &[usize], size: u32) -> Option<Vec<(u32, u32)>> {
    let mut positions = vec![(0, 0); sizes.len()];
    let mut cur_x = 0;
    let mut cur_y = 0;
    let mut shelf_height = 0;

    for &idx in order {
        let (w, h) = sizes[idx];
        if cur_x + w > size {
            cur_x = 0;
            cur_y += shelf_height;
            shelf_height = 0;
        }
        if cur_y + h > size {
            return None;
        }
        positions[idx] = (cur_x, cur_y);
        cur_x += w;
        shelf_height = shelf_height.max(h);
    }

    Some(positions)
}

/// Pack and blit every glyph bitmap into one atlas, returning the image
/// and the padding-trimmed UV rectangle per glyph, in input order.
///
/// Input order must be the registry's sorted order so identical glyph
/// sets always bake identical atlases.
pub fn bake(bitmaps: &[GlyphBitmap]) -> Result<(AtlasImage, Vec<UvRect>)> {
    for bitmap in bitmaps {
        bitmap.validate()?;
    }

    let sizes: Vec<(u32, u32)> = bitmaps.iter().map(|b| (b.width(), b.height())).collect();
    let Packing { positions, size } = pack(&sizes);

    let mut pixels = vec![0u8; (size * size * 4) as usize];
    let mut uvs = Vec::with_capacity(bitmaps.len());
    let pad = GLYPH_PADDING as f32;
    let scale = size as f32;

    for (bitmap, &(base_x, base_y)) in bitmaps.iter().zip(&positions) {
        let row_bytes = (bitmap.width() * 4) as usize;

        // The raster tile is y-up; the atlas is y-down. Copy rows from
        // the top of the window downward.
        let mut out_y = base_y;
        for y in (bitmap.y0..bitmap.y1).rev() {
            let src = ((y as u32 * bitmap.tile_size + bitmap.x0 as u32) * 4) as usize;
            let dst = ((out_y * size + base_x) * 4) as usize;
            pixels[dst..dst + row_bytes].copy_from_slice(&bitmap.tile[src..src + row_bytes]);
            out_y += 1;
        }

        uvs.push(UvRect {
            u0: (base_x + GLYPH_PADDING) as f32 / scale,
            v0: (base_y + GLYPH_PADDING) as f32 / scale,
            u1: (base_x + bitmap.width() - GLYPH_PADDING) as f32 / scale,
            v1: (base_y + bitmap.height() - GLYPH_PADDING) as f32 / scale,
        });
    }

    Ok((AtlasImage { size, pixels }, uvs))
}
