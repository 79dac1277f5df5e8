//! Subprocess client for the MSDF rasterizer tool
//!
//! Two invocations per glyph. The first asks for metrics and parses the
//! em-normalized ink bounds from a `bounds = x0, y0, x1, y1` line; the
//! second renders the multi-channel distance field into a fixed-size
//! binary tile that is read back from a temp file. Arguments are built
//! as a typed list, never as a shell string.
//!
//! Geometry matches the tile the tool is asked for: the glyph is
//! translated half an em into the tile and scaled to 64 pixels per em,
//! so the em origin sits 32 pixels in. Bounds are floored/ceiled to
//! whole pixels and grown by the atlas padding margin on every side.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use textmesh_core::atlas::{GlyphBitmap, GLYPH_PADDING};
use textmesh_core::error::{CollabError, Result};
use textmesh_core::traits::RasterClient;
use textmesh_core::types::{FaceInfo, GlyphIndex};

/// Side of the square tile the tool renders into, in pixels.
pub const GLYPH_TILE_SIZE: u32 = 128;

/// Distance-field range passed to the tool, in pixels.
const MSDF_PX_RANGE: u32 = 2;

/// Pixels per em at the scale the tool is asked to render.
const EM_SCALE: f32 = 64.0;

/// Where the em origin lands inside the tile (half an em at 64 px/em).
const TILE_ORIGIN: i32 = 32;

pub struct MsdfTool {
    tool: PathBuf,
}

impl MsdfTool {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    fn metrics(&self, face: &FaceInfo, glyph_arg: &str) -> Result<(f32, f32, f32, f32)> {
        let output = Command::new(&self.tool)
            .arg("metrics")
            .arg("-font")
            .arg(&face.path)
            .arg(glyph_arg)
            .arg("-emnormalize")
            .output()
            .map_err(|err| CollabError::Raster(format!("{}: {err}", self.tool.display())))?;
        if !output.status.success() {
            return Err(CollabError::Raster(format!(
                "metrics for {}#{glyph_arg} exited with {}",
                face.key, output.status
            ))
            .into());
        }
        parse_bounds(&String::from_utf8_lossy(&output.stdout))
    }

    fn render_tile(&self, face: &FaceInfo, glyph_arg: &str, out_path: &Path) -> Result<Vec<u8>> {
        let tile = GLYPH_TILE_SIZE.to_string();
        let px_range = MSDF_PX_RANGE.to_string();
        let status = Command::new(&self.tool)
            .arg("mtsdf")
            .arg("-font")
            .arg(&face.path)
            .arg(glyph_arg)
            .args(["-pxrange", px_range.as_str()])
            .arg("-emnormalize")
            .args(["-translate", "0.5", "0.5"])
            .args(["-scale", "64"])
            .args(["-dimensions", tile.as_str(), tile.as_str()])
            .args(["-format", "bin"])
            .arg("-o")
            .arg(out_path)
            .status()
            .map_err(|err| CollabError::Raster(format!("{}: {err}", self.tool.display())))?;
        if !status.success() {
            return Err(CollabError::Raster(format!(
                "render for {}#{glyph_arg} exited with {status}",
                face.key
            ))
            .into());
        }

        let tile = std::fs::read(out_path)
            .map_err(|err| CollabError::Raster(format!("reading rendered tile: {err}")))?;
        let _ = std::fs::remove_file(out_path);

        let expected = (GLYPH_TILE_SIZE * GLYPH_TILE_SIZE * 4) as usize;
        if tile.len() != expected {
            return Err(CollabError::Raster(format!(
                "tile for {}#{glyph_arg} is {} bytes, expected {expected}",
                face.key,
                tile.len()
            ))
            .into());
        }
        Ok(tile)
    }
}

impl RasterClient for MsdfTool {
    fn name(&self) -> &'static str {
        "msdf-tool"
    }

    fn rasterize(&self, face: &FaceInfo, glyph: GlyphIndex) -> Result<GlyphBitmap> {
        let glyph_arg = format!("g{glyph}");
        debug!("msdf {}#{glyph}", face.key);

        let (bx0, by0, bx1, by1) = self.metrics(face, &glyph_arg)?;
        let x0 = (EM_SCALE * bx0).floor() as i32;
        let y0 = (EM_SCALE * by0).floor() as i32;
        let x1 = (EM_SCALE * bx1).ceil() as i32;
        let y1 = (EM_SCALE * by1).ceil() as i32;

        let out_path = std::env::temp_dir().join(format!(
            "textmesh-glyph-{}-{glyph}.bin",
            std::process::id()
        ));
        let tile = self.render_tile(face, &glyph_arg, &out_path)?;

        let pad = GLYPH_PADDING as i32;
        Ok(GlyphBitmap {
            tile,
            tile_size: GLYPH_TILE_SIZE,
            x0: TILE_ORIGIN + x0 - pad,
            y0: TILE_ORIGIN + y0 - pad,
            x1: TILE_ORIGIN + x1 + pad,
            y1: TILE_ORIGIN + y1 + pad,
        })
    }
}

fn parse_bounds(text: &str) -> Result<(f32, f32, f32, f32)> {
    for line in text.lines() {
        let Some(rest) = line.trim_start().strip_prefix("bounds") else {
            continue;
        };
        let Some(values) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        let parsed: std::result::Result<Vec<f32>, _> =
            values.split(',').map(|v| v.trim().parse()).collect();
        if let Ok(nums) = parsed {
            if let [x0, y0, x1, y1] = nums[..] {
                return Ok((x0, y0, x1, y1));
            }
        }
        return Err(
            CollabError::Raster(format!("unparseable bounds line: '{}'", line.trim())).into(),
        );
    }
    Err(CollabError::Raster("metrics output has no bounds line".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bounds_line() {
        let text = "advance = 0.5\nbounds = -0.01, -0.2, 0.55, 0.72\n";
        assert_eq!(parse_bounds(text).unwrap(), (-0.01, -0.2, 0.55, 0.72));
    }

    #[test]
    fn missing_bounds_is_a_raster_failure() {
        assert!(parse_bounds("advance = 0.5\n").is_err());
    }

    #[test]
    fn malformed_bounds_is_a_raster_failure() {
        assert!(parse_bounds("bounds = 1, 2, three, 4\n").is_err());
        assert!(parse_bounds("bounds = 1, 2\n").is_err());
    }
}
