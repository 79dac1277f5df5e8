//! Atlas image export
//!
//! The packed atlas goes to disk as a plain RGBA PNG so any runtime or
//! image viewer can load it. Encoding goes through the `image` crate's
//! PNG encoder; the buffer is validated against the declared dimensions
//! first, because a size mismatch here means an upstream bug, not bad
//! user input.

use std::fs;
use std::path::Path;

use image::{ExtendedColorType, ImageEncoder};
use log::info;

use textmesh_core::error::{Result, TextmeshError};
use textmesh_core::types::AtlasImage;

/// Default atlas file name inside the output directory.
pub const ATLAS_FILE_NAME: &str = "atlas.png";

/// Encode the atlas as PNG bytes.
pub fn encode_atlas_png(atlas: &AtlasImage) -> Result<Vec<u8>> {
    let expected = (atlas.size * atlas.size * 4) as usize;
    if atlas.pixels.len() != expected {
        return Err(TextmeshError::InternalConsistency(format!(
            "atlas buffer is {} bytes for a {}px square, expected {expected}",
            atlas.pixels.len(),
            atlas.size
        )));
    }

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(&atlas.pixels, atlas.size, atlas.size, ExtendedColorType::Rgba8)
        .map_err(|err| TextmeshError::InternalConsistency(format!("png encoding failed: {err}")))?;
    Ok(png)
}

/// Encode and persist the atlas image.
pub fn write_atlas_png(atlas: &AtlasImage, path: &Path) -> Result<()> {
    let png = encode_atlas_png(atlas)?;
    fs::write(path, &png)?;
    info!("wrote {} ({}px square)", path.display(), atlas.size);
    Ok(())
}
