//! The packed document format
//!
//! Everything little-endian. The file opens with a magic/version word
//! (ASCII `TXT` plus a version byte) and a count of in-scope strings,
//! then per string: its padded key, target width and height, and its
//! pages. Each page carries its annotation ranges followed by one quad
//! per glyph as four `{x, y, u, v}` vertices, corners in the fixed
//! order `(x0,y0) (x0,y1) (x1,y1) (x1,y0)`.
//!
//! Strings and labels are length-prefixed with one byte and zero-padded
//! so the next field always starts on a 4-byte boundary.
//!
//! The document is encoded fully in memory and renamed into place, so a
//! failed run never leaves a partial file where the runtime would find
//! it.

use std::fs;
use std::path::Path;

use log::info;

use textmesh_core::error::{Result, TextmeshError};
use textmesh_core::types::CompiledDocument;

/// ASCII `TXT` with a zero version byte on top.
pub const DOCUMENT_MAGIC: u32 = 0x0054_5854;

/// Default document file name inside the output directory.
pub const DOCUMENT_FILE_NAME: &str = "strings.txm";

/// Serialize the document into its on-disk byte layout.
pub fn encode_document(doc: &CompiledDocument) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    put_u32(&mut out, DOCUMENT_MAGIC);
    put_u32(&mut out, doc.strings.len() as u32);

    for string in &doc.strings {
        put_padded_str(&mut out, &string.key)?;
        put_u32(&mut out, string.width);
        put_u32(&mut out, string.height);
        put_u32(&mut out, string.pages.len() as u32);

        for page in &string.pages {
            put_u32(&mut out, page.tags.len() as u32);
            for tag in &page.tags {
                put_padded_str(&mut out, &tag.label)?;
                put_u32(&mut out, tag.start);
                put_u32(&mut out, tag.end);
            }

            put_u32(&mut out, 4 * page.glyphs.len() as u32);
            for glyph in &page.glyphs {
                let uv = doc
                    .uv_index
                    .get(&glyph.key)
                    .and_then(|&pos| doc.uvs.get(pos))
                    .ok_or_else(|| {
                        TextmeshError::InternalConsistency(format!(
                            "glyph identity {:#018x} in string '{}' has no packed UV entry",
                            glyph.key.0, string.key
                        ))
                    })?;

                let q = glyph.quad;
                for (x, y, u, v) in [
                    (q.x0, q.y0, uv.u0, uv.v0),
                    (q.x0, q.y1, uv.u0, uv.v1),
                    (q.x1, q.y1, uv.u1, uv.v1),
                    (q.x1, q.y0, uv.u1, uv.v0),
                ] {
                    put_f32(&mut out, x);
                    put_f32(&mut out, y);
                    put_f32(&mut out, u);
                    put_f32(&mut out, v);
                }
            }
        }
    }

    Ok(out)
}

/// Encode and persist the document, atomically.
pub fn write_document(doc: &CompiledDocument, path: &Path) -> Result<()> {
    let bytes = encode_document(doc)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| TextmeshError::Config(format!("bad document path {}", path.display())))?;
    let tmp = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// One length byte, the bytes themselves, then zero padding up to the
/// next 4-byte boundary.
fn put_padded_str(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u8::MAX as usize {
        return Err(TextmeshError::MalformedTable(format!(
            "'{}' exceeds the 255-byte limit for keys and labels",
            &s[..32.min(s.len())]
        )));
    }
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    let pad = (4 - ((bytes.len() + 1) % 4)) % 4;
    out.extend_from_slice(&[0, 0, 0][..pad]);
    Ok(())
}
