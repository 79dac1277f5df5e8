//! The persisted cache record behind incremental recompilation
//!
//! One small binary file holds everything the incremental path needs:
//! the source-table hash, the used-glyph-set hash, and the packed UV
//! table from the last full bake. Layout, all little-endian:
//!
//! ```text
//! sourceHash:u32  glyphSetHash:u32  glyphCount:u32  [u0 v0 u1 v1]:f32 * glyphCount
//! ```
//!
//! A missing, truncated, or otherwise implausible file is a cold start,
//! never an error; the record is only trusted when every byte of it is
//! accounted for.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::types::UvRect;

/// Default cache file name inside the output directory.
pub const CACHE_FILE_NAME: &str = ".textmesh-cache";

const HEADER_LEN: usize = 12;
const UV_LEN: usize = 16;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheRecord {
    pub source_hash: u32,
    pub glyph_set_hash: u32,
    pub uvs: Vec<UvRect>,
}

impl CacheRecord {
    /// Read a record back, or `None` for any kind of cold start.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("no usable cache at {}: {err}", path.display());
                return None;
            }
        };
        if bytes.len() < HEADER_LEN {
            debug!("cache file truncated ({} bytes); cold start", bytes.len());
            return None;
        }

        let source_hash = read_u32(&bytes, 0);
        let glyph_set_hash = read_u32(&bytes, 4);
        let count = read_u32(&bytes, 8) as usize;
        if bytes.len() != HEADER_LEN + count * UV_LEN {
            debug!("cache glyph count disagrees with file size; cold start");
            return None;
        }

        let mut uvs = Vec::with_capacity(count);
        for i in 0..count {
            let at = HEADER_LEN + i * UV_LEN;
            uvs.push(UvRect {
                u0: read_f32(&bytes, at),
                v0: read_f32(&bytes, at + 4),
                u1: read_f32(&bytes, at + 8),
                v1: read_f32(&bytes, at + 12),
            });
        }

        Some(Self {
            source_hash,
            glyph_set_hash,
            uvs,
        })
    }

    /// Persist the whole record, replacing whatever was there.
    pub fn store(&self, path: &Path) -> Result<()> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.uvs.len() * UV_LEN);
        bytes.extend_from_slice(&self.source_hash.to_le_bytes());
        bytes.extend_from_slice(&self.glyph_set_hash.to_le_bytes());
        bytes.extend_from_slice(&(self.uvs.len() as u32).to_le_bytes());
        for uv in &self.uvs {
            bytes.extend_from_slice(&uv.u0.to_le_bytes());
            bytes.extend_from_slice(&uv.v0.to_le_bytes());
            bytes.extend_from_slice(&uv.u1.to_le_bytes());
            bytes.extend_from_slice(&uv.v1.to_le_bytes());
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(bytes, at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("textmesh_cache_{tag}_{nanos}"))
    }

    fn sample() -> CacheRecord {
        CacheRecord {
            source_hash: 0xDEAD_BEEF,
            glyph_set_hash: 0x1234_5678,
            uvs: vec![
                UvRect { u0: 0.25, v0: 0.25, u1: 0.75, v1: 0.75 },
                UvRect { u0: 0.0, v0: 0.5, u1: 0.5, v1: 1.0 },
            ],
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let path = temp_path("roundtrip");
        let record = sample();
        record.store(&path).unwrap();
        assert_eq!(CacheRecord::load(&path), Some(record));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_cold_start() {
        assert_eq!(CacheRecord::load(&temp_path("missing")), None);
    }

    #[test]
    fn truncated_file_is_cold_start() {
        let path = temp_path("short");
        std::fs::write(&path, [1, 2, 3]).unwrap();
        assert_eq!(CacheRecord::load(&path), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn count_mismatch_is_cold_start() {
        let path = temp_path("mismatch");
        let record = sample();
        record.store(&path).unwrap();
        // Chop half a UV entry off the end.
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();
        assert_eq!(CacheRecord::load(&path), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn layout_is_little_endian_and_fixed() {
        let path = temp_path("layout");
        let record = CacheRecord {
            source_hash: 1,
            glyph_set_hash: 2,
            uvs: vec![UvRect { u0: 1.0, v0: 0.0, u1: 0.0, v1: 0.0 }],
        };
        record.store(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 12 + 16);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &1.0f32.to_le_bytes());
        let _ = std::fs::remove_file(&path);
    }
}
