//! The contracts that bind the external collaborators
//!
//! The compiler never shapes text, rasterizes a glyph, or parses a font
//! file itself. Three trait objects stand in for the tools that do, and
//! the pipeline talks to nothing but these. Each carries a `name()` so
//! logs and errors can say which collaborator misbehaved.
//!
//! All collaborator calls are synchronous and blocking; a hung tool
//! hangs the compile. That is the intended resource model for a batch
//! tool, not an oversight.

use crate::error::Result;
use crate::types::{FaceInfo, GlyphIndex, ShapedGlyph, Style};
use crate::atlas::GlyphBitmap;

/// Everything the shaping tool needs to lay out one page.
#[derive(Debug, Clone)]
pub struct PageInput<'a> {
    /// Plain text with markup already stripped.
    pub text: &'a str,
    /// Style runs resolved to concrete styles, tiling `text`.
    pub runs: Vec<ResolvedRun<'a>>,
    pub width: u32,
    pub height: u32,
}

/// One style run with its catalog entry resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRun<'a> {
    pub start: u32,
    pub end: u32,
    pub style: &'a Style,
}

/// The external text-shaping and line-layout service.
///
/// Given a styled page it returns positioned glyph occurrences in
/// whatever order it likes; the pipeline re-sorts by source offset.
/// Whitespace and zero-extent glyphs are the service's to omit.
pub trait ShapingService: Send + Sync {
    fn name(&self) -> &'static str;

    fn shape_page(&self, page: &PageInput<'_>) -> Result<Vec<ShapedGlyph>>;
}

/// The external per-glyph rasterization tool.
///
/// Returns a fixed-size multi-channel distance-field tile plus the
/// padded window of it holding the glyph's ink.
pub trait RasterClient: Send + Sync {
    fn name(&self) -> &'static str;

    fn rasterize(&self, face: &FaceInfo, glyph: GlyphIndex) -> Result<GlyphBitmap>;
}

/// The font-catalog service: which faces exist and where they live.
pub trait FontCatalog: Send + Sync {
    /// All known faces, in a stable order.
    fn faces(&self) -> &[FaceInfo];

    /// Lookup by face key (the font file's stem).
    fn by_key(&self, key: &str) -> Option<&FaceInfo>;

    /// Lookup by display family name.
    fn by_family(&self, family: &str) -> Option<&FaceInfo>;
}
