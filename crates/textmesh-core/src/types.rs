//! The data structures that flow between compiler stages
//!
//! Everything here is built once per run from the immutable input tables
//! and discarded at process exit. Stages hand these types forward by
//! value; nothing is shared mutably across stage boundaries.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::hash::djb2;

/// Face-specific glyph index, as reported by the shaping tool.
pub type GlyphIndex = u32;

/// One named entry of the style table.
///
/// The first declared style is the document default: markup outside any
/// style scope renders with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub face: String,
    pub point_size: u32,
    pub line_height: f32,
}

/// One row of the strings table: a key plus one text blob per language.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedString {
    pub key: String,
    pub target_width: u32,
    pub target_height: u32,
    /// One entry per language column, in header order.
    pub texts: Vec<String>,
}

impl LocalizedString {
    /// Width zero marks shared/referenced-only text: parsed and hashed,
    /// never shaped or serialized.
    pub fn in_scope(&self) -> bool {
        self.target_width > 0
    }
}

/// The parsed content model: style catalog, string table, language set.
#[derive(Debug, Clone, Default)]
pub struct ContentModel {
    pub styles: Vec<Style>,
    pub strings: Vec<LocalizedString>,
    /// Language keys from the strings table header; their order defines
    /// the language index used by every [`LocalizedString::texts`].
    pub languages: Vec<String>,
    /// Rolling hash over the raw bytes of both input tables.
    pub source_hash: u32,
}

impl ContentModel {
    pub fn language_index(&self, key: &str) -> Option<usize> {
        self.languages.iter().position(|lang| lang == key)
    }

    pub fn style_index(&self, name: &str) -> Option<usize> {
        self.styles.iter().position(|style| style.name == name)
    }
}

/// Half-open range of the plain-text buffer rendered with one style.
///
/// The runs of a page tile `[0, text.len())` exactly: no overlaps, no
/// gaps. `style` indexes [`ContentModel::styles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRun {
    pub start: u32,
    pub end: u32,
    pub style: usize,
}

/// An author-placed annotation range, passed through to the runtime.
///
/// Before shaping, `start`/`end` are byte offsets into the page's plain
/// text buffer. The pipeline remaps them to glyph-array indices once the
/// shaping tool has reported which offsets produced glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTag {
    pub label: String,
    pub start: u32,
    pub end: u32,
}

/// One page of markup-expanded output, before shaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupPage {
    /// Plain text with all tags stripped.
    pub text: String,
    pub runs: Vec<StyleRun>,
    pub tags: Vec<UserTag>,
}

/// The dedup key for glyphs: face name and glyph index, compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphRef {
    pub face: String,
    pub glyph: GlyphIndex,
}

/// Stable 64-bit glyph identity: `djb2(face) << 32 | glyph`.
///
/// Once shaping has run, face names are no longer carried alongside every
/// glyph occurrence; this key is how later stages join occurrences back
/// to unique glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey(pub u64);

impl GlyphKey {
    pub fn new(face: &str, glyph: GlyphIndex) -> Self {
        Self((u64::from(djb2(face.as_bytes())) << 32) | u64::from(glyph))
    }
}

/// Ink-extent rectangle in page-local coordinates, min corner inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One glyph occurrence as reported by the shaping tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// Byte offset into the page text that produced this glyph.
    pub source_offset: u32,
    pub face: String,
    pub glyph: GlyphIndex,
    pub quad: Quad,
}

/// One glyph occurrence after registry interning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypesetGlyph {
    pub source_offset: u32,
    pub key: GlyphKey,
    pub quad: Quad,
}

/// A fully typeset page: positioned glyphs plus remapped annotations.
///
/// Tag offsets here are glyph-array indices, not text offsets.
#[derive(Debug, Clone, Default)]
pub struct TypesetPage {
    pub glyphs: Vec<TypesetGlyph>,
    pub tags: Vec<UserTag>,
}

/// All pages of one in-scope string, ready to serialize.
#[derive(Debug, Clone)]
pub struct CompiledString {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub pages: Vec<TypesetPage>,
}

/// Normalized UV rectangle of one unique glyph inside the atlas, after
/// the padding margin has been trimmed back off.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// The packed atlas: one square RGBA image.
#[derive(Debug, Clone)]
pub struct AtlasImage {
    pub size: u32,
    /// `size * size * 4` bytes, row-major RGBA.
    pub pixels: Vec<u8>,
}

/// Everything a full rebuild produces.
///
/// `uvs` is indexed in sorted-registry order; `uv_index` joins a
/// [`GlyphKey`] to that order. `atlas` is `None` when the glyph-set cache
/// hit let the compiler reuse the previously packed image.
#[derive(Debug, Clone, Default)]
pub struct CompiledDocument {
    pub strings: Vec<CompiledString>,
    pub uvs: Vec<UvRect>,
    pub uv_index: HashMap<GlyphKey, usize>,
    pub atlas: Option<AtlasImage>,
}

/// One face known to the font catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceInfo {
    /// Stable face key: the font file's stem. Style tables and shaping
    /// output both speak in these keys.
    pub key: String,
    /// Display family name parsed from the font file.
    pub family: String,
    pub path: PathBuf,
}
