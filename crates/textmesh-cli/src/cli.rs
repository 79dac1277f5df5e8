//! CLI argument definitions using Clap v4

use clap::Parser;
use std::path::PathBuf;

/// textmesh - offline styled-text mesh compiler
///
/// Compiles a styles table and a strings table into a packed binary
/// document plus a glyph atlas, for one target language per invocation.
#[derive(Parser, Debug)]
#[command(name = "textmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target language key, matched case-sensitively against the
    /// strings table header
    pub language: String,

    /// Styles table: name, fontFace, pointSize, lineHeight
    #[arg(long, default_value = "styles.csv")]
    pub styles: PathBuf,

    /// Strings table: key, width, height, one column per language
    #[arg(long, default_value = "strings.csv")]
    pub strings: PathBuf,

    /// Directory scanned for font files
    #[arg(long = "fonts-dir", default_value = ".")]
    pub fonts_dir: PathBuf,

    /// Output directory for the document, atlas, and cache record
    #[arg(short = 'o', long = "out-dir", default_value = "bin")]
    pub out_dir: PathBuf,

    /// External shaping/layout tool invoked once per page
    #[arg(long = "shape-tool", default_value = "tool/textshape")]
    pub shape_tool: PathBuf,

    /// External MSDF rasterizer invoked once per unique glyph
    #[arg(long = "msdf-tool", default_value = "tool/msdfgen")]
    pub msdf_tool: PathBuf,

    /// Also write per-page glyph-bounds PNGs into the output directory
    #[arg(long = "debug-pages")]
    pub debug_pages: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}
