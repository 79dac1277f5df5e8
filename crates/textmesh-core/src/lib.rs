//! textmesh core: from tagged strings to packed glyph geometry
//!
//! This crate holds everything the offline compiler is actually about.
//! A run walks the same stages every time:
//!
//! 1. **Content model** - two parsed tables: named styles, localized
//!    strings (built by `textmesh-input`, typed here)
//! 2. **Markup expansion** - inline tags become styled, paginated runs
//!    with author annotations
//! 3. **Shaping** - the external layout service positions glyphs
//! 4. **Registry** - occurrences collapse to unique glyphs with stable
//!    identities
//! 5. **Atlas** - unique glyphs rasterize (externally) and shelf-pack
//!    into one square image
//! 6. **Document** - pages serialize as quads joined to atlas UVs
//!    (written by `textmesh-export`)
//!
//! A two-level content-hash cache wraps the middle: a source-table hit
//! skips everything, a glyph-set hit skips rasterization and packing.
//! See [`pipeline::Compiler`] for the driver and [`traits`] for the
//! collaborator contracts the pipeline depends on.

pub mod arena;
pub mod atlas;
pub mod cache;
pub mod error;
pub mod hash;
pub mod markup;
pub mod pipeline;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{CollabError, Result, TextmeshError};
pub use pipeline::{CompileOutcome, Compiler, CompilerBuilder};
pub use traits::{FontCatalog, PageInput, RasterClient, ResolvedRun, ShapingService};
pub use types::{CompiledDocument, ContentModel};
