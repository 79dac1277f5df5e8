//! Error types for textmesh
//!
//! The compiler is a one-shot batch tool, so almost everything here is
//! fatal: report a diagnostic, leave no partial output behind, exit
//! non-zero. The single non-error "failure" path, a cache hit, is modeled
//! as a successful [`crate::pipeline::CompileOutcome`], not as an error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextmeshError>;

/// Main error type for textmesh
#[derive(Debug, Error)]
pub enum TextmeshError {
    /// A table row does not match its declared shape, a quote never
    /// closes, or a numeric field fails to parse.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// An input file or font file is absent.
    #[error("missing resource: {0}")]
    MissingResource(String),

    /// The requested language key is not a column of the strings table.
    #[error("language key not present in strings table: '{0}'")]
    UnknownLanguage(String),

    /// An external collaborator misbehaved.
    #[error("collaborator failed: {0}")]
    Collaborator(#[from] CollabError),

    /// A glyph identity could not be joined to a packed UV rectangle
    /// during serialization. The registry and the UV table diverged;
    /// emitting a document would corrupt it.
    #[error("internal consistency: {0}")]
    InternalConsistency(String),

    /// Compiler configuration error (a builder slot left empty).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the external shaping and rasterization tools
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("shaping tool: {0}")]
    Shaping(String),

    #[error("raster tool: {0}")]
    Raster(String),
}
