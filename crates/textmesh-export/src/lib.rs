//! Export: the compiler's output surface
//!
//! Three writers, one per artifact: the packed binary document the
//! runtime consumes, the RGBA atlas PNG it samples from, and optional
//! per-page debug images for humans.

pub mod atlas;
pub mod debug;
pub mod document;

pub use atlas::{encode_atlas_png, write_atlas_png, ATLAS_FILE_NAME};
pub use document::{encode_document, write_document, DOCUMENT_FILE_NAME, DOCUMENT_MAGIC};
