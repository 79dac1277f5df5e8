//! Subprocess-backed implementations of the collaborator contracts

pub mod raster;
pub mod shaper;

pub use raster::MsdfTool;
pub use shaper::ShapeTool;
