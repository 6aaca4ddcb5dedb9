//! Black hole rendering
//!
//! Per-frame zone/star batches, the lensing compositor and its backends.

pub mod batch;
pub mod compositor;
pub mod gpu;
pub mod recording;
pub mod shapes;
pub mod vertex;

pub use batch::{BlackHoleBatch, FrameBatch, LensingZone, StarBatch, StarDecoration, ZoneBatch};
pub use compositor::{
    CompositeMode, CompositeStats, LensingBackend, LensingCompositor, ShaderPass,
};
pub use gpu::GpuLensing;
pub use recording::RecordingBackend;
pub use vertex::Vertex;
