//! GPU plumbing behind [`crate::RenderSurface`].
//!
//! - `context` owns the wgpu instance/device/surface and reconfigures the
//!   swapchain on resize.
//! - `pipeline` links the compiled program into a triangle-strip pipeline
//!   with one uniform bind group.
//! - `present` stretches a reduced-resolution scene target over the
//!   swapchain image.
//! - `uniforms` mirrors the std140 block and maps uniform names to offsets.
//! - `probe` picks the full or lite program from the adapter identity.

mod context;
mod pipeline;
mod present;
pub mod probe;
mod uniforms;

pub use context::AdapterProfile;
pub(crate) use context::GpuContext;
pub(crate) use pipeline::{MultisampleTarget, ScenePipeline};
pub(crate) use present::{PresentPipeline, SceneTarget};
pub(crate) use uniforms::SceneUniforms;
pub use uniforms::{UniformKind, UniformSlot, UniformSlots, UniformValue, UNIFORM_NAMES};
