//! Renderer crate for the folio background.
//!
//! Hosts the procedural scene in a `winit` window backed by a `wgpu`
//! swapchain. The overall flow is:
//!
//! ```text
//!   folio run
//!       │ RendererConfig
//!       ▼
//!   WindowRuntime::spawn ──▶ window thread ──▶ winit event loop
//!       │ select / clear                          │ RedrawRequested
//!       ▼                                         ▼
//!   EventLoopProxy ──▶ SelectionState      FrameDriver::tick
//!                                                 │ time, pointer, selection
//!                                                 ▼
//!                                     RenderSurface::update ─▶ draw()
//! ```
//!
//! `RenderSurface` owns the GPU context, the scene pipeline and the uniform
//! slots. The fragment program is picked once per window from the adapter
//! identity (`gpu::probe`): the full variant raymarches the morphing solid,
//! the lite variant draws a flat cloud in its place. Both read the same
//! uniform block.

pub mod clock;
mod compile;
mod gpu;
pub mod pointer;
mod surface;
mod types;
pub mod visibility;
mod window;

pub use clock::{DriverState, FrameDriver, FrameStats, FrameTime};
pub use compile::{fragment_source, validate_glsl, ShaderStage, VERTEX_SHADER_GLSL};
pub use gpu::probe::{platform_fallback, probe_renderer, resolve_variant, ProbeResult};
pub use gpu::{AdapterProfile, UniformKind, UniformSlot, UniformSlots, UniformValue, UNIFORM_NAMES};
pub use pointer::{PointerMapping, PointerSmoother};
pub use surface::{backing_size, FragmentChoice, RenderSurface, SurfaceError, SurfaceSizes};
pub use types::{Antialiasing, RendererConfig, ShaderVariant};
pub use visibility::{Rect, VisibilityGate};
pub use window::WindowRuntime;
