//! Render surface: GPU context, the linked scene program and its uniform
//! slots, drawn as one full-screen quad per frame.
//!
//! The swapchain always matches the window. The scene is drawn at the
//! backing-store size; when that differs from the swapchain it goes to an
//! offscreen target that a second pass stretches over the window.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use scene::SceneInputs;
use thiserror::Error;
use winit::dpi::{LogicalSize, PhysicalSize};

use crate::compile::{compile_program, ShaderStage};
use crate::gpu::{
    AdapterProfile, GpuContext, MultisampleTarget, PresentPipeline, SceneTarget, SceneUniforms,
    ScenePipeline, UniformSlots,
};
use crate::types::{Antialiasing, ShaderVariant};

/// Failures raised while bringing up a [`RenderSurface`].
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// No usable GPU context could be created for the window.
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),
    /// One program stage failed to compile.
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    Compile {
        stage: ShaderStage,
        diagnostic: String,
    },
    /// The stages compiled but the pipeline could not be created.
    #[error("shader program failed to link:\n{diagnostic}")]
    Link { diagnostic: String },
}

/// Program choice made once the adapter is known.
pub struct FragmentChoice {
    pub variant: ShaderVariant,
    pub source: String,
}

/// Swapchain and scene render-target sizes for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSizes {
    /// The window's physical size.
    pub swapchain: PhysicalSize<u32>,
    /// The backing store the scene is rendered at.
    pub render: PhysicalSize<u32>,
}

impl SurfaceSizes {
    /// Sizes for a window of physical size `window` at `device_pixel_ratio`.
    /// Both are clamped to `1..=max_dimension`.
    pub fn for_window(
        window: PhysicalSize<u32>,
        device_pixel_ratio: f64,
        max_device_pixel_ratio: f64,
        resolution_scale: f64,
        max_dimension: u32,
    ) -> Self {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let logical = LogicalSize::new(
            f64::from(window.width) / ratio,
            f64::from(window.height) / ratio,
        );
        Self {
            swapchain: clamp_size(window, max_dimension),
            render: backing_size(
                logical,
                ratio,
                max_device_pixel_ratio,
                resolution_scale,
                max_dimension,
            ),
        }
    }

    /// Whether the scene needs the stretch pass to cover the window.
    pub fn needs_stretch(&self) -> bool {
        self.render != self.swapchain
    }

    fn clamped(self, max_dimension: u32) -> Self {
        Self {
            swapchain: clamp_size(self.swapchain, max_dimension),
            render: clamp_size(self.render, max_dimension),
        }
    }
}

fn clamp_size(size: PhysicalSize<u32>, max_dimension: u32) -> PhysicalSize<u32> {
    let max_dimension = max_dimension.max(1);
    PhysicalSize::new(
        size.width.clamp(1, max_dimension),
        size.height.clamp(1, max_dimension),
    )
}

/// Live rendering state for one window.
pub struct RenderSurface {
    context: GpuContext,
    pipeline: ScenePipeline,
    present: PresentPipeline,
    slots: UniformSlots,
    uniforms: SceneUniforms,
    multisample: Option<MultisampleTarget>,
    /// `None` while the render size equals the swapchain size.
    scene_target: Option<SceneTarget>,
    sizes: SurfaceSizes,
    variant: ShaderVariant,
}

impl RenderSurface {
    /// Creates the context on `target`, compiles `vertex` plus the fragment
    /// source picked by `fragment` for the adapter, links them, and resolves
    /// `uniform_names` to slots.
    pub fn initialize<T, F>(
        target: &T,
        vertex: &str,
        fragment: F,
        uniform_names: &[&str],
        antialiasing: Antialiasing,
        initial: SurfaceSizes,
    ) -> Result<Self, SurfaceError>
    where
        T: HasDisplayHandle + HasWindowHandle,
        F: FnOnce(&AdapterProfile) -> FragmentChoice,
    {
        let context = GpuContext::new(target, initial.swapchain, antialiasing)?;
        let FragmentChoice { variant, source } = fragment(&context.adapter_profile);

        let program = compile_program(&context.device, variant, vertex, &source)?;
        let pipeline = ScenePipeline::new(
            &context.device,
            &program,
            context.surface_format,
            context.sample_count,
        )?;
        let present = PresentPipeline::new(&context.device, context.surface_format)?;
        let slots = UniformSlots::resolve(uniform_names);

        let sizes = SurfaceSizes {
            swapchain: context.size(),
            render: initial.render,
        }
        .clamped(context.max_texture_dimension);

        let mut surface = Self {
            uniforms: SceneUniforms::new(sizes.render.width, sizes.render.height),
            context,
            pipeline,
            present,
            slots,
            multisample: None,
            scene_target: None,
            sizes,
            variant,
        };
        surface.rebuild_targets();
        Ok(surface)
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Current backing-store size, the resolution the scene is rendered at.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.sizes.render
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.context.max_texture_dimension
    }

    /// Applies new swapchain and backing-store sizes. Returns `false` when
    /// nothing changed.
    pub fn resize(&mut self, sizes: SurfaceSizes) -> bool {
        let sizes = sizes.clamped(self.context.max_texture_dimension);
        if sizes == self.sizes {
            return false;
        }
        self.context.resize(sizes.swapchain);
        self.sizes = SurfaceSizes {
            swapchain: self.context.size(),
            render: sizes.render,
        };
        self.rebuild_targets();
        tracing::debug!(
            swapchain_width = self.sizes.swapchain.width,
            swapchain_height = self.sizes.swapchain.height,
            width = self.sizes.render.width,
            height = self.sizes.render.height,
            "resized backing store"
        );
        true
    }

    /// Recreates the render-size MSAA and scene targets.
    fn rebuild_targets(&mut self) {
        let device = &self.context.device;
        let format = self.context.surface_format;
        self.multisample = (self.context.sample_count > 1).then(|| {
            MultisampleTarget::new(device, format, self.sizes.render, self.context.sample_count)
        });
        self.scene_target = self
            .sizes
            .needs_stretch()
            .then(|| SceneTarget::new(device, &self.present, format, self.sizes.render));
    }

    /// Re-applies the surface configuration after `Lost`/`Outdated`.
    pub fn reconfigure(&self) {
        self.context.reconfigure();
    }

    /// Stages this frame's uniforms.
    pub fn update(&mut self, inputs: &SceneInputs) {
        self.slots.write_inputs(&mut self.uniforms, inputs);
    }

    /// Uploads the staged uniforms and issues the single draw call.
    pub fn draw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context.queue.write_buffer(
            &self.pipeline.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene encoder"),
            });
        {
            let scene_view = self.scene_target.as_ref().map_or(&view, |target| &target.view);
            let (attachment_view, resolve_target) = match self.multisample.as_ref() {
                Some(msaa) => (&msaa.view, Some(scene_view)),
                None => (scene_view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.pipeline.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.pipeline.quad_buffer.slice(..));
            render_pass.draw(0..4, 0..1);
        }

        if let Some(target) = self.scene_target.as_ref() {
            let mut present_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            present_pass.set_pipeline(&self.present.pipeline);
            present_pass.set_bind_group(0, &target.bind_group, &[]);
            present_pass.set_vertex_buffer(0, self.pipeline.quad_buffer.slice(..));
            present_pass.draw(0..4, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// Backing-store size for a surface of `logical` size: the device pixel
/// ratio is capped at `max_device_pixel_ratio`, multiplied by
/// `resolution_scale`, rounded, and clamped to `1..=max_dimension`.
pub fn backing_size(
    logical: LogicalSize<f64>,
    device_pixel_ratio: f64,
    max_device_pixel_ratio: f64,
    resolution_scale: f64,
    max_dimension: u32,
) -> PhysicalSize<u32> {
    let ratio = device_pixel_ratio.min(max_device_pixel_ratio).max(0.0) * resolution_scale;
    let max_dimension = max_dimension.max(1);
    let axis = |value: f64| -> u32 {
        let scaled = (value * ratio).round();
        if !scaled.is_finite() || scaled < 1.0 {
            1
        } else {
            (scaled.min(max_dimension as f64)) as u32
        }
    };
    PhysicalSize::new(axis(logical.width), axis(logical.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 8192;

    #[test]
    fn halving_the_scale_halves_the_backing_store() {
        let logical = LogicalSize::new(1920.0, 1080.0);
        let full = backing_size(logical, 1.0, 2.0, 1.0, MAX);
        let half = backing_size(logical, 1.0, 2.0, 0.5, MAX);
        assert_eq!(full, PhysicalSize::new(1920, 1080));
        assert_eq!(half, PhysicalSize::new(960, 540));
    }

    #[test]
    fn device_pixel_ratio_is_capped() {
        let logical = LogicalSize::new(800.0, 600.0);
        assert_eq!(
            backing_size(logical, 3.0, 2.0, 1.0, MAX),
            PhysicalSize::new(1600, 1200)
        );
        assert_eq!(
            backing_size(logical, 2.0, 2.0, 0.6, MAX),
            PhysicalSize::new(960, 720)
        );
    }

    #[test]
    fn backing_store_is_clamped_to_device_limits() {
        assert_eq!(
            backing_size(LogicalSize::new(0.0, 0.4), 1.0, 2.0, 0.6, MAX),
            PhysicalSize::new(1, 1)
        );
        assert_eq!(
            backing_size(LogicalSize::new(10_000.0, 300.0), 2.0, 2.0, 1.0, 4096),
            PhysicalSize::new(4096, 600)
        );
    }

    #[test]
    fn repeated_sizing_is_idempotent() {
        let logical = LogicalSize::new(1366.0, 768.0);
        let first = backing_size(logical, 1.25, 2.0, 0.6, MAX);
        let second = backing_size(logical, 1.25, 2.0, 0.6, MAX);
        assert_eq!(first, second);
    }

    #[test]
    fn swapchain_keeps_the_window_size_while_the_scene_shrinks() {
        let window = PhysicalSize::new(1920, 1080);
        let sizes = SurfaceSizes::for_window(window, 1.0, 2.0, 0.6, MAX);
        assert_eq!(sizes.swapchain, window);
        assert_eq!(
            sizes.render,
            backing_size(LogicalSize::new(1920.0, 1080.0), 1.0, 2.0, 0.6, MAX)
        );
        assert_eq!(sizes.render, PhysicalSize::new(1152, 648));
        assert!(sizes.needs_stretch());
    }

    #[test]
    fn high_density_windows_render_at_the_capped_ratio() {
        let window = PhysicalSize::new(4320, 2430);
        let sizes = SurfaceSizes::for_window(window, 3.0, 2.0, 1.0, MAX);
        assert_eq!(sizes.swapchain, window);
        assert_eq!(sizes.render, PhysicalSize::new(2880, 1620));
    }

    #[test]
    fn full_scale_renders_straight_to_the_swapchain() {
        let window = PhysicalSize::new(1280, 800);
        let sizes = SurfaceSizes::for_window(window, 1.0, 2.0, 1.0, MAX);
        assert_eq!(sizes.render, window);
        assert!(!sizes.needs_stretch());
    }

    #[test]
    fn both_sizes_respect_the_device_limit() {
        let sizes = SurfaceSizes::for_window(PhysicalSize::new(9000, 0), 1.0, 2.0, 2.0, 4096);
        assert_eq!(sizes.swapchain, PhysicalSize::new(4096, 1));
        assert_eq!(sizes.render, PhysicalSize::new(4096, 1));
        let odd_ratio = SurfaceSizes::for_window(PhysicalSize::new(800, 600), f64::NAN, 2.0, 0.5, MAX);
        assert_eq!(odd_ratio.render, PhysicalSize::new(400, 300));
    }

    #[test]
    fn errors_render_their_diagnostic() {
        let err = SurfaceError::Compile {
            stage: ShaderStage::Fragment,
            diagnostic: "0:3: 'undefined_value' : undeclared identifier".into(),
        };
        let message = err.to_string();
        assert!(message.starts_with("fragment shader failed to compile"));
        assert!(message.contains("undeclared identifier"));
        assert!(SurfaceError::Link {
            diagnostic: "bad".into()
        }
        .to_string()
        .contains("link"));
    }
}
