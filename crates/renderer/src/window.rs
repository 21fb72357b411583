use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use scene::SceneInputs;
use selection::SelectionState;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::clock::FrameDriver;
use crate::compile::{fragment_source, VERTEX_SHADER_GLSL};
use crate::gpu::probe::resolve_variant;
use crate::gpu::UNIFORM_NAMES;
use crate::pointer::{PointerMapping, PointerSmoother};
use crate::surface::{FragmentChoice, RenderSurface, SurfaceSizes};
use crate::types::RendererConfig;
use crate::visibility::{Rect, VisibilityGate};

/// Texture limit assumed until the device reports its own.
const FALLBACK_MAX_DIMENSION: u32 = 8192;

/// Everything the event loop owns for the background window.
struct WindowState {
    window: Arc<Window>,
    /// `None` after a failed initialisation; the window then stays blank.
    surface: Option<RenderSurface>,
    driver: FrameDriver,
    pointer: PointerSmoother,
    mapping: PointerMapping,
    pointer_moved: bool,
    selection: SelectionState,
    gate: VisibilityGate,
    occluded: bool,
    minimised: bool,
    /// Frame-driver time of the most recent frame; selection events are
    /// stamped with it.
    clock_time: f32,
    config: RendererConfig,
}

impl WindowState {
    fn new(window: Arc<Window>, config: RendererConfig) -> Self {
        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f64> = window.inner_size().to_logical(scale_factor);
        let sizes = SurfaceSizes::for_window(
            window.inner_size(),
            scale_factor,
            f64::from(config.max_device_pixel_ratio),
            f64::from(config.resolution_scale),
            FALLBACK_MAX_DIMENSION,
        );

        let preference = config.shader;
        let surface = match RenderSurface::initialize(
            window.as_ref(),
            VERTEX_SHADER_GLSL,
            |profile| {
                let variant = resolve_variant(preference, profile.probe);
                info!(
                    adapter = %profile.name,
                    backend = ?profile.backend,
                    probe = ?profile.probe,
                    %variant,
                    "resolved shader variant"
                );
                FragmentChoice {
                    variant,
                    source: fragment_source(variant),
                }
            },
            &UNIFORM_NAMES,
            config.antialiasing,
            sizes,
        ) {
            Ok(surface) => Some(surface),
            Err(err) => {
                error!("background disabled: {err}");
                None
            }
        };

        let backing = surface.as_ref().map(RenderSurface::size).unwrap_or(sizes.render);
        let mapping = PointerMapping {
            surface: Some(Rect::new(0.0, 0.0, logical.width, logical.height)),
            backing,
            device_pixel_ratio: scale_factor,
            resolution_scale: f64::from(config.resolution_scale),
        };
        let pointer = PointerSmoother::new(mapping.centre(), config.pointer_smoothing);

        Self {
            driver: FrameDriver::new(Instant::now()).with_diagnostics(config.diagnostics),
            gate: VisibilityGate::new(config.visibility_threshold, config.visibility_margin),
            selection: SelectionState::from_settings(&config.settings),
            window,
            surface,
            pointer,
            mapping,
            pointer_moved: false,
            occluded: false,
            minimised: false,
            clock_time: 0.0,
            config,
        }
    }

    fn wants_frames(&self) -> bool {
        self.surface.is_some() && self.driver.is_running()
    }

    fn select(&mut self, index: u32) {
        match self.selection.select(index, self.clock_time) {
            Ok(()) => info!(index, "project selected"),
            Err(err) => warn!("ignoring selection: {err}"),
        }
        self.window.request_redraw();
    }

    fn clear(&mut self) {
        self.selection.clear(self.clock_time);
        info!("project selection cleared");
        self.window.request_redraw();
    }

    /// Stops the clock and releases the GPU surface.
    fn teardown(&mut self) {
        self.driver.stop();
        self.surface = None;
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => self.clear(),
            Key::Character(value) => match value.as_str().parse::<u32>() {
                Ok(0) => self.clear(),
                Ok(index) if index <= self.selection.project_count() => self.select(index),
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let logical = position.to_logical::<f64>(self.window.scale_factor());
        self.pointer
            .set_target(self.mapping.map(logical.x, logical.y));
        self.pointer_moved = true;
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.minimised = size.width == 0 || size.height == 0;
        self.apply_visibility();
        if self.minimised {
            return;
        }

        let scale_factor = self.window.scale_factor();
        let logical: LogicalSize<f64> = size.to_logical(scale_factor);
        let max_dimension = self
            .surface
            .as_ref()
            .map(RenderSurface::max_texture_dimension)
            .unwrap_or(FALLBACK_MAX_DIMENSION);
        let sizes = SurfaceSizes::for_window(
            size,
            scale_factor,
            f64::from(self.config.max_device_pixel_ratio),
            f64::from(self.config.resolution_scale),
            max_dimension,
        );
        let backing = match self.surface.as_mut() {
            Some(surface) => {
                surface.resize(sizes);
                surface.size()
            }
            None => sizes.render,
        };

        self.mapping.surface = Some(Rect::new(0.0, 0.0, logical.width, logical.height));
        self.mapping.backing = backing;
        self.mapping.device_pixel_ratio = scale_factor;
        if !self.pointer_moved {
            self.pointer.reset(self.mapping.centre());
        }
        self.observe_geometry();
    }

    /// Tests the window rectangle against its monitor.
    fn observe_geometry(&mut self) {
        let Some(monitor) = self.window.current_monitor() else {
            return;
        };
        let Ok(position) = self.window.inner_position() else {
            return;
        };
        let scale_factor = self.window.scale_factor();
        let size = self.window.inner_size();
        let to_rect = |x: i32, y: i32, width: u32, height: u32| {
            Rect::new(
                f64::from(x) / scale_factor,
                f64::from(y) / scale_factor,
                f64::from(width) / scale_factor,
                f64::from(height) / scale_factor,
            )
        };
        let surface = to_rect(position.x, position.y, size.width, size.height);
        let monitor_position = monitor.position();
        let monitor_size = monitor.size();
        let viewport = to_rect(
            monitor_position.x,
            monitor_position.y,
            monitor_size.width,
            monitor_size.height,
        );
        if let Some(visible) = self.gate.observe(&surface, &viewport) {
            self.on_visibility(visible);
        }
    }

    fn apply_visibility(&mut self) {
        if let Some(visible) = self.gate.force_hidden(self.occluded || self.minimised) {
            self.on_visibility(visible);
        }
    }

    fn on_visibility(&mut self, visible: bool) {
        let now = Instant::now();
        if visible {
            self.driver.resume(now);
            self.window.request_redraw();
        } else {
            self.driver.pause(now);
        }
    }

    /// Advances the clock and draws one frame. `Ok(false)` when no frame was
    /// due.
    fn render_frame(&mut self) -> Result<bool, wgpu::SurfaceError> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(false);
        };
        let Some(frame) = self.driver.tick(Instant::now()) else {
            return Ok(false);
        };
        self.clock_time = frame.time;

        self.pointer.update(frame.delta_time);
        let size = surface.size();
        let inputs = SceneInputs {
            resolution: glam::Vec2::new(size.width as f32, size.height as f32),
            time: frame.time,
            pointer: self.pointer.as_uniform(),
            selection: self.selection.evaluate(frame.time),
        };
        surface.update(&inputs);
        surface.draw()?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
enum WindowCommand {
    Select(u32),
    Clear,
    Shutdown,
}

/// Handle to the window thread running the background.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("folio-window".into())
            .spawn(move || run_window_thread(config, ready_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            join_handle: Some(handle),
        })
    }

    /// Focuses project `index` (`1..=project_count`).
    pub fn select(&self, index: u32) -> Result<()> {
        self.proxy
            .send_event(WindowCommand::Select(index))
            .map_err(|err| anyhow!(err))
    }

    pub fn clear(&self) -> Result<()> {
        self.proxy
            .send_event(WindowCommand::Clear)
            .map_err(|err| anyhow!(err))
    }

    /// Blocks until the window is closed.
    pub fn wait(mut self) -> Result<()> {
        match self.join_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))?,
            None => Ok(()),
        }
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let message = format!("failed to create event loop: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let proxy = event_loop.create_proxy();

    let (width, height) = config.window_size;
    let window = match WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let message = format!("failed to create background window: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };

    let mut state = WindowState::new(window, config);
    if let Some(surface) = state.surface.as_ref() {
        info!(
            variant = %surface.variant(),
            adapter = %surface.adapter_profile().name,
            "background ready"
        );
    }
    state.observe_geometry();
    state.window.request_redraw();

    let _ = ready_tx.send(Ok(proxy));

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(command) => match command {
            WindowCommand::Select(index) => state.select(index),
            WindowCommand::Clear => state.clear(),
            WindowCommand::Shutdown => exit(&mut state, elwt),
        },
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => exit(&mut state, elwt),
                WindowEvent::KeyboardInput { event, .. } => state.handle_key(&event),
                WindowEvent::CursorMoved { position, .. } => state.handle_cursor_moved(position),
                WindowEvent::Resized(new_size) => state.handle_resize(new_size),
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = state.window.inner_size();
                    state.handle_resize(size);
                }
                WindowEvent::Moved(_) => state.observe_geometry(),
                WindowEvent::Occluded(occluded) => {
                    state.occluded = occluded;
                    state.apply_visibility();
                }
                WindowEvent::RedrawRequested => match state.render_frame() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(surface) = state.surface.as_ref() {
                            surface.reconfigure();
                        }
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; closing background");
                        exit(&mut state, elwt);
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("surface timeout; retrying next frame");
                    }
                    Err(other) => {
                        warn!("surface error: {other:?}; retrying next frame");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            if state.wants_frames() {
                state.window.request_redraw();
            }
            elwt.set_control_flow(ControlFlow::Wait);
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn exit(state: &mut WindowState, elwt: &EventLoopWindowTarget<WindowCommand>) {
    state.teardown();
    elwt.exit();
}
