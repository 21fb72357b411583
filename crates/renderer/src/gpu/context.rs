use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::TextureFormatFeatureFlags;
use winit::dpi::PhysicalSize;

use crate::surface::SurfaceError;
use crate::types::Antialiasing;

use super::probe::{probe_adapter, ProbeResult};

/// Identity of the adapter the context was created on.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub driver: String,
    pub probe: ProbeResult,
}

impl AdapterProfile {
    fn from_info(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            driver: format!("{} {}", info.driver, info.driver_info).trim().to_owned(),
            probe: probe_adapter(info),
        }
    }

    pub fn is_software(&self) -> bool {
        self.device_type == wgpu::DeviceType::Cpu
    }
}

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
    pub max_texture_dimension: u32,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self, SurfaceError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| unavailable(format!("failed to acquire window handle: {err}")))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| unavailable(format!("failed to acquire display handle: {err}")))?;

        // The caller keeps the window alive for as long as the context.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| unavailable(format!("failed to create rendering surface: {err}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| unavailable(format!("failed to find a suitable GPU adapter: {err}")))?;

        let adapter_profile = AdapterProfile::from_info(&adapter.get_info());
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            probe = ?adapter_profile.probe,
            "selected GPU adapter"
        );

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(unavailable("surface reports no supported formats".into()));
        };
        // Colours are written as-is, matching the CPU reference output.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    ?first_format,
                    "no non-sRGB surface format available; falling back to {:?}",
                    first_format
                );
                first_format
            });

        let format_features = adapter.get_texture_format_features(surface_format);
        let mut supported_samples = format_features.flags.supported_sample_counts();
        if !supported_samples.contains(&1) {
            supported_samples.push(1);
        }
        supported_samples.sort_unstable();
        supported_samples.dedup();

        let mut sample_count = select_sample_count(antialiasing, &supported_samples);
        if sample_count > 1
            && !format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
        {
            tracing::warn!(
                ?surface_format,
                "surface format does not support MSAA resolve; disabling MSAA"
            );
            sample_count = 1;
        }
        if adapter_profile.is_software() && sample_count > 1 {
            tracing::warn!(
                sample_count,
                "software rasterizer detected; disabling MSAA for performance"
            );
            sample_count = 1;
        }

        let mut required_features = wgpu::Features::empty();
        if sample_count > 4 {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("folio device"),
            required_features,
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| unavailable(format!("failed to create GPU device: {err}")))?;

        let max_texture_dimension = limits.max_texture_dimension_2d;
        let width = initial_size.width.clamp(1, max_texture_dimension);
        let height = initial_size.height.clamp(1, max_texture_dimension);

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| surface_caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(?present_mode, sample_count, width, height, "configured surface");

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            sample_count,
            surface_format,
            max_texture_dimension,
            adapter_profile,
        })
    }

    /// Reconfigures the swapchain. Returns `false` when the size is unchanged.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        if new_size.width == 0 || new_size.height == 0 {
            return false;
        }
        if new_size.width == self.config.width && new_size.height == self.config.height {
            return false;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Re-applies the current configuration after a lost or outdated surface.
    pub(crate) fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }
}

fn unavailable(reason: String) -> SurfaceError {
    SurfaceError::ContextUnavailable(reason)
}

fn select_sample_count(antialiasing: Antialiasing, supported: &[u32]) -> u32 {
    match antialiasing {
        Antialiasing::Auto => supported.last().copied().unwrap_or(1),
        Antialiasing::Off => 1,
        Antialiasing::Samples(requested) => {
            if supported.contains(&requested) {
                requested
            } else {
                let fallback = supported
                    .iter()
                    .copied()
                    .filter(|&count| count <= requested)
                    .max()
                    .unwrap_or_else(|| supported.first().copied().unwrap_or(1));
                tracing::warn!(
                    requested,
                    fallback,
                    ?supported,
                    "requested MSAA sample count not supported; falling back"
                );
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_picks_highest_supported_sample_count() {
        assert_eq!(select_sample_count(Antialiasing::Auto, &[1, 2, 4]), 4);
        assert_eq!(select_sample_count(Antialiasing::Auto, &[]), 1);
    }

    #[test]
    fn unsupported_request_falls_back_downwards() {
        assert_eq!(select_sample_count(Antialiasing::Samples(8), &[1, 4]), 4);
        assert_eq!(select_sample_count(Antialiasing::Samples(4), &[1, 4]), 4);
        assert_eq!(select_sample_count(Antialiasing::Off, &[1, 4]), 1);
    }
}
