use settings::{AntialiasSetting, Settings, ShaderPreference};

pub use scene::Variant as ShaderVariant;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl From<AntialiasSetting> for Antialiasing {
    fn from(setting: AntialiasSetting) -> Self {
        match setting {
            AntialiasSetting::Auto => Antialiasing::Auto,
            AntialiasSetting::Off => Antialiasing::Off,
            AntialiasSetting::Samples2 => Antialiasing::Samples(2),
            AntialiasSetting::Samples4 => Antialiasing::Samples(4),
            AntialiasSetting::Samples8 => Antialiasing::Samples(8),
            AntialiasSetting::Samples16 => Antialiasing::Samples(16),
        }
    }
}

/// Immutable configuration passed to the window host at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Initial logical window size.
    pub window_size: (u32, u32),
    pub title: String,
    /// Backing-store scale applied on top of the device pixel ratio.
    pub resolution_scale: f32,
    /// Upper bound on the device pixel ratio used for the backing store.
    pub max_device_pixel_ratio: f32,
    pub antialiasing: Antialiasing,
    pub shader: ShaderPreference,
    /// Emits per-second frame statistics.
    pub diagnostics: bool,
    /// Pointer smoothing rate (per second).
    pub pointer_smoothing: f32,
    pub visibility_threshold: f32,
    /// Pixels the viewport is grown by before testing visibility.
    pub visibility_margin: f32,
    /// Source for the selection state machine parameters.
    pub settings: Settings,
}

impl RendererConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            window_size: (settings.window.width, settings.window.height),
            title: settings.window.title.clone(),
            resolution_scale: settings.resolution_scale,
            max_device_pixel_ratio: settings.max_device_pixel_ratio,
            antialiasing: settings
                .antialias
                .map(Antialiasing::from)
                .unwrap_or_default(),
            shader: settings.shader,
            diagnostics: settings.diagnostics,
            pointer_smoothing: settings.pointer.smoothing,
            visibility_threshold: settings.visibility.threshold,
            visibility_margin: settings.visibility.margin,
            settings: settings.clone(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_settings() {
        let config = RendererConfig::default();
        assert_eq!(config.resolution_scale, 0.6);
        assert_eq!(config.max_device_pixel_ratio, 2.0);
        assert_eq!(config.antialiasing, Antialiasing::Auto);
        assert_eq!(config.shader, ShaderPreference::Auto);
        assert_eq!(config.visibility_threshold, 0.01);
        assert_eq!(config.visibility_margin, 100.0);
        assert_eq!(config.pointer_smoothing, 16.0);
        assert!(!config.diagnostics);
    }

    #[test]
    fn antialias_setting_maps_to_sample_counts() {
        assert_eq!(Antialiasing::from(AntialiasSetting::Off), Antialiasing::Off);
        assert_eq!(
            Antialiasing::from(AntialiasSetting::Samples8),
            Antialiasing::Samples(8)
        );
    }
}
