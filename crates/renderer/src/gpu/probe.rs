//! One-shot capability probe choosing between the full and lite programs.
//!
//! Slow shader compilers (Direct3D through ANGLE, software rasterizers) take
//! seconds on the SDF march, so they get the lite program instead.

use settings::ShaderPreference;

use crate::types::ShaderVariant;

/// Outcome of inspecting the adapter identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Full,
    Lite,
    /// The adapter did not identify itself.
    Unknown,
}

const SOFTWARE_MARKERS: [&str; 5] = ["llvmpipe", "swiftshader", "lavapipe", "softpipe", "warp"];

/// Classifies an adapter from its name/driver string.
pub fn probe_renderer(identifier: &str) -> ProbeResult {
    let lowered = identifier.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return ProbeResult::Unknown;
    }

    if lowered.contains("direct3d") || lowered.contains("d3d11") {
        return ProbeResult::Lite;
    }
    if contains_word(&lowered, "angle")
        && !lowered.contains("metal")
        && !lowered.contains("vulkan")
        && !lowered.contains("opengl")
    {
        return ProbeResult::Lite;
    }
    if SOFTWARE_MARKERS
        .iter()
        .any(|marker| contains_word(&lowered, marker))
    {
        return ProbeResult::Lite;
    }
    ProbeResult::Full
}

/// `marker` appears in `haystack` delimited by non-alphanumerics.
fn contains_word(haystack: &str, marker: &str) -> bool {
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == marker)
}

/// Probes a live adapter. CPU device types are always lite.
pub(crate) fn probe_adapter(info: &wgpu::AdapterInfo) -> ProbeResult {
    let identifier = format!("{} {} {}", info.name, info.driver, info.driver_info);
    classify(info.device_type, info.backend, &identifier)
}

fn classify(device_type: wgpu::DeviceType, backend: wgpu::Backend, identifier: &str) -> ProbeResult {
    if device_type == wgpu::DeviceType::Cpu {
        return ProbeResult::Lite;
    }
    match probe_renderer(identifier) {
        ProbeResult::Full if backend == wgpu::Backend::Dx12 => ProbeResult::Lite,
        other => other,
    }
}

/// Variant for an adapter the probe could not rule slow. Windows drivers
/// compile the SDF march slowly whatever the adapter reports, so Windows is
/// always lite.
pub fn platform_fallback() -> ShaderVariant {
    fallback_for(cfg!(target_os = "windows"))
}

fn fallback_for(windows: bool) -> ShaderVariant {
    if windows {
        ShaderVariant::Lite
    } else {
        ShaderVariant::Full
    }
}

/// Picks the program variant, honouring an explicit preference first.
pub fn resolve_variant(preference: ShaderPreference, probe: ProbeResult) -> ShaderVariant {
    resolve_on(preference, probe, cfg!(target_os = "windows"))
}

fn resolve_on(preference: ShaderPreference, probe: ProbeResult, windows: bool) -> ShaderVariant {
    match (preference, probe) {
        (ShaderPreference::Full, _) => ShaderVariant::Full,
        (ShaderPreference::Lite, _) => ShaderVariant::Lite,
        (ShaderPreference::Auto, ProbeResult::Lite) => ShaderVariant::Lite,
        (ShaderPreference::Auto, ProbeResult::Full | ProbeResult::Unknown) => fallback_for(windows),
    }
}
