use std::path::Path;

use anyhow::{Context, Result};
use renderer::{RendererConfig, WindowRuntime};
use settings::Settings;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reads the config file (defaults when absent).
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = paths::config_file(explicit)?;
    let settings = if explicit.is_some() {
        Settings::from_path(&path)
    } else {
        Settings::load_or_default(&path)
    }
    .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::debug!(path = %path.display(), "resolved configuration");
    Ok(settings)
}

/// Layers command-line flags over file settings and re-validates.
pub fn apply_overrides(mut settings: Settings, args: &RunArgs) -> Result<Settings> {
    if let Some(scale) = args.resolution_scale {
        settings.resolution_scale = scale;
    }
    if let Some(shader) = args.shader {
        settings.shader = shader;
    }
    if let Some(antialias) = args.antialias {
        settings.antialias = Some(antialias);
    }
    if args.diagnostics {
        settings.diagnostics = true;
    }
    if let Some((width, height)) = args.size {
        settings.window.width = width;
        settings.window.height = height;
    }
    settings
        .validate()
        .context("invalid command-line overrides")?;
    Ok(settings)
}

pub fn run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let settings = apply_overrides(load_settings(config_path)?, &args)?;
    if let Some(index) = args.select {
        if index > settings.project_count {
            anyhow::bail!(
                "--select {index} is out of range (expected 0..={})",
                settings.project_count
            );
        }
    }

    tracing::info!(
        shader = ?settings.shader,
        resolution_scale = settings.resolution_scale,
        projects = settings.project_count,
        "starting folio background"
    );
    let runtime = WindowRuntime::spawn(RendererConfig::from_settings(&settings))
        .context("failed to start background window")?;
    match args.select {
        Some(0) => runtime.clear()?,
        Some(index) => runtime.select(index)?,
        None => {}
    }
    runtime.wait()
}
