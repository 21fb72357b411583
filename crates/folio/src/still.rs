use std::fs;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use image::RgbImage;
use scene::SceneInputs;
use selection::SelectionState;
use settings::Settings;

use crate::cli::{StillArgs, MAX_DIMENSION};

/// Frame inputs for a still: selection replayed from `selected_at` to `time`.
pub fn still_inputs(settings: &Settings, args: &StillArgs) -> Result<SceneInputs> {
    let (width, height) = args.size;
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        bail!("still size {width}x{height} is outside 1x1..={MAX_DIMENSION}x{MAX_DIMENSION}");
    }
    let mut selection = SelectionState::from_settings(settings);
    if args.select > 0 {
        selection
            .select(args.select, args.selected_at)
            .map_err(|err| anyhow!(err))?;
    }
    let state = selection.evaluate(args.time.max(args.selected_at));

    let mut inputs = SceneInputs::new(Vec2::new(width as f32, height as f32), args.time)
        .with_selection(state);
    if let Some((x, y)) = args.pointer {
        inputs = inputs.with_pointer(x, y);
    }
    Ok(inputs)
}

pub fn export(settings: &Settings, args: &StillArgs) -> Result<()> {
    let inputs = still_inputs(settings, args)?;
    let (width, height) = args.size;

    let started = Instant::now();
    let pixels = scene::render(width, height, &inputs, args.variant);
    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow!("rendered buffer does not match {width}x{height}"))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(
        path = %args.out.display(),
        width,
        height,
        variant = %args.variant,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "still frame written"
    );
    Ok(())
}
