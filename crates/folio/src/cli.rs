use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scene::Variant;
use settings::{parse_antialias, AntialiasSetting, ShaderPreference};

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    author,
    version,
    about = "Animated procedural background",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file (defaults to `$XDG_CONFIG_HOME/folio/config.toml`).
    #[arg(long, global = true, value_name = "FILE", env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the background window (default).
    Run(RunArgs),
    /// Render one frame on the CPU and write it as a PNG.
    Still(StillArgs),
    /// Report which shader variant a renderer string resolves to.
    Probe(ProbeArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Fraction of the device-pixel backing store to render (0-2].
    #[arg(long, value_name = "SCALE")]
    pub resolution_scale: Option<f32>,

    /// Fragment program: `auto`, `full`, or `lite`.
    #[arg(long, value_name = "MODE", value_parser = parse_shader_preference)]
    pub shader: Option<ShaderPreference>,

    /// Anti-aliasing policy: `auto`, `off`, or an MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Log rolling FPS and frame-time summaries once per second.
    #[arg(long)]
    pub diagnostics: bool,

    /// Initial window size (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub size: Option<(u32, u32)>,

    /// Project to focus once the window is up.
    #[arg(long, value_name = "INDEX")]
    pub select: Option<u32>,
}

#[derive(Args, Debug)]
pub struct StillArgs {
    /// Scene time in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f32,

    /// Project to focus (`0` for none).
    #[arg(long, value_name = "INDEX", default_value_t = 0)]
    pub select: u32,

    /// Scene time at which the project was selected.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub selected_at: f32,

    /// Output size in pixels, at most 8192 on either edge.
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_dimensions,
        default_value = "960x540"
    )]
    pub size: (u32, u32),

    /// Pointer position in output pixels, bottom-left origin (e.g. `480,270`).
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    pub pointer: Option<(f32, f32)>,

    /// Scene variant: `full` or `lite`.
    #[arg(long, value_name = "VARIANT", value_parser = parse_variant, default_value = "full")]
    pub variant: Variant,

    /// PNG path to write.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Adapter name or driver string (e.g. `llvmpipe (LLVM 17.0.6, 256 bits)`).
    #[arg(value_name = "RENDERER", default_value = "")]
    pub renderer: String,

    /// Preference applied on top of the probe.
    #[arg(long, value_name = "MODE", value_parser = parse_shader_preference)]
    pub shader: Option<ShaderPreference>,
}

/// Largest accepted window or still edge, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_shader_preference(value: &str) -> Result<ShaderPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(ShaderPreference::Auto),
        "full" => Ok(ShaderPreference::Full),
        "lite" => Ok(ShaderPreference::Lite),
        other => Err(format!(
            "unknown shader mode '{other}'; expected auto, full, or lite"
        )),
    }
}

pub fn parse_variant(value: &str) -> Result<Variant, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "full" => Ok(Variant::Full),
        "lite" => Ok(Variant::Lite),
        other => Err(format!("unknown variant '{other}'; expected full or lite")),
    }
}

pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height".to_string())?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(format!(
            "dimensions must be at most {MAX_DIMENSION}x{MAX_DIMENSION}"
        ));
    }
    Ok((width, height))
}

pub fn parse_point(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| "expected X,Y".to_string())?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|_| "invalid x coordinate".to_string())?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|_| "invalid y coordinate".to_string())?;
    if !x.is_finite() || !y.is_finite() {
        return Err("pointer coordinates must be finite".into());
    }
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimensions() {
        assert_eq!(parse_dimensions("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_dimensions(" 64X32 ").unwrap(), (64, 32));
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("1920").is_err());
    }

    #[test]
    fn dimensions_are_capped() {
        assert_eq!(parse_dimensions("8192x8192").unwrap(), (8192, 8192));
        assert!(parse_dimensions("8193x10").is_err());
        assert!(parse_dimensions("10x4294967295").is_err());
        assert!(Cli::try_parse_from([
            "folio", "still", "--size", "100000x100000", "--out", "frame.png",
        ])
        .is_err());
    }

    #[test]
    fn parses_modes() {
        assert_eq!(parse_shader_preference("LITE").unwrap(), ShaderPreference::Lite);
        assert!(parse_shader_preference("fast").is_err());
        assert_eq!(parse_variant("full").unwrap(), Variant::Full);
        assert_eq!(parse_point("10, 20.5").unwrap(), (10.0, 20.5));
        assert!(parse_point("10").is_err());
    }

    #[test]
    fn bare_invocation_runs_with_defaults() {
        let cli = Cli::try_parse_from(["folio"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn still_arguments() {
        let cli = Cli::try_parse_from([
            "folio", "still", "--time", "2.5", "--select", "3", "--size", "64x36", "--variant",
            "lite", "--out", "frame.png",
        ])
        .unwrap();
        let Some(Command::Still(args)) = cli.command else {
            panic!("expected still command");
        };
        assert_eq!(args.time, 2.5);
        assert_eq!(args.select, 3);
        assert_eq!(args.size, (64, 36));
        assert_eq!(args.variant, Variant::Lite);
        assert_eq!(args.out, PathBuf::from("frame.png"));
    }

    #[test]
    fn run_overrides() {
        let cli = Cli::try_parse_from([
            "folio",
            "run",
            "--shader",
            "lite",
            "--antialias",
            "off",
            "--resolution-scale",
            "0.5",
            "--select",
            "2",
        ])
        .unwrap();
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.shader, Some(ShaderPreference::Lite));
        assert_eq!(args.antialias, Some(AntialiasSetting::Off));
        assert_eq!(args.resolution_scale, Some(0.5));
        assert_eq!(args.select, Some(2));
    }
}
