mod cli;
mod paths;
mod run;
mod still;

use anyhow::Result;
use cli::{Command, ProbeArgs, StillArgs};
use renderer::{probe_renderer, resolve_variant};
use settings::Settings;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let config = cli.config.as_deref();
    match cli.command {
        Some(Command::Run(args)) => run::run(config, args),
        Some(Command::Still(args)) => handle_still(run::load_settings(config)?, args),
        Some(Command::Probe(args)) => handle_probe(run::load_settings(config)?, args),
        None => run::run(config, cli::RunArgs::default()),
    }
}

fn handle_still(settings: Settings, args: StillArgs) -> Result<()> {
    still::export(&settings, &args)?;
    println!("{}", args.out.display());
    Ok(())
}

fn handle_probe(settings: Settings, args: ProbeArgs) -> Result<()> {
    let probe = probe_renderer(&args.renderer);
    let preference = args.shader.unwrap_or(settings.shader);
    let variant = resolve_variant(preference, probe);
    println!("probe:   {probe:?}");
    println!("shader:  {preference:?}");
    println!("variant: {variant}");
    Ok(())
}
