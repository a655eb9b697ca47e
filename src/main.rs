// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use divergence_meter::config::{CadencePolicy, Config, LuckyNumber, CONFIG};
use divergence_meter::display::{ConsoleSurface, DisplaySurface, HeadlessSurface};
use divergence_meter::session::Session;
use divergence_meter::source::value::ValueMode;
use log::{info, warn};
use std::path::PathBuf;

/// Nixie-tube clock and divergence meter for the terminal
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file (defaults to $DIVERGENCE_CONFIG, then built-ins)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding 0.png .. 9.png and ..png
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Where snapshots taken with 's' are written
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Render to an in-memory surface instead of the terminal
    #[arg(long)]
    headless: bool,

    /// Stop a headless run after this many frames
    #[arg(long, requires = "headless")]
    frames: Option<usize>,

    /// Compose frames on a background thread ('m' toggles clock/meter)
    #[arg(long)]
    threaded: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Local time as HH.MM.SS, once a second
    Clock,
    /// Random seven-digit readouts with a hesitating cadence
    Meter {
        #[arg(long, value_enum)]
        cadence: Option<CadenceArg>,

        /// Occasionally show 1.048596 instead of a random readout
        #[arg(long)]
        lucky: bool,

        /// Seed for readouts and cadence
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the given values in order, then exit
    Demo {
        /// Milliseconds between values
        #[arg(long, default_value_t = 1000)]
        interval: u64,

        #[arg(required = true)]
        values: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CadenceArg {
    Random,
    Fixed,
}

impl From<CadenceArg> for CadencePolicy {
    fn from(arg: CadenceArg) -> Self {
        match arg {
            CadenceArg::Random => CadencePolicy::Random,
            CadenceArg::Fixed => CadencePolicy::Fixed,
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CONFIG.clone(),
    };
    if let Some(dir) = &args.assets {
        config.appearance.glyph_dir = dir.clone();
    }
    if let Some(dir) = &args.save_dir {
        config.appearance.save_dir = dir.clone();
    }
    if let Command::Meter {
        cadence,
        lucky,
        seed,
    } = &args.command
    {
        if let Some(cadence) = cadence {
            config.meter.cadence = (*cadence).into();
        }
        if *lucky && config.meter.lucky_number.is_none() {
            config.meter.lucky_number = Some(LuckyNumber::default());
        }
        if seed.is_some() {
            config.meter.random_seed = *seed;
        }
    }
    Ok(config)
}

/// Main entry point for the `divergence-meter` application.
fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the console surface.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = Args::parse();
    info!("Starting divergence-meter...");

    let config = load_config(&args)?;
    let session = Session::new(config).context("Failed to load glyph assets")?;

    let mut surface: Box<dyn DisplaySurface> = if args.headless {
        let mut headless = HeadlessSurface::new().realtime(true).discard_history();
        if let Some(frames) = args.frames {
            headless = headless.close_after(frames);
        }
        Box::new(headless)
    } else {
        Box::new(ConsoleSurface::new().context("Failed to initialize console surface")?)
    };

    let report = match &args.command {
        Command::Demo { interval, values } => {
            if args.threaded {
                warn!("--threaded has no effect on demo");
            }
            session.demo(values, *interval, &mut surface)
        }
        Command::Clock if args.threaded => session.run_threaded(ValueMode::Clock, &mut surface),
        Command::Meter { .. } if args.threaded => {
            session.run_threaded(ValueMode::Meter, &mut surface)
        }
        Command::Clock => session.clock(&mut surface),
        Command::Meter { .. } => session.meter(&mut surface),
    }
    .context("Display loop failed")?;

    info!(
        "divergence-meter exiting: {} frames presented, {} saved.",
        report.frames_presented, report.frames_saved
    );
    Ok(())
}
