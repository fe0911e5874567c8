mod app;
mod settings;
mod worker;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cogex_core::Digit;
use cogex_experiment::{generate_sequence, SequenceStats};
use cogex_render::{load_font, FontArc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use winit::event_loop::EventLoop;

use app::App;
use settings::{Settings, FONT_VAR};
use worker::{ChannelKeys, ProxyDisplay, SessionJob, UserEvent};

/// Tried in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Parser, Debug)]
#[command(name = "cogex", version, about = "n-back and Stroop experiments")]
struct Cli {
    /// Debug-level logging unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TaskKind {
    Nback,
    Stroop,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full session in a window and save the results.
    Run {
        task: TaskKind,
        #[arg(long, value_parser = parse_participant)]
        participant: String,
        /// TOML file overriding the built-in task constants.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for reproducible stimulus sequences.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print a generated n-back digit sequence and its matches.
    Sequence {
        #[arg(long, default_value_t = 20)]
        length: usize,
        #[arg(long, default_value_t = 2)]
        lag: usize,
        #[arg(long, default_value_t = 0.6)]
        probability: f64,
        #[arg(long)]
        allow_consecutive: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_participant(raw: &str) -> Result<String, String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err("participant id must not be empty".into());
    }
    if !id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err("participant id may only contain letters, digits, '-' and '_'".into());
    }
    Ok(id.to_string())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_thread_names(true).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            task,
            participant,
            config,
            seed,
        } => run(task, participant, config.as_deref(), seed),
        Command::Sequence {
            length,
            lag,
            probability,
            allow_consecutive,
            seed,
        } => print_sequence(length, lag, probability, allow_consecutive, seed),
    }
}

fn resolve_font(configured: Option<&Path>) -> Result<FontArc> {
    if let Some(path) = configured {
        return load_font(path);
    }
    for candidate in SYSTEM_FONTS.iter().map(Path::new).filter(|p| p.exists()) {
        match load_font(candidate) {
            Ok(font) => {
                info!(font = %candidate.display(), "using system font");
                return Ok(font);
            }
            Err(err) => warn!("{err:#}"),
        }
    }
    bail!("no usable font found; set {FONT_VAR} or display.font in the config file")
}

fn run(
    task: TaskKind,
    participant: String,
    config: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    let settings = Settings::load(config)?;
    let font = resolve_font(settings.display.font.as_deref())?;
    info!(
        ?task,
        %participant,
        seed,
        output = %settings.experiment.output.dir.display(),
        "starting"
    );

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("creating event loop")?;
    let (tx, rx) = mpsc::channel();
    let session = worker::spawn(
        SessionJob {
            task,
            config: settings.experiment.clone(),
            participant,
            seed,
        },
        ChannelKeys::new(rx),
        ProxyDisplay::new(event_loop.create_proxy()),
    )?;

    let mut app = App::new(settings.display.clone(), Some(font), tx);
    let loop_result = event_loop.run_app(&mut app);
    let ui_error = app.take_error();
    // Releases the key sender so a still-running session sees closed input.
    drop(app);

    let saved = session
        .join()
        .map_err(|_| anyhow!("session thread panicked"))??;
    loop_result.context("event loop failed")?;
    if let Some(err) = ui_error {
        return Err(err);
    }

    match saved {
        Some(path) => info!(path = %path.display(), "results written"),
        None => info!("no results written"),
    }
    Ok(())
}

fn print_sequence(
    length: usize,
    lag: usize,
    probability: f64,
    allow_consecutive: bool,
    seed: Option<u64>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let sequence: Vec<Digit> =
        generate_sequence(length, probability, allow_consecutive, lag, &mut rng)
            .context("cannot generate sequence")?;
    let stats = SequenceStats::of(&sequence, lag);

    let digits: Vec<String> = sequence.iter().map(ToString::to_string).collect();
    println!("{}", digits.join(" "));
    println!(
        "{} of {} positions match {} back: {:?}",
        stats.matches(),
        length.saturating_sub(lag),
        lag,
        stats.match_positions
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_arguments_parse() {
        let cli = Cli::try_parse_from([
            "cogex", "run", "stroop", "--participant", "P07", "--seed", "3", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Run {
                task,
                participant,
                seed,
                config,
            } => {
                assert_eq!(task, TaskKind::Stroop);
                assert_eq!(participant, "P07");
                assert_eq!(seed, Some(3));
                assert_eq!(config, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn participant_ids_are_filename_safe() {
        assert_eq!(parse_participant(" s-01 "), Ok("s-01".to_string()));
        assert!(parse_participant("").is_err());
        assert!(parse_participant("../etc").is_err());
        assert!(Cli::try_parse_from(["cogex", "run", "nback", "--participant", "a/b"]).is_err());
    }

    #[test]
    fn sequence_defaults() {
        let cli = Cli::try_parse_from(["cogex", "sequence"]).unwrap();
        match cli.command {
            Command::Sequence {
                length,
                lag,
                probability,
                allow_consecutive,
                seed,
            } => {
                assert_eq!((length, lag), (20, 2));
                assert_eq!(probability, 0.6);
                assert!(!allow_consecutive);
                assert_eq!(seed, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sequence_command_rejects_bad_parameters() {
        assert!(print_sequence(2, 2, 0.5, false, Some(1)).is_err());
        assert!(print_sequence(10, 2, 0.5, false, Some(1)).is_ok());
    }
}
