//! gtp-rust: a Go Text Protocol engine and match runner.
//!
//! ## Usage
//!
//! - `gtp-rust` / `gtp-rust engine` - Serve GTP on stdin/stdout
//! - `gtp-rust match --engine "gnugo --mode gtp" --engine "pachi"` - Play
//!   every engine against every other, once with each color, and print wins
//!
//! Logs go to stderr and follow `RUST_LOG`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

use gtp_rust::arena::round_robin;
use gtp_rust::config::MatchConfig;
use gtp_rust::engine::{Engine, EngineConfig};
use gtp_rust::generator::{FixedGenerator, MoveGenerator, PassGenerator, RandomGenerator};

/// gtp-rust: Go Text Protocol engine and engine-vs-engine match runner
#[derive(Parser)]
#[command(name = "gtp-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GTP on stdin/stdout
    Engine(EngineArgs),
    /// Run a round-robin match between external GTP engines
    Match(MatchArgs),
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum GeneratorKind {
    /// Always answer Q16
    #[default]
    Fixed,
    /// Always pass
    Pass,
    /// Random empty point
    Random,
}

#[derive(Args, Default)]
struct EngineArgs {
    /// How `genmove` picks its answer
    #[arg(long, value_enum, default_value_t = GeneratorKind::Fixed)]
    generator: GeneratorKind,

    /// Seed for the random generator
    #[arg(long)]
    seed: Option<u64>,

    /// Name reported by the `name` command
    #[arg(long)]
    name: Option<String>,

    /// Initial board size
    #[arg(long)]
    boardsize: Option<usize>,

    /// Initial komi
    #[arg(long, allow_hyphen_values = true)]
    komi: Option<f32>,
}

#[derive(Args)]
struct MatchArgs {
    /// TOML file with engines and match settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine command line, e.g. "gnugo --mode gtp" (repeatable)
    #[arg(long = "engine", value_name = "COMMAND")]
    engines: Vec<String>,

    #[arg(long)]
    boardsize: Option<usize>,

    #[arg(long, allow_hyphen_values = true)]
    komi: Option<f32>,

    /// Main time in seconds
    #[arg(long)]
    main_time: Option<u32>,

    /// Byo-yomi period in seconds
    #[arg(long)]
    byo_yomi_time: Option<u32>,

    /// Stones per byo-yomi period
    #[arg(long)]
    byo_yomi_stones: Option<u32>,

    /// Stop a game after this many moves
    #[arg(long)]
    max_moves: Option<usize>,

    /// Seconds to wait for any single response
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Play the pairings concurrently
    #[arg(long)]
    parallel: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Match(_)) => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Some(Commands::Match(args)) => run_match(args),
        Some(Commands::Engine(args)) => run_engine(args),
        None => run_engine(EngineArgs::default()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_engine(args: EngineArgs) -> Result<()> {
    let generator: Box<dyn MoveGenerator> = match (args.generator, args.seed) {
        (GeneratorKind::Fixed, _) => Box::new(FixedGenerator),
        (GeneratorKind::Pass, _) => Box::new(PassGenerator),
        (GeneratorKind::Random, Some(seed)) => Box::new(RandomGenerator::with_seed(seed)),
        (GeneratorKind::Random, None) => Box::new(RandomGenerator::new()),
    };

    let mut config = EngineConfig::default();
    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(size) = args.boardsize {
        config.size = size;
    }
    if let Some(komi) = args.komi {
        config.komi = komi;
    }

    let mut engine = Engine::with_config(config, generator).with_tournament_commands();
    engine.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}

fn run_match(args: MatchArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    for line in &args.engines {
        config.push_engine_command(line)?;
    }
    if let Some(v) = args.boardsize {
        config.boardsize = v;
    }
    if let Some(v) = args.komi {
        config.komi = v;
    }
    if let Some(v) = args.main_time {
        config.main_time = v;
    }
    if let Some(v) = args.byo_yomi_time {
        config.byo_yomi_time = v;
    }
    if let Some(v) = args.byo_yomi_stones {
        config.byo_yomi_stones = v;
    }
    if let Some(v) = args.max_moves {
        config.max_moves = v;
    }
    if let Some(v) = args.timeout_secs {
        config.timeout_secs = v;
    }
    config.parallel |= args.parallel;
    config.validate()?;

    info!(engines = config.engines.len(), parallel = config.parallel, "starting round robin");
    let report = round_robin(&config.engines, &config.settings(), config.parallel);

    for abandoned in &report.abandoned {
        warn!(
            black = %config.engines[abandoned.black],
            white = %config.engines[abandoned.white],
            error = %abandoned.error,
            "game abandoned"
        );
    }
    for (label, wins) in &report.scores {
        println!("{label}: {wins}");
    }
    Ok(())
}
