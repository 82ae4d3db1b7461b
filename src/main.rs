use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use baccarat_advisor::cards::RankNotation;
use baccarat_advisor::parse::RoundFormat;
use baccarat_advisor::simulate::{SimulationParams, simulate};
use baccarat_advisor::web;
use baccarat_advisor::{Advisor, AdvisorConfig, Engine};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "baccarat-advisor",
    version,
    about = "Baccarat side and stake suggestions from shoe composition",
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML config file (defaults apply to anything it omits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed for estimator jitter (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Round input format
    #[arg(long)]
    format: Option<FormatArg>,

    /// How card ranks are written in card input
    #[arg(long)]
    notation: Option<NotationArg>,

    /// Disable ANSI colors in CLI output
    #[arg(long = "no-color", default_value_t = false)]
    no_color: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the JSON turn API
    Serve {
        /// Address to bind (HOST:PORT); overrides the config file
        #[arg(long)]
        addr: Option<String>,
    },
    /// Play dealt coups through the engine and report the outcome
    Simulate {
        #[arg(long, default_value_t = 10_000)]
        rounds: u32,
        #[arg(long, default_value_t = 5_000)]
        bankroll: u64,
        #[arg(long, default_value_t = 8)]
        decks: usize,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum FormatArg {
    Auto,
    Scores,
    Cards,
}

impl From<FormatArg> for RoundFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => RoundFormat::Auto,
            FormatArg::Scores => RoundFormat::Scores,
            FormatArg::Cards => RoundFormat::Cards,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum NotationArg {
    Symbols,
    Digits,
}

impl From<NotationArg> for RankNotation {
    fn from(arg: NotationArg) -> Self {
        match arg {
            NotationArg::Symbols => RankNotation::Symbols,
            NotationArg::Digits => RankNotation::Digits,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = color_eyre::install();
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Serve { addr }) => {
            let addr: SocketAddr = addr.unwrap_or_else(|| config.addr.clone()).parse()?;
            web::serve(addr, Engine::new(config.engine)).await?
        }
        Some(Commands::Simulate {
            rounds,
            bankroll,
            decks,
        }) => run_simulation(config, rounds, bankroll, decks)?,
        None => Advisor::new(config).run()?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<AdvisorConfig> {
    let mut config = match &cli.config {
        Some(path) => AdvisorConfig::load(path)?,
        None => AdvisorConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.engine.seed = Some(seed);
    }
    if let Some(format) = cli.format.clone() {
        config.engine.round_format = format.into();
    }
    if let Some(notation) = cli.notation.clone() {
        config.engine.rank_notation = notation.into();
    }
    config.no_color |= cli.no_color;
    Ok(config)
}

fn run_simulation(config: AdvisorConfig, rounds: u32, bankroll: u64, decks: usize) -> Result<()> {
    let mut rng = match config.engine.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let params = SimulationParams {
        rounds,
        bankroll,
        decks,
        ..SimulationParams::default()
    };
    let engine = Engine::new(config.engine);
    let report = simulate(&engine, &params, &mut rng)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
