use clap::{Parser, Subcommand};

use hero_edge_cli::commands::{
    run_build_matrix, run_championships, run_merge_matrix, run_simulate, BuildMatrixArgs,
    ChampionshipsArgs, MergeMatrixArgs, SimulateArgs,
};

#[derive(Parser)]
#[command(name = "hero-edge")]
#[command(about = "Hero matchup matrix builder and betting strategy backtester", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a matchup matrix from a match corpus
    BuildMatrix(BuildMatrixArgs),
    /// Fill gaps in one matrix from another
    MergeMatrix(MergeMatrixArgs),
    /// Run the strategy sweep over a corpus
    Simulate(SimulateArgs),
    /// List championships in a corpus by match count
    Championships(ChampionshipsArgs),
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::BuildMatrix(args) => run_build_matrix(&args)?,
        Commands::MergeMatrix(args) => run_merge_matrix(&args)?,
        Commands::Simulate(args) => run_simulate(args).await?,
        Commands::Championships(args) => run_championships(&args)?,
    }

    Ok(())
}
