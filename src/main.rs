use anyhow::Result;
use clap::Parser;
use hostjoin::pipeline::{self, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "hostjoin")]
#[command(about = "Join domain rankings, topic directory pages and host scan results by hostname")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Ranking data: `rank,domain` lines (.gz/.bz2 accepted)
    #[arg(short = 'a', long, visible_alias = "alexa")]
    ranking: PathBuf,

    /// Topic directory RDF dump (.gz/.bz2 accepted)
    #[arg(short = 'd', long, visible_alias = "dmoz")]
    topics: PathBuf,

    /// Host scan results, one JSON object per line (.gz/.bz2 accepted)
    #[arg(short, long)]
    scan: PathBuf,

    /// Output file (stdout if omitted; compressed when ending in .gz/.bz2)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rewrite response headers and TLS state into a flat, schema-friendly shape
    #[arg(long)]
    flatten_responses: bool,
}

fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig {
        ranking: Some(cli.ranking),
        topics: Some(cli.topics),
        scan: Some(cli.scan),
        output: cli.output,
        flatten_responses: cli.flatten_responses,
    };

    let start = Instant::now();
    let stats = pipeline::run(&config)?;
    let duration = start.elapsed();

    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Total time:         {:.2}s", duration.as_secs_f64());
    eprintln!();
    eprintln!("Ranked domains:     {}", stats.ranked());
    eprintln!("Duplicate domains:  {}", stats.duplicates());
    eprintln!("Topic pages:        {}", stats.pages());
    eprintln!("Malformed pages:    {}", stats.malformed());
    eprintln!("Ineligible pages:   {}", stats.ineligible());
    eprintln!("Unranked pages:     {}", stats.unranked());
    eprintln!("Matched pages:      {}", stats.matches());
    eprintln!("Scan records:       {}", stats.scanned());
    eprintln!("Joined records:     {}", stats.joined());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // stdout carries the joined records, diagnostics go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
