//! Casino Ledger command runner
//!
//! Reads operator commands line by line from stdin or a script file and prints
//! a reply for each. Charts of finished sessions are written to a directory.

use casino_ledger::{
    config::generate_sample_config,
    games::{RandomOracle, SideBetOracle},
    Casino, CommandHost, ConfigLoader, Report,
};
use clap::Parser;
use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "casino-ledger")]
#[command(about = "Blackjack table session ledger", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Directory for session charts
    #[arg(long, default_value = "./charts")]
    chart_dir: PathBuf,

    /// Seed side-bet trials for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Print session reports as JSON
    #[arg(long)]
    json: bool,

    /// Write a sample configuration to this path and exit
    #[arg(long)]
    init_config: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose { "casino_ledger=debug" } else { "casino_ledger=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    if let Some(path) = args.init_config.as_deref() {
        generate_sample_config(path)?;
        println!("📝 Sample configuration written to {}", path);
        return Ok(());
    }

    let loader = match args.config.as_ref() {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;

    let oracle = match args.seed {
        Some(seed) => RandomOracle::seeded(seed),
        None => RandomOracle::from_entropy(),
    };
    let mut host = CommandHost::new(Casino::new(config, oracle)?);

    info!("🎰 Casino ledger ready, type 'help' for commands");

    let input: Box<dyn BufRead> = match args.script.as_ref() {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    run(&mut host, input, &args)
}

fn run<O: SideBetOracle>(
    host: &mut CommandHost<O>,
    input: Box<dyn BufRead>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sessions = 0usize;

    for line in input.lines() {
        let Some(reply) = host.execute_line(&line?) else {
            continue;
        };

        match reply.report {
            Some(ref report) => {
                sessions += 1;
                if args.json {
                    println!("{}", report.to_json()?);
                } else {
                    println!("{}", reply.text);
                }
                save_chart(report, &args.chart_dir, sessions, host.casino().renderer().extension());
            }
            None if reply.is_error => eprintln!("{}", reply.text),
            None => println!("{}", reply.text),
        }
    }

    if host.casino().view().active {
        warn!("⚠️ Input ended with the session still active, no report generated");
    }
    Ok(())
}

/// Write the report's chart, if it has one. Failures are logged and skipped.
fn save_chart(report: &Report, dir: &Path, sequence: usize, extension: &str) {
    let Some(bytes) = report.chart.as_ref() else {
        return;
    };

    let name = match report.session_id {
        Some(id) => format!("session-{}.{}", id, extension),
        None => format!("session-{}.{}", sequence, extension),
    };
    let path = dir.join(name);

    match fs::create_dir_all(dir).and_then(|_| fs::write(&path, bytes)) {
        Ok(()) => info!("📈 Chart saved to {}", path.display()),
        Err(e) => warn!("⚠️ Could not save chart to {}: {}", path.display(), e),
    }
}
