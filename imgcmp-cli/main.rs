use clap::Parser;
use imgcmp_cli::{init_tracing, load_config, report_failure, run_session, OrbScorer, Result};
use imgcmp_core::init_thread_pool;
use std::path::PathBuf;
use std::process::ExitCode;

/// Compare images pairwise and list the ones that look alike
#[derive(Parser, Debug)]
#[command(name = "imgcmp", version, about)]
struct Cli {
    /// TOML file overriding detector and scoring parameters
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker threads for feature extraction (defaults to the CPU count)
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let threads = cli.threads.unwrap_or(config.detector.core.n_threads);
    if let Err(e) = init_thread_pool(threads) {
        tracing::warn!(threads, error = %e, "could not size the worker pool, using the default");
    }

    let scorer = OrbScorer::from_config(&config)?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_session(stdin.lock(), stdout.lock(), &scorer)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report_failure(&e, &mut std::io::stdout(), &mut std::io::stderr())),
    }
}
