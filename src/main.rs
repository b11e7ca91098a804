use anyhow::{Context as _, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use secretmap::{cli::Args, Processor, ProcessEnv, RunReport};

const LOG_ENV: &str = "SECRETMAP_LOG";

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(report) => {
            print_report(&args, &report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stderr only: stdout carries export_to_env output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<RunReport> {
    let opts = args.run_options();
    let env = ProcessEnv;
    let mut stdout = std::io::stdout().lock();

    Processor::new(&env)
        .run(&opts, &mut stdout)
        .with_context(|| format!("{} failed", opts.target))
}

fn print_report(args: &Args, report: &RunReport) {
    for d in report.diagnostics.iter() {
        tracing::warn!(kind = d.kind.as_str(), "{}", d.message);
    }

    if let Some(path) = &report.destination {
        eprintln!(
            "wrote {} of {} entries for {} to {} (mapping: {})",
            report.written,
            report.resolved,
            report.target,
            path.display(),
            args.mapping_file.display()
        );
    }
}
