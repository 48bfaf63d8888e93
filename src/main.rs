mod input;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::model::status::StatusDisplayPolicy;
use crate::model::targets::DEFAULT_GROWTH_PERCENT;
use crate::pipeline::PipelineOptions;
use crate::pipeline::coordinator::{Coordinator, GENERIC_FAILURE_MESSAGE};
use crate::report::{ReportMode, build_view, write_reports};

#[derive(Debug, Parser)]
#[command(
    name = "apptally",
    version,
    about = "Hierarchical status rollups and growth targets from application-register exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Aggregate one register export and write rollup reports.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Current-period export (TSV or CSV, optionally gzipped).
    #[arg(long)]
    current: PathBuf,

    /// Prior-period export; enables baseline growth targets.
    #[arg(long)]
    prior: Option<PathBuf>,

    /// Directory the reports are written to.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeArg::Both)]
    mode: ModeArg,

    /// Year-over-year growth assumption, in percent.
    #[arg(long, default_value_t = DEFAULT_GROWTH_PERCENT)]
    growth_percent: u32,

    /// Status value to hide from the displayed columns (repeatable).
    #[arg(long = "hide-status")]
    hide_status: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Text,
    Json,
    Both,
}

impl From<ModeArg> for ReportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Text => ReportMode::Text,
            ModeArg::Json => ReportMode::Json,
            ModeArg::Both => ReportMode::Both,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Command::Run(args) = cli.command;
    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: RunArgs) -> Result<(), String> {
    let options = PipelineOptions {
        growth_percent: args.growth_percent,
        ..PipelineOptions::default()
    };

    let coordinator = Arc::new(Coordinator::new(options));
    let (_, handle) = coordinator.submit(args.current.clone(), args.prior.clone());
    handle
        .join()
        .map_err(|_| GENERIC_FAILURE_MESSAGE.to_string())?;

    let state = coordinator.snapshot();
    if let Some(message) = state.error {
        return Err(message);
    }
    let Some(output) = state.output else {
        return Err(GENERIC_FAILURE_MESSAGE.to_string());
    };

    println!("{}", state.progress);

    let policy = StatusDisplayPolicy::hide(&args.hide_status);
    let view = build_view(&output, &policy);

    let written = write_reports(&view, &args.out, args.mode.into())
        .map_err(|e| format!("failed to write reports: {e}"))?;
    for path in &written {
        tracing::info!(path = %path.display(), "report written");
    }

    print!("{}", report::text::render_rollup_text(&view));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli =
            Cli::try_parse_from(["apptally", "run", "--current", "data/register.tsv"]).unwrap();
        let Command::Run(args) = cli.command;
        assert_eq!(args.current, PathBuf::from("data/register.tsv"));
        assert!(args.prior.is_none());
        assert_eq!(args.out, PathBuf::from("out"));
        assert_eq!(args.mode, ModeArg::Both);
        assert_eq!(args.growth_percent, DEFAULT_GROWTH_PERCENT);
        assert!(args.hide_status.is_empty());
    }

    #[test]
    fn test_cli_hide_status_repeats_and_mode() {
        let cli = Cli::try_parse_from([
            "apptally",
            "run",
            "--current",
            "cur.csv",
            "--prior",
            "prev.csv",
            "--mode",
            "json",
            "--growth-percent",
            "25",
            "--hide-status",
            "Draft",
            "--hide-status",
            "Cancelled",
        ])
        .unwrap();
        let Command::Run(args) = cli.command;
        assert_eq!(args.mode, ModeArg::Json);
        assert_eq!(args.growth_percent, 25);
        assert_eq!(args.hide_status, vec!["Draft", "Cancelled"]);
    }

    #[test]
    fn test_cli_requires_current() {
        assert!(Cli::try_parse_from(["apptally", "run"]).is_err());
    }
}
