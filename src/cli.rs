//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sample_source::sample_signals;
use crate::domain::config_validation::{build_risk_limits, validate_risk_config, RiskOverrides};
use crate::domain::error::RankfolioError;
use crate::domain::paper::{self, PaperResult};
use crate::domain::pipeline::{run_pipeline, PipelineRequest};
use crate::domain::risk::RiskLimits;
use crate::domain::signal::SignalSummary;
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;
use crate::ports::signal_port::SignalPort;

pub const DEFAULT_SIGNAL_PATH: &str = "data/generated_signals.csv";

#[derive(Parser, Debug)]
#[command(name = "rankfolio", about = "Risk-limited daily selection and paper simulation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Risk limit flags. Each one overrides the `[risk]` section of `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct RiskArgs {
    #[arg(long)]
    pub max_positions: Option<usize>,
    #[arg(long, allow_hyphen_values = true)]
    pub min_score: Option<f64>,
    #[arg(long)]
    pub max_weight_per_symbol: Option<f64>,
    #[arg(long)]
    pub max_daily_turnover: Option<f64>,
}

impl From<&RiskArgs> for RiskOverrides {
    fn from(args: &RiskArgs) -> Self {
        RiskOverrides {
            max_positions: args.max_positions,
            min_score: args.min_score,
            max_weight_per_symbol: args.max_weight_per_symbol,
            max_daily_turnover: args.max_daily_turnover,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the bundled sample signals to a file
    Sample {
        #[arg(short, long, default_value = DEFAULT_SIGNAL_PATH)]
        output: PathBuf,
    },
    /// Validate a signal file
    Validate {
        #[arg(short, long, default_value = DEFAULT_SIGNAL_PATH)]
        signals: PathBuf,
    },
    /// Run a paper simulation
    Paper {
        #[arg(short, long, default_value = DEFAULT_SIGNAL_PATH)]
        signals: PathBuf,
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        curve: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        risk: RiskArgs,
    },
    /// Generate, validate and optionally simulate in one run
    Pipeline {
        #[arg(short, long, default_value = DEFAULT_SIGNAL_PATH)]
        signals: PathBuf,
        #[arg(short, long)]
        prices: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        #[command(flatten)]
        risk: RiskArgs,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Sample { output } => run_sample(&output),
        Command::Validate { signals } => run_validate(&signals),
        Command::Paper {
            signals,
            prices,
            output,
            curve,
            config,
            risk,
        } => run_paper(
            &signals,
            &prices,
            output.as_deref(),
            curve.as_deref(),
            config.as_deref(),
            &risk,
        ),
        Command::Pipeline {
            signals,
            prices,
            output,
            config,
            timeout_secs,
            risk,
        } => run_pipeline_command(
            signals,
            prices,
            output,
            config.as_deref(),
            timeout_secs,
            &risk,
        ),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RankfolioError> {
    FileConfigAdapter::from_file(path).map_err(|e| RankfolioError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Resolve limits from an optional INI file plus command-line overrides.
pub fn resolve_risk_limits(
    config_path: Option<&Path>,
    risk: &RiskArgs,
) -> Result<RiskLimits, RankfolioError> {
    let config = match config_path {
        Some(path) => {
            eprintln!("Loading risk config from {}", path.display());
            load_config(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_risk_config(&config)?;
    build_risk_limits(&config, &RiskOverrides::from(risk))
}

fn print_limits(limits: &RiskLimits) {
    eprintln!(
        "Risk limits: max_positions={}, min_score={}, max_weight_per_symbol={}, max_daily_turnover={}",
        limits.max_positions(),
        limits.min_score(),
        limits.max_weight_per_symbol(),
        limits.max_daily_turnover(),
    );
}

fn print_result(result: &PaperResult) {
    eprintln!("\n=== Paper Results ===");
    eprintln!("Total Return:     {:.6}", result.total_return);
    eprintln!("CAGR:             {:.6}", result.cagr);
    eprintln!("Max Drawdown:     {:.6}", result.max_drawdown);
    eprintln!("Trades:           {}", result.trades);
    eprintln!("End Equity:       {:.6}", result.end_equity);
}

fn run_sample(output: &Path) -> Result<(), RankfolioError> {
    let rows = sample_signals()?;
    CsvAdapter::new().write_signals(output, &rows)?;
    eprintln!("Wrote {} sample rows to {}", rows.len(), output.display());
    Ok(())
}

fn run_validate(signals: &Path) -> Result<(), RankfolioError> {
    eprintln!("Validating signals: {}", signals.display());
    let rows = CsvAdapter::new().read_signals(signals)?;
    let summary = SignalSummary::from_rows(&rows);

    eprintln!("  rows:       {}", summary.rows);
    eprintln!("  dates:      {}", summary.dates);
    eprintln!("  symbols:    {}", summary.symbols);
    eprintln!("  duplicates: {}", summary.duplicates);

    if summary.duplicates > 0 {
        return Err(RankfolioError::DuplicateSignals {
            count: summary.duplicates,
        });
    }
    eprintln!("\nSignal file is valid.");
    Ok(())
}

pub fn run_paper(
    signals: &Path,
    prices: &Path,
    output: Option<&Path>,
    curve: Option<&Path>,
    config: Option<&Path>,
    risk: &RiskArgs,
) -> Result<(), RankfolioError> {
    let limits = resolve_risk_limits(config, risk)?;
    print_limits(&limits);

    let adapter = CsvAdapter::new();
    eprintln!("Loading signals from {}", signals.display());
    let rows = adapter.read_signals(signals)?;
    eprintln!("Loading prices from {}", prices.display());
    let table = adapter.read_prices(prices)?;

    eprintln!(
        "Running paper simulation: {} signal rows, {} priced symbols, {} trading days",
        rows.len(),
        table.symbols().len(),
        table.day_count()
    );
    let run = paper::simulate(&rows, &table, &limits)?;
    print_result(&run.result);

    // The curve goes first and is removed again if the metrics write fails.
    if let Some(path) = curve {
        adapter.save_curve(path, &run.steps)?;
    }
    if let Some(path) = output {
        if let Err(e) = adapter.save_result(path, &run.result) {
            if let Some(curve_path) = curve {
                let _ = std::fs::remove_file(curve_path);
            }
            return Err(e);
        }
        eprintln!("\nMetrics written to: {}", path.display());
    }
    if let Some(path) = curve {
        eprintln!("Equity curve written to: {}", path.display());
    }
    Ok(())
}

fn run_pipeline_command(
    signals: PathBuf,
    prices: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<&Path>,
    timeout_secs: u64,
    risk: &RiskArgs,
) -> Result<(), RankfolioError> {
    let limits = resolve_risk_limits(config, risk)?;
    let request = PipelineRequest {
        signal_path: signals,
        price_path: prices,
        metrics_path: output.clone(),
        limits,
        timeout: Duration::from_secs(timeout_secs),
    };

    let report = run_pipeline(CsvAdapter::new(), sample_signals, request)?;

    eprintln!(
        "Pipeline validated {} rows ({} dates, {} symbols)",
        report.summary.rows, report.summary.dates, report.summary.symbols
    );
    if let Some(result) = &report.result {
        print_result(result);
        if let Some(path) = &output {
            eprintln!("\nMetrics written to: {}", path.display());
        }
    }
    eprintln!("Pipeline done: {}", report.signal_path.display());
    Ok(())
}
