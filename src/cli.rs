//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::csv_store_adapter::CsvStoreAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::flow_signal_adapter::FlowSignalAdapter;
use crate::domain::batch::{run_backtest, run_multi_backtest};
use crate::domain::config_validation::{
    parse_instruments, strategy_params_from_config, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::driver::{BacktestConfig, SimulationResult};
use crate::domain::error::LookbackError;
use crate::domain::evaluator::Evaluation;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "lookback", about = "Temporal-window trading backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for one instrument
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the first configured instrument
        #[arg(long)]
        instrument: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every configured instrument and aggregate
    Batch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored data range for the configured instruments
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            instrument,
            output,
        } => run_backtest_command(&config, instrument.as_deref(), output.as_ref()),
        Command::Batch { config, output } => run_batch_command(&config, output.as_ref()),
        Command::Validate { config } => run_validate_command(&config),
        Command::Info { config, instrument } => run_info_command(&config, instrument.as_deref()),
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn load_and_validate(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, LookbackError> {
    let start_str = adapter
        .get_string("backtest", "start_date")
        .ok_or_else(|| LookbackError::ConfigMissing {
            section: "backtest".into(),
            key: "start_date".into(),
        })?;
    let end_str = adapter.get_string("backtest", "end_date").ok_or_else(|| {
        LookbackError::ConfigMissing {
            section: "backtest".into(),
            key: "end_date".into(),
        }
    })?;

    let start_date = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        LookbackError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;
    let end_date = NaiveDate::parse_from_str(&end_str, "%Y-%m-%d").map_err(|_| {
        LookbackError::ConfigInvalid {
            section: "backtest".into(),
            key: "end_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 10_000.0),
        lookback_days: adapter.get_int("backtest", "lookback_days", 30) as usize,
    })
}

fn configured_instruments(adapter: &dyn ConfigPort) -> Vec<String> {
    adapter
        .get_string("backtest", "instruments")
        .map(|raw| parse_instruments(&raw))
        .unwrap_or_default()
}

fn build_store(adapter: &dyn ConfigPort) -> CsvStoreAdapter {
    let data_dir = adapter
        .get_string("backtest", "data_dir")
        .unwrap_or_else(|| "data".to_string());
    CsvStoreAdapter::new(PathBuf::from(data_dir))
}

fn build_decision(adapter: &dyn ConfigPort) -> FlowSignalAdapter {
    FlowSignalAdapter::new(adapter.get_double("strategy", "max_recent_change_pct", 5.0))
}

fn run_backtest_command(
    config_path: &PathBuf,
    instrument_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let adapter = match load_and_validate(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let params = match strategy_params_from_config(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let instruments = configured_instruments(&adapter);
    let instrument = match instrument_override {
        Some(i) => i.to_string(),
        None => match instruments.first() {
            Some(i) => i.clone(),
            None => {
                eprintln!("error: no instruments configured");
                return ExitCode::from(2);
            }
        },
    };

    let store = build_store(&adapter);
    let decision = build_decision(&adapter);

    eprintln!(
        "Running backtest: {} from {} to {}",
        instrument, bt_config.start_date, bt_config.end_date
    );
    let result = match run_backtest(&store, &decision, &instrument, &bt_config, &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_evaluation(&result);
    write_report(&result, output_path)
}

fn run_batch_command(config_path: &PathBuf, output_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_and_validate(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let params = match strategy_params_from_config(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let instruments = configured_instruments(&adapter);
    if instruments.is_empty() {
        eprintln!("error: no instruments configured");
        return ExitCode::from(2);
    }

    let store = build_store(&adapter);
    let decision = build_decision(&adapter);

    eprintln!(
        "Running batch: {} instruments, {} to {}",
        instruments.len(),
        bt_config.start_date,
        bt_config.end_date
    );
    let stats = match run_multi_backtest(&store, &decision, &instruments, &bt_config, &params) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Aggregate Results ===");
    eprintln!("Instruments:      {}", stats.instruments);
    eprintln!("Total Trades:     {}", stats.total_trades);
    eprintln!("Win Rate:         {:.1}%", stats.win_rate_pct);
    eprintln!("Avg Return:       {:.2}%", stats.avg_return_pct);
    eprintln!("Worst Drawdown:   -{:.1}%", stats.worst_drawdown_pct);

    eprintln!("\n=== Per-Instrument Summary ===");
    for result in &stats.results {
        let ev = &result.evaluation;
        let sign = if ev.total_return_pct >= 0.0 { "+" } else { "" };
        eprintln!(
            "  {}:  {} trades, {:.1}% win rate, {}{:.2}%",
            result.instrument, ev.total_trades, ev.win_rate_pct, sign, ev.total_return_pct,
        );
    }

    if let Some(output) = output_path {
        let report = CsvReportAdapter::new(output.clone());
        for result in &stats.results {
            if let Err(e) = report.write_result(result) {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
        eprintln!("Reports written to {}", output.display());
    }
    ExitCode::SUCCESS
}

fn run_validate_command(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_and_validate(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    // surfaces tier/stop parse errors the section-level checks pass over
    if let Err(e) = strategy_params_from_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = build_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config OK");
    ExitCode::SUCCESS
}

fn run_info_command(config_path: &PathBuf, instrument_override: Option<&str>) -> ExitCode {
    let adapter = match load_and_validate(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let store = build_store(&adapter);

    let instruments = match instrument_override {
        Some(i) => vec![i.to_string()],
        None => configured_instruments(&adapter),
    };
    if instruments.is_empty() {
        eprintln!("error: no instruments configured");
        return ExitCode::from(2);
    }

    use crate::ports::store_port::StorePort;
    for instrument in &instruments {
        match store.data_range(instrument) {
            Ok(Some((first, last, count))) => {
                eprintln!("  {}:  {} bars, {} to {}", instrument, count, first, last);
            }
            Ok(None) => eprintln!("  {}:  no data", instrument),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }
    ExitCode::SUCCESS
}

fn print_evaluation(result: &SimulationResult) {
    let ev: &Evaluation = &result.evaluation;
    eprintln!("\n=== Results: {} ===", result.instrument);
    eprintln!("Initial Capital:  {:.2}", ev.initial_capital);
    eprintln!("Final Value:      {:.2}", ev.final_value);
    eprintln!("Total Return:     {:.2}%", ev.total_return_pct);
    eprintln!("Total Trades:     {}", ev.total_trades);
    eprintln!("Win Rate:         {:.1}%", ev.win_rate_pct);
    eprintln!("Profit Ratio:     {:.2}", ev.profit_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", ev.max_drawdown_pct);
    eprintln!("Trading Days:     {}", result.trading_days);
    if result.skipped_entries > 0 || result.skipped_exits > 0 {
        eprintln!(
            "Skipped:          {} entries, {} exits",
            result.skipped_entries, result.skipped_exits
        );
    }
}

fn write_report(result: &SimulationResult, output_path: Option<&PathBuf>) -> ExitCode {
    let Some(output) = output_path else {
        return ExitCode::SUCCESS;
    };
    let report = CsvReportAdapter::new(output.clone());
    if let Err(e) = report.write_result(result) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Reports written to {}", output.display());
    ExitCode::SUCCESS
}
