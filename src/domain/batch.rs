//! Batch surface: run independent simulations over a list of
//! instruments and reduce their evaluations.
//!
//! Each instrument gets its own ledger and its own capital; nothing is
//! shared between runs, so the aggregate is a plain fold over the
//! per-instrument results.

use super::driver::{BacktestConfig, SimulationResult, run_simulation};
use super::error::LookbackError;
use super::strategy::StrategyParams;
use crate::ports::decision_port::DecisionPort;
use crate::ports::store_port::StorePort;

#[derive(Debug, Clone)]
pub struct AggregateStats {
    /// Instruments that actually ran (had data in the store).
    pub instruments: usize,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    /// Unweighted mean of the per-instrument total returns.
    pub avg_return_pct: f64,
    pub worst_drawdown_pct: f64,
    pub results: Vec<SimulationResult>,
}

/// Single-instrument convenience wrapper.
pub fn run_backtest(
    store: &dyn StorePort,
    decision: &dyn DecisionPort,
    instrument: &str,
    config: &BacktestConfig,
    params: &StrategyParams,
) -> Result<SimulationResult, LookbackError> {
    run_simulation(store, decision, instrument, config, params)
}

/// Run every instrument in order. Instruments with no stored prices are
/// skipped with a warning; the batch fails only when nothing ran.
pub fn run_multi_backtest(
    store: &dyn StorePort,
    decision: &dyn DecisionPort,
    instruments: &[String],
    config: &BacktestConfig,
    params: &StrategyParams,
) -> Result<AggregateStats, LookbackError> {
    let mut results = Vec::new();
    for instrument in instruments {
        if store.data_range(instrument)?.is_none() {
            eprintln!("warning: no stored data for {instrument}, skipping");
            continue;
        }
        results.push(run_simulation(store, decision, instrument, config, params)?);
    }

    if results.is_empty() {
        return Err(LookbackError::NoData {
            instrument: instruments.join(","),
        });
    }
    Ok(aggregate(results))
}

fn aggregate(results: Vec<SimulationResult>) -> AggregateStats {
    let instruments = results.len();
    let total_trades = results.iter().map(|r| r.evaluation.total_trades).sum();
    let wins: usize = results.iter().map(|r| r.evaluation.wins).sum();
    let losses: usize = results.iter().map(|r| r.evaluation.losses).sum();
    let decided = wins + losses;
    let win_rate_pct = if decided > 0 {
        wins as f64 / decided as f64 * 100.0
    } else {
        0.0
    };
    let avg_return_pct = results
        .iter()
        .map(|r| r.evaluation.total_return_pct)
        .sum::<f64>()
        / instruments as f64;
    let worst_drawdown_pct = results
        .iter()
        .map(|r| r.evaluation.max_drawdown_pct)
        .fold(0.0_f64, f64::max);

    AggregateStats {
        instruments,
        total_trades,
        wins,
        losses,
        win_rate_pct,
        avg_return_pct,
        worst_drawdown_pct,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store_adapter::MemoryStoreAdapter;
    use crate::domain::bar::PriceBar;
    use crate::ports::decision_port::{DecisionContext, Signal};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn bar(instrument: &str, day: u32, close: f64) -> PriceBar {
        PriceBar {
            instrument: instrument.into(),
            date: date(day),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    struct OpenOnFirstDay;

    impl DecisionPort for OpenOnFirstDay {
        fn decide(&self, _: &str, d: NaiveDate, _: &DecisionContext<'_>) -> Signal {
            if d == date(1) { Signal::Open } else { Signal::Hold }
        }
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            start_date: date(1),
            end_date: date(5),
            initial_capital: 10_000.0,
            lookback_days: 30,
        }
    }

    #[test]
    fn batch_aggregates_across_instruments() {
        // one rises into a win, one falls into a loss
        let store = MemoryStoreAdapter::new()
            .with_bars("600519", (1..=5).map(|d| bar("600519", d, 10.0 + d as f64)).collect())
            .with_bars("300719", (1..=5).map(|d| bar("300719", d, 10.0 - 0.1 * d as f64)).collect());

        let instruments = vec!["600519".to_string(), "300719".to_string()];
        let stats = run_multi_backtest(
            &store,
            &OpenOnFirstDay,
            &instruments,
            &config(),
            &StrategyParams::default(),
        )
        .unwrap();

        assert_eq!(stats.instruments, 2);
        assert_eq!(stats.results.len(), 2);
        assert!(stats.total_trades >= 2);
        assert!(stats.wins >= 1);
        assert!(stats.losses >= 1);
    }

    #[test]
    fn missing_instrument_is_skipped_not_fatal() {
        let store = MemoryStoreAdapter::new()
            .with_bars("600519", (1..=5).map(|d| bar("600519", d, 10.0)).collect());

        let instruments = vec!["600519".to_string(), "000000".to_string()];
        let stats = run_multi_backtest(
            &store,
            &OpenOnFirstDay,
            &instruments,
            &config(),
            &StrategyParams::default(),
        )
        .unwrap();

        assert_eq!(stats.instruments, 1);
        assert_eq!(stats.results[0].instrument, "600519");
    }

    #[test]
    fn all_instruments_missing_is_fatal() {
        let store = MemoryStoreAdapter::new();
        let instruments = vec!["600519".to_string(), "000000".to_string()];
        let err = run_multi_backtest(
            &store,
            &OpenOnFirstDay,
            &instruments,
            &config(),
            &StrategyParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LookbackError::NoData { .. }));
    }

    #[test]
    fn average_return_is_unweighted_mean() {
        let store = MemoryStoreAdapter::new()
            .with_bars("600519", (1..=5).map(|d| bar("600519", d, 10.0)).collect())
            .with_bars("300719", (1..=5).map(|d| bar("300719", d, 20.0)).collect());

        struct Hold;
        impl DecisionPort for Hold {
            fn decide(&self, _: &str, _: NaiveDate, _: &DecisionContext<'_>) -> Signal {
                Signal::Hold
            }
        }

        let instruments = vec!["600519".to_string(), "300719".to_string()];
        let stats = run_multi_backtest(
            &store,
            &Hold,
            &instruments,
            &config(),
            &StrategyParams::default(),
        )
        .unwrap();
        assert!((stats.avg_return_pct - 0.0).abs() < 1e-9);
        assert!((stats.worst_drawdown_pct - 0.0).abs() < 1e-9);
    }
}
