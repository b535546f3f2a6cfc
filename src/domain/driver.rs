//! Simulation driver: the date-stepping loop.
//!
//! Per simulated date the phases run in a fixed order — advance clock,
//! mark positions, evaluate exits, evaluate entries, record the daily
//! mark — then the run force-closes any remaining position and
//! evaluates. The loop is strictly sequential and owns its ledger;
//! reproducibility depends on that event order.

use chrono::NaiveDate;

use super::error::LookbackError;
use super::evaluator::Evaluation;
use super::exit_rules::{self, ExitKind, evaluate_exit};
use super::ledger::Ledger;
use super::strategy::StrategyParams;
use super::time_machine::TimeMachine;
use crate::ports::decision_port::{DecisionContext, DecisionPort, Signal};
use crate::ports::store_port::StorePort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Context window (entries) handed to the decision source.
    pub lookback_days: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub instrument: String,
    pub ledger: Ledger,
    pub evaluation: Evaluation,
    /// Entry signals that could not be filled (sizing below one lot or
    /// a ledger rejection). Reported for transparency, never fatal.
    pub skipped_entries: usize,
    pub skipped_exits: usize,
    /// Dates in range on which the instrument actually traded.
    pub trading_days: usize,
}

/// Run one independent simulation for `instrument` over the configured
/// date range.
pub fn run_simulation(
    store: &dyn StorePort,
    decision: &dyn DecisionPort,
    instrument: &str,
    config: &BacktestConfig,
    params: &StrategyParams,
) -> Result<SimulationResult, LookbackError> {
    params.validate()?;
    if config.end_date < config.start_date {
        return Err(LookbackError::InvalidDate {
            value: config.end_date.to_string(),
            reason: "end_date precedes start_date".to_string(),
        });
    }

    let mut ledger = Ledger::new(config.initial_capital);
    let mut time_machine = TimeMachine::new(store, config.start_date);
    let mut skipped_entries = 0usize;
    let mut skipped_exits = 0usize;
    let mut trading_days = 0usize;
    let mut last_traded: Option<(NaiveDate, f64)> = None;

    let mut date = config.start_date;
    loop {
        time_machine.set_clock(date);

        // Non-trading day: advance the clock, evaluate nothing.
        if let Some(bar) = time_machine.current_price(instrument)? {
            let price = bar.close;
            trading_days += 1;
            last_traded = Some((date, price));

            ledger.mark_to_market(instrument, price);

            if let Some(position) = ledger.position(instrument) {
                if let Some(instruction) = evaluate_exit(position, price, params) {
                    match ledger.close(date, instrument, price, instruction.shares, &instruction.reason)
                    {
                        Ok(_) => {
                            if let ExitKind::TakeProfit { tier_index } = instruction.kind {
                                ledger.record_tier_fired(instrument, tier_index);
                            }
                        }
                        Err(e) => {
                            eprintln!("warning: {date}: exit skipped for {instrument} ({e})");
                            skipped_exits += 1;
                        }
                    }
                }
            }

            if !ledger.has_position(instrument) {
                let bars = time_machine.price_series(instrument, config.lookback_days)?;
                let flows = time_machine.flow_series(instrument, config.lookback_days)?;
                let news = time_machine.news_series(instrument, config.lookback_days)?;
                let ctx = DecisionContext {
                    bars: &bars,
                    flows: &flows,
                    news: &news,
                };
                if decision.decide(instrument, date, &ctx) == Signal::Open {
                    let shares = size_entry(ledger.cash(), price, params);
                    if shares >= params.lot_size {
                        if let Err(e) =
                            ledger.open(date, instrument, price, shares, exit_rules::ENTRY_SIGNAL)
                        {
                            eprintln!("warning: {date}: entry skipped for {instrument} ({e})");
                            skipped_entries += 1;
                        }
                    } else {
                        eprintln!(
                            "warning: {date}: entry skipped for {instrument} (cash {:.2} below one lot at {price})",
                            ledger.cash()
                        );
                        skipped_entries += 1;
                    }
                }
            }

            ledger.record_daily_mark(date, |inst| (inst == instrument).then_some(price));
        }

        if date == config.end_date {
            break;
        }
        date = date.succ_opt().ok_or_else(|| LookbackError::InvalidDate {
            value: date.to_string(),
            reason: "date range exceeds the calendar".to_string(),
        })?;
    }

    // TERMINAL: liquidate at the last traded price so every trade has a
    // realized outcome.
    if let Some((final_date, final_price)) = last_traded {
        if let Some(position) = ledger.position(instrument) {
            let shares = position.shares;
            if let Err(e) = ledger.close(
                final_date,
                instrument,
                final_price,
                shares,
                exit_rules::END_OF_BACKTEST,
            ) {
                eprintln!("warning: {final_date}: final close skipped for {instrument} ({e})");
                skipped_exits += 1;
            }
        }
    }

    let evaluation = Evaluation::compute(&ledger);
    Ok(SimulationResult {
        instrument: instrument.to_string(),
        ledger,
        evaluation,
        skipped_entries,
        skipped_exits,
        trading_days,
    })
}

/// Commit `entry_fraction` of cash, rounded down to whole lots.
fn size_entry(cash: f64, price: f64, params: &StrategyParams) -> i64 {
    let budget = cash * params.entry_fraction;
    let shares = (budget / price).floor() as i64;
    shares - shares % params.lot_size
}
