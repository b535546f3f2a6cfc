//! Open-position state and the append-only trade record.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// An open holding in a single instrument.
///
/// `peak_price` is monotonically non-decreasing for the lifetime of the
/// position: [`Position::mark`] only ever raises it. Fired take-profit
/// tiers are tracked here so a tier can trigger at most once per
/// position lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub instrument: String,
    pub shares: i64,
    pub entry_price: f64,
    pub peak_price: f64,
    pub opened_on: NaiveDate,
    fired_tiers: BTreeSet<usize>,
}

impl Position {
    /// Invariant: `shares >= 1` and `entry_price > 0`. A position with
    /// zero shares is closed and must not exist.
    pub fn new(instrument: String, shares: i64, entry_price: f64, opened_on: NaiveDate) -> Self {
        assert!(shares >= 1, "position must hold at least one share");
        assert!(entry_price > 0.0, "entry price must be positive");
        Position {
            instrument,
            shares,
            entry_price,
            peak_price: entry_price,
            opened_on,
            fired_tiers: BTreeSet::new(),
        }
    }

    /// Mark to a new price. Raises the peak, never lowers it.
    pub fn mark(&mut self, price: f64) {
        if price > self.peak_price {
            self.peak_price = price;
        }
    }

    /// Unrealized gain at `price` relative to entry, in percent.
    pub fn gain_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Highest gain seen since entry, in percent.
    pub fn peak_gain_pct(&self) -> f64 {
        self.gain_pct(self.peak_price)
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn tier_fired(&self, tier_index: usize) -> bool {
        self.fired_tiers.contains(&tier_index)
    }

    pub fn record_tier_fired(&mut self, tier_index: usize) {
        self.fired_tiers.insert(tier_index);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Open,
    Close,
}

/// One immutable entry in the trade log, created exactly once per open
/// or close. The log is append-only and is the sole input (together
/// with the daily marks) to evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub instrument: String,
    pub action: TradeAction,
    pub price: f64,
    pub shares: i64,
    /// Signed cash movement: negative for opens, positive for closes.
    pub cash_delta: f64,
    /// `(price - entry_price) * shares`; present only on closes.
    pub realized_profit: Option<f64>,
    /// Tag identifying which rule fired, e.g. `STOP_LOSS` or `TAKE_PROFIT:10`.
    pub reason: String,
}
