//! Position ledger: single-writer authoritative account of cash,
//! holdings, the append-only trade log, and the daily mark series.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::position::{Position, Trade, TradeAction};

/// Recoverable policy rejections. The strategy asked for something the
/// ledger cannot grant right now; callers log and move on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient cash: need {required:.2}, have {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("no open position in {instrument}")]
    NoPosition { instrument: String },

    #[error("insufficient shares in {instrument}: requested {requested}, held {held}")]
    InsufficientShares {
        instrument: String,
        requested: i64,
        held: i64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMark {
    pub date: NaiveDate,
    pub total_value: f64,
}

/// Owned exclusively by one simulation run; all mutation flows through
/// the methods below so `cash >= 0` holds at all times.
#[derive(Debug, Clone)]
pub struct Ledger {
    cash: f64,
    initial_capital: f64,
    positions: HashMap<String, Position>,
    trades: Vec<Trade>,
    daily_marks: Vec<DailyMark>,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        assert!(initial_capital >= 0.0, "initial capital must be non-negative");
        Ledger {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            trades: Vec::new(),
            daily_marks: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn position(&self, instrument: &str) -> Option<&Position> {
        self.positions.get(instrument)
    }

    pub fn has_position(&self, instrument: &str) -> bool {
        self.positions.contains_key(instrument)
    }

    pub fn open_instruments(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn daily_marks(&self) -> &[DailyMark] {
        &self.daily_marks
    }

    /// Buy `shares` at `price`. Rejected (not clamped) if the cost
    /// exceeds available cash. An existing position is increased with a
    /// volume-weighted entry price.
    pub fn open(
        &mut self,
        date: NaiveDate,
        instrument: &str,
        price: f64,
        shares: i64,
        reason: &str,
    ) -> Result<(), LedgerError> {
        assert!(shares >= 1, "open requires at least one share");
        assert!(price > 0.0, "open requires a positive price");

        let cost = price * shares as f64;
        if cost > self.cash {
            return Err(LedgerError::InsufficientCash {
                required: cost,
                available: self.cash,
            });
        }

        self.cash -= cost;
        match self.positions.get_mut(instrument) {
            Some(pos) => {
                let total = pos.shares + shares;
                pos.entry_price =
                    (pos.entry_price * pos.shares as f64 + cost) / total as f64;
                pos.shares = total;
                pos.mark(price);
            }
            None => {
                self.positions.insert(
                    instrument.to_string(),
                    Position::new(instrument.to_string(), shares, price, date),
                );
            }
        }

        self.trades.push(Trade {
            date,
            instrument: instrument.to_string(),
            action: TradeAction::Open,
            price,
            shares,
            cash_delta: -cost,
            realized_profit: None,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Revalue an open position, raising its peak price. Quiet no-op
    /// when no position exists; generates no trade.
    pub fn mark_to_market(&mut self, instrument: &str, price: f64) {
        if let Some(pos) = self.positions.get_mut(instrument) {
            pos.mark(price);
        }
    }

    /// Sell `shares` at `price`. Returns the realized profit. The
    /// position is removed once its share count reaches zero.
    pub fn close(
        &mut self,
        date: NaiveDate,
        instrument: &str,
        price: f64,
        shares: i64,
        reason: &str,
    ) -> Result<f64, LedgerError> {
        assert!(shares >= 1, "close requires at least one share");

        let pos = self
            .positions
            .get_mut(instrument)
            .ok_or_else(|| LedgerError::NoPosition {
                instrument: instrument.to_string(),
            })?;
        if shares > pos.shares {
            return Err(LedgerError::InsufficientShares {
                instrument: instrument.to_string(),
                requested: shares,
                held: pos.shares,
            });
        }

        let proceeds = price * shares as f64;
        let realized = (price - pos.entry_price) * shares as f64;
        pos.shares -= shares;
        let fully_closed = pos.shares == 0;
        self.cash += proceeds;
        if fully_closed {
            self.positions.remove(instrument);
        }

        self.trades.push(Trade {
            date,
            instrument: instrument.to_string(),
            action: TradeAction::Close,
            price,
            shares,
            cash_delta: proceeds,
            realized_profit: Some(realized),
            reason: reason.to_string(),
        });
        Ok(realized)
    }

    /// Single-fire bookkeeping for the take-profit ladder. No-op when
    /// the position has already been fully closed by the same exit.
    pub fn record_tier_fired(&mut self, instrument: &str, tier_index: usize) {
        if let Some(pos) = self.positions.get_mut(instrument) {
            pos.record_tier_fired(tier_index);
        }
    }

    /// Value of all open positions under `price_lookup`; positions with
    /// no quoted price contribute nothing.
    pub fn position_value(&self, price_lookup: impl Fn(&str) -> Option<f64>) -> f64 {
        self.positions
            .values()
            .filter_map(|pos| price_lookup(&pos.instrument).map(|p| pos.market_value(p)))
            .sum()
    }

    pub fn total_value(&self, price_lookup: impl Fn(&str) -> Option<f64>) -> f64 {
        self.cash + self.position_value(price_lookup)
    }

    /// Append one `(date, total value)` point; called exactly once per
    /// simulated trading date, after all opens and closes for that date.
    pub fn record_daily_mark(
        &mut self,
        date: NaiveDate,
        price_lookup: impl Fn(&str) -> Option<f64>,
    ) {
        let total_value = self.total_value(price_lookup);
        self.daily_marks.push(DailyMark { date, total_value });
    }
}
