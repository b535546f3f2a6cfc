//! Terminal statistics computed from the trade log and daily marks.

use chrono::NaiveDate;

use super::ledger::{DailyMark, Ledger};
use super::position::TradeAction;
use super::time_machine::OutcomeScorer;
use crate::domain::error::LookbackError;

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    /// Number of CLOSE trades.
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// wins / (wins + losses), in percent. Zero-profit closes count as
    /// neither a win nor a loss.
    pub win_rate_pct: f64,
    /// avg_win / |avg_loss|; infinite when there are wins but no losses.
    pub profit_ratio: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_drawdown_pct: f64,
}

impl Evaluation {
    pub fn compute(ledger: &Ledger) -> Self {
        let initial_capital = ledger.initial_capital();
        let final_value = ledger
            .daily_marks()
            .last()
            .map(|m| m.total_value)
            .unwrap_or(initial_capital);

        let total_return_pct = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let mut total_trades = 0usize;
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_win = 0.0_f64;
        let mut total_loss = 0.0_f64;

        for trade in ledger.trades() {
            if trade.action != TradeAction::Close {
                continue;
            }
            total_trades += 1;
            let profit = trade.realized_profit.unwrap_or(0.0);
            if profit > 0.0 {
                wins += 1;
                total_win += profit;
            } else if profit < 0.0 {
                losses += 1;
                total_loss += profit.abs();
            }
            // profit == 0.0 counts as neither
        }

        let decided = wins + losses;
        let win_rate_pct = if decided > 0 {
            wins as f64 / decided as f64 * 100.0
        } else {
            0.0
        };

        let avg_win = if wins > 0 { total_win / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 {
            total_loss / losses as f64
        } else {
            0.0
        };
        let profit_ratio = if avg_loss > 0.0 {
            avg_win / avg_loss
        } else if avg_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let max_drawdown_pct = compute_drawdown_pct(ledger.daily_marks());

        Evaluation {
            initial_capital,
            final_value,
            total_return_pct,
            total_trades,
            wins,
            losses,
            win_rate_pct,
            profit_ratio,
            avg_win,
            avg_loss,
            max_drawdown_pct,
        }
    }
}

/// Maximum peak-to-trough decline over the mark series, in percent.
fn compute_drawdown_pct(marks: &[DailyMark]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for mark in marks {
        if mark.total_value > peak {
            peak = mark.total_value;
        } else if peak > 0.0 {
            let dd = (peak - mark.total_value) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// How an OPEN decision fared against the realized price `offset_days`
/// later. `None` when no forward bar exists to score against.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionScore {
    pub realized_change_pct: f64,
    pub correct: bool,
}

pub fn score_decision(
    scorer: &OutcomeScorer<'_>,
    instrument: &str,
    decided_on: NaiveDate,
    entry_close: f64,
    offset_days: u32,
) -> Result<Option<DecisionScore>, LookbackError> {
    let Some(forward) = scorer.verification_price(instrument, decided_on, offset_days)? else {
        return Ok(None);
    };
    let realized_change_pct = forward.change_pct_from(entry_close);
    Ok(Some(DecisionScore {
        realized_change_pct,
        correct: realized_change_pct > 0.0,
    }))
}
