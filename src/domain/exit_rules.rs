//! Exit-rule engine: a pure function of position state, current price,
//! and strategy parameters. Independent of any decision source.
//!
//! Evaluation order, first match wins per call:
//! 1. Stop-loss (always the full remaining position)
//! 2. Trailing to breakeven, when configured and armed
//! 3. Tiered take-profit, lowest unfired tier first, against the
//!    *peak* gain since entry — a target once reached stays harvested
//!    even if the price has pulled back by the time we evaluate.

use super::position::Position;
use super::strategy::StrategyParams;

pub const STOP_LOSS: &str = "STOP_LOSS";
pub const TRAIL_BREAKEVEN: &str = "TRAIL_BREAKEVEN";
pub const END_OF_BACKTEST: &str = "END_OF_BACKTEST";
pub const ENTRY_SIGNAL: &str = "ENTRY_SIGNAL";

pub fn take_profit_reason(threshold_pct: f64) -> String {
    format!("TAKE_PROFIT:{threshold_pct}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitKind {
    StopLoss,
    TrailBreakeven,
    /// Carries the tier index so the caller can record it as fired
    /// after the close succeeds.
    TakeProfit { tier_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitInstruction {
    pub kind: ExitKind,
    pub shares: i64,
    pub reason: String,
}

/// Evaluate exit rules for one open position at `current_price`.
pub fn evaluate_exit(
    position: &Position,
    current_price: f64,
    params: &StrategyParams,
) -> Option<ExitInstruction> {
    if position.gain_pct(current_price) <= params.stop_loss_pct {
        return Some(ExitInstruction {
            kind: ExitKind::StopLoss,
            shares: position.shares,
            reason: STOP_LOSS.to_string(),
        });
    }

    if let Some(trail_pct) = params.trail_to_breakeven_pct {
        if position.peak_gain_pct() >= trail_pct && current_price <= position.entry_price {
            return Some(ExitInstruction {
                kind: ExitKind::TrailBreakeven,
                shares: position.shares,
                reason: TRAIL_BREAKEVEN.to_string(),
            });
        }
    }

    let peak_gain = position.peak_gain_pct();
    for (tier_index, tier) in params.tiers.iter().enumerate() {
        if position.tier_fired(tier_index) || peak_gain < tier.threshold_pct {
            continue;
        }
        let shares = round_to_lot(
            (position.shares as f64 * tier.sell_fraction).floor() as i64,
            params.lot_size,
        );
        if shares < params.lot_size {
            // Nothing tradable at this fraction; leave the tier unfired
            // so a later evaluation may still use it.
            continue;
        }
        return Some(ExitInstruction {
            kind: ExitKind::TakeProfit { tier_index },
            shares,
            reason: take_profit_reason(tier.threshold_pct),
        });
    }

    None
}

fn round_to_lot(shares: i64, lot_size: i64) -> i64 {
    shares - shares % lot_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::Tier;
    use chrono::NaiveDate;

    fn position(shares: i64, entry: f64) -> Position {
        Position::new(
            "600519".into(),
            shares,
            entry,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        )
    }

    fn params() -> StrategyParams {
        StrategyParams {
            tiers: vec![
                Tier { threshold_pct: 10.0, sell_fraction: 0.5 },
                Tier { threshold_pct: 20.0, sell_fraction: 1.0 },
            ],
            stop_loss_pct: -5.0,
            trail_to_breakeven_pct: None,
            ..Default::default()
        }
    }

    #[test]
    fn no_exit_inside_bands() {
        let pos = position(500, 10.0);
        assert_eq!(evaluate_exit(&pos, 10.2, &params()), None);
    }

    #[test]
    fn stop_loss_closes_full_position() {
        let pos = position(500, 10.0);
        let instr = evaluate_exit(&pos, 9.4, &params()).unwrap();
        assert_eq!(instr.kind, ExitKind::StopLoss);
        assert_eq!(instr.shares, 500);
        assert_eq!(instr.reason, STOP_LOSS);
    }

    #[test]
    fn stop_loss_boundary_inclusive() {
        let pos = position(500, 10.0);
        // exactly -5%
        let instr = evaluate_exit(&pos, 9.5, &params()).unwrap();
        assert_eq!(instr.kind, ExitKind::StopLoss);
    }

    #[test]
    fn stop_loss_wins_over_take_profit() {
        // Peak reached 15% but price has now collapsed below the stop.
        let mut pos = position(500, 10.0);
        pos.mark(11.5);
        let instr = evaluate_exit(&pos, 9.4, &params()).unwrap();
        assert_eq!(instr.kind, ExitKind::StopLoss);
        assert_eq!(instr.shares, 500);
    }

    #[test]
    fn tier_triggers_on_peak_not_current() {
        let mut pos = position(500, 10.0);
        pos.mark(11.5);
        // current price back at entry: peak gain 15% still triggers tier 0
        let instr = evaluate_exit(&pos, 10.0, &params()).unwrap();
        assert_eq!(instr.kind, ExitKind::TakeProfit { tier_index: 0 });
        assert_eq!(instr.shares, 250);
        assert_eq!(instr.reason, "TAKE_PROFIT:10");
    }

    #[test]
    fn fired_tier_does_not_refire() {
        let mut pos = position(500, 10.0);
        pos.mark(11.5);
        pos.record_tier_fired(0);
        assert_eq!(evaluate_exit(&pos, 11.0, &params()), None);
    }

    #[test]
    fn second_tier_after_first_fired() {
        let mut pos = position(250, 10.0);
        pos.mark(12.5); // peak gain 25%
        pos.record_tier_fired(0);
        let instr = evaluate_exit(&pos, 12.0, &params()).unwrap();
        assert_eq!(instr.kind, ExitKind::TakeProfit { tier_index: 1 });
        assert_eq!(instr.shares, 250);
        assert_eq!(instr.reason, "TAKE_PROFIT:20");
    }

    #[test]
    fn lowest_unfired_tier_wins() {
        let mut pos = position(500, 10.0);
        pos.mark(13.0); // past both thresholds
        let instr = evaluate_exit(&pos, 12.5, &params()).unwrap();
        assert_eq!(instr.kind, ExitKind::TakeProfit { tier_index: 0 });
    }

    #[test]
    fn fraction_rounds_down_to_lot() {
        let mut p = params();
        p.lot_size = 100;
        let mut pos = position(500, 10.0);
        pos.mark(11.5);
        // floor(500 * 0.5) = 250 -> rounded down to 200 with lot 100
        let instr = evaluate_exit(&pos, 11.0, &p).unwrap();
        assert_eq!(instr.shares, 200);
    }

    #[test]
    fn zero_lot_rounding_leaves_tier_unfired() {
        let mut p = params();
        p.lot_size = 100;
        let mut pos = position(150, 10.0);
        pos.mark(11.5);
        // floor(150 * 0.5) = 75 < one lot: tier 0 yields nothing, tier 1
        // is below threshold, so no instruction at all
        assert_eq!(evaluate_exit(&pos, 11.0, &p), None);
        assert!(!pos.tier_fired(0));
    }

    #[test]
    fn zero_lot_tier_skipped_in_favor_of_larger_tier() {
        let p = StrategyParams {
            tiers: vec![
                Tier { threshold_pct: 10.0, sell_fraction: 0.1 },
                Tier { threshold_pct: 20.0, sell_fraction: 1.0 },
            ],
            stop_loss_pct: -5.0,
            lot_size: 100,
            ..Default::default()
        };
        let mut pos = position(500, 10.0);
        pos.mark(12.5); // past both thresholds
        // tier 0 would sell floor(500*0.1)=50 < lot; tier 1 sells all
        let instr = evaluate_exit(&pos, 12.0, &p).unwrap();
        assert_eq!(instr.kind, ExitKind::TakeProfit { tier_index: 1 });
        assert_eq!(instr.shares, 500);
    }

    #[test]
    fn trail_to_breakeven_fires_after_arming() {
        let mut p = params();
        p.trail_to_breakeven_pct = Some(8.0);
        let mut pos = position(500, 10.0);
        pos.mark(10.9); // armed at +9% peak
        let instr = evaluate_exit(&pos, 10.0, &p).unwrap();
        assert_eq!(instr.kind, ExitKind::TrailBreakeven);
        assert_eq!(instr.shares, 500);
        assert_eq!(instr.reason, TRAIL_BREAKEVEN);
    }

    #[test]
    fn trail_not_armed_below_threshold() {
        let mut p = params();
        p.trail_to_breakeven_pct = Some(8.0);
        let mut pos = position(500, 10.0);
        pos.mark(10.5); // +5% peak, not armed
        assert_eq!(evaluate_exit(&pos, 10.0, &p), None);
    }

    #[test]
    fn trail_armed_but_price_above_entry_holds() {
        let mut p = params();
        p.trail_to_breakeven_pct = Some(8.0);
        let mut pos = position(500, 10.0);
        pos.mark(10.9);
        assert_eq!(evaluate_exit(&pos, 10.4, &p), None);
    }

    #[test]
    fn take_profit_reason_formats_threshold() {
        assert_eq!(take_profit_reason(10.0), "TAKE_PROFIT:10");
        assert_eq!(take_profit_reason(7.5), "TAKE_PROFIT:7.5");
    }
}
