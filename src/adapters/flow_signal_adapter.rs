//! Money-flow entry signal.
//!
//! Opens when the latest fund-flow sample shows positive main-capital
//! net inflow and the price has not already run away (change from the
//! prior close below a configurable cap). A deliberately simple rule;
//! richer decision sources plug in behind the same port.

use crate::domain::bar::PriceBar;
use crate::ports::decision_port::{DecisionContext, DecisionPort, Signal};
use chrono::NaiveDate;

pub struct FlowSignalAdapter {
    /// Skip entries once today's move from the prior close reaches this
    /// many percent.
    pub max_recent_change_pct: f64,
}

impl FlowSignalAdapter {
    pub fn new(max_recent_change_pct: f64) -> Self {
        Self {
            max_recent_change_pct,
        }
    }

    fn recent_change_pct(bars: &[PriceBar]) -> Option<f64> {
        // newest first: bars[0] is today, bars[1] the prior session
        let today = bars.first()?;
        let prior = bars.get(1)?;
        Some(today.change_pct_from(prior.close))
    }
}

impl Default for FlowSignalAdapter {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl DecisionPort for FlowSignalAdapter {
    fn decide(&self, _instrument: &str, date: NaiveDate, ctx: &DecisionContext<'_>) -> Signal {
        let Some(latest_flow) = ctx.flows.first() else {
            return Signal::Hold;
        };
        if latest_flow.date != date || latest_flow.main_net_inflow <= 0.0 {
            return Signal::Hold;
        }
        match Self::recent_change_pct(ctx.bars) {
            Some(change) if change >= self.max_recent_change_pct => Signal::Hold,
            // a single bar of history gives no change to judge; let the
            // flow signal stand
            _ => Signal::Open,
        }
    }
}
