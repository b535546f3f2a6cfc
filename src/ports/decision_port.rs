//! Entry-decision port.
//!
//! The surrounding analysis layer (screening rules, an LLM agent,
//! whatever) decides whether to open a position. The core guarantees
//! the context it passes is bounded by the simulation clock; the
//! decision source sees nothing dated after the current date.

use crate::domain::bar::{FlowSample, NewsItem, PriceBar};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Open,
    Hold,
}

/// Clock-bounded view handed to the decision source. All series are
/// ordered newest first.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub bars: &'a [PriceBar],
    pub flows: &'a [FlowSample],
    pub news: &'a [NewsItem],
}

pub trait DecisionPort {
    /// Must be fully resolved by the time the driver asks; the driver
    /// never blocks mid-date on a decision.
    fn decide(&self, instrument: &str, date: NaiveDate, ctx: &DecisionContext<'_>) -> Signal;
}
