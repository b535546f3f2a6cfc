//! Historical store access port.
//!
//! The store is append-only and external; the core only ever reads
//! from it, and almost always through the clock-bounded
//! [`crate::domain::time_machine::TimeMachine`] rather than directly.

use crate::domain::bar::{FlowSample, NewsItem, PriceBar};
use crate::domain::error::LookbackError;
use chrono::NaiveDate;

pub trait StorePort {
    /// Price bars for `instrument` with `start <= date <= end`,
    /// ascending by date. Empty when nothing is stored in the range.
    fn price_bars(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, LookbackError>;

    fn flow_samples(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FlowSample>, LookbackError>;

    fn news_items(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, LookbackError>;

    /// `(first date, last date, bar count)` of stored prices, or `None`
    /// when the instrument is unknown.
    fn data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LookbackError>;
}
