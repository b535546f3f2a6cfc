//! Temporal window accessor ("time machine"): date-bounded, read-only
//! views of the historical store.
//!
//! Look-ahead prevention is enforced here, not left to callers: every
//! query through a [`TimeMachine`] is bounded by its clock, so a
//! strategy or decision source physically cannot observe a bar dated
//! after the simulated date. The one sanctioned forward read lives on
//! [`OutcomeScorer`], a separate type the simulation driver never
//! holds.

use chrono::NaiveDate;

use super::bar::{FlowSample, NewsItem, PriceBar};
use super::error::LookbackError;
use crate::ports::store_port::StorePort;

/// Which auxiliary series to window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxKind {
    Flow,
    News,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuxSeries {
    Flow(Vec<FlowSample>),
    News(Vec<NewsItem>),
}

pub struct TimeMachine<'a> {
    store: &'a dyn StorePort,
    clock: NaiveDate,
}

impl<'a> TimeMachine<'a> {
    pub fn new(store: &'a dyn StorePort, clock: NaiveDate) -> Self {
        TimeMachine { store, clock }
    }

    /// Advance (or rewind, between runs) the simulation date. The date
    /// is valid by construction; parse errors surface at the config
    /// boundary as `InvalidDate`.
    pub fn set_clock(&mut self, clock: NaiveDate) {
        self.clock = clock;
    }

    pub fn clock(&self) -> NaiveDate {
        self.clock
    }

    /// Bars with `date <= clock`, newest first, at most
    /// `lookback_days` entries. Absence of data is an empty vec, never
    /// an error.
    pub fn price_series(
        &self,
        instrument: &str,
        lookback_days: usize,
    ) -> Result<Vec<PriceBar>, LookbackError> {
        let mut bars = self
            .store
            .price_bars(instrument, NaiveDate::MIN, self.clock)?;
        bars.sort_by(|a, b| b.date.cmp(&a.date));
        bars.truncate(lookback_days);
        Ok(bars)
    }

    /// The bar dated exactly `clock`, or `None` when the market was
    /// closed or the instrument unlisted that day. Not an error.
    pub fn current_price(&self, instrument: &str) -> Result<Option<PriceBar>, LookbackError> {
        let bars = self.store.price_bars(instrument, self.clock, self.clock)?;
        Ok(bars.into_iter().find(|b| b.date == self.clock))
    }

    /// Auxiliary series under the same clock bound as `price_series`.
    pub fn auxiliary_series(
        &self,
        instrument: &str,
        kind: AuxKind,
        lookback_days: usize,
    ) -> Result<AuxSeries, LookbackError> {
        match kind {
            AuxKind::Flow => {
                let mut flows = self
                    .store
                    .flow_samples(instrument, NaiveDate::MIN, self.clock)?;
                flows.sort_by(|a, b| b.date.cmp(&a.date));
                flows.truncate(lookback_days);
                Ok(AuxSeries::Flow(flows))
            }
            AuxKind::News => {
                let mut news = self
                    .store
                    .news_items(instrument, NaiveDate::MIN, self.clock)?;
                news.sort_by(|a, b| b.date.cmp(&a.date));
                news.truncate(lookback_days);
                Ok(AuxSeries::News(news))
            }
        }
    }

    pub fn flow_series(
        &self,
        instrument: &str,
        lookback_days: usize,
    ) -> Result<Vec<FlowSample>, LookbackError> {
        match self.auxiliary_series(instrument, AuxKind::Flow, lookback_days)? {
            AuxSeries::Flow(flows) => Ok(flows),
            AuxSeries::News(_) => unreachable!(),
        }
    }

    pub fn news_series(
        &self,
        instrument: &str,
        lookback_days: usize,
    ) -> Result<Vec<NewsItem>, LookbackError> {
        match self.auxiliary_series(instrument, AuxKind::News, lookback_days)? {
            AuxSeries::News(news) => Ok(news),
            AuxSeries::Flow(_) => unreachable!(),
        }
    }
}

/// After-the-fact scoring reads.
///
/// Deliberately a separate type from [`TimeMachine`]: decision and
/// simulation code paths only ever receive a `TimeMachine`, so a
/// forward-dated price cannot reach a trading decision. Only the
/// evaluation surface constructs one of these.
pub struct OutcomeScorer<'a> {
    store: &'a dyn StorePort,
}

impl<'a> OutcomeScorer<'a> {
    pub fn new(store: &'a dyn StorePort) -> Self {
        OutcomeScorer { store }
    }

    /// The bar exactly `offset_days` calendar days after `as_of`, or
    /// `None` when no bar exists on that date. `offset_days` must be
    /// positive: this method scores past decisions, it does not quote.
    pub fn verification_price(
        &self,
        instrument: &str,
        as_of: NaiveDate,
        offset_days: u32,
    ) -> Result<Option<PriceBar>, LookbackError> {
        assert!(offset_days > 0, "verification offset must be forward");
        let target = as_of + chrono::Duration::days(i64::from(offset_days));
        let bars = self.store.price_bars(instrument, target, target)?;
        Ok(bars.into_iter().find(|b| b.date == target))
    }
}
