//! In-memory store adapter, used by tests and the demo path.

use crate::domain::bar::{FlowSample, NewsItem, PriceBar};
use crate::domain::error::LookbackError;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStoreAdapter {
    bars: HashMap<String, Vec<PriceBar>>,
    flows: HashMap<String, Vec<FlowSample>>,
    news: HashMap<String, Vec<NewsItem>>,
}

impl MemoryStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, instrument: &str, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.bars.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_flows(mut self, instrument: &str, mut flows: Vec<FlowSample>) -> Self {
        flows.sort_by_key(|f| f.date);
        self.flows.insert(instrument.to_string(), flows);
        self
    }

    pub fn with_news(mut self, instrument: &str, mut news: Vec<NewsItem>) -> Self {
        news.sort_by_key(|n| n.date);
        self.news.insert(instrument.to_string(), news);
        self
    }
}

impl StorePort for MemoryStoreAdapter {
    fn price_bars(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, LookbackError> {
        Ok(self
            .bars
            .get(instrument)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn flow_samples(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FlowSample>, LookbackError> {
        Ok(self
            .flows
            .get(instrument)
            .map(|flows| {
                flows
                    .iter()
                    .filter(|f| f.date >= start && f.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn news_items(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, LookbackError> {
        Ok(self
            .news
            .get(instrument)
            .map(|news| {
                news.iter()
                    .filter(|n| n.date >= start && n.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LookbackError> {
        Ok(self.bars.get(instrument).and_then(|bars| {
            let first = bars.first()?;
            let last = bars.last()?;
            Some((first.date, last.date, bars.len()))
        }))
    }
}
