//! Shared fixtures for integration tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use lookback::domain::bar::{FlowSample, PriceBar};
use lookback::ports::decision_port::{DecisionContext, DecisionPort, Signal};
use std::collections::HashSet;

pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

pub fn make_bar(instrument: &str, date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        instrument: instrument.to_string(),
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 10_000,
    }
}

pub fn make_flow(instrument: &str, date: NaiveDate, main: f64) -> FlowSample {
    FlowSample {
        instrument: instrument.to_string(),
        date,
        main_net_inflow: main,
        small_net_inflow: 0.0,
        medium_net_inflow: 0.0,
    }
}

/// Never opens.
pub struct AlwaysHold;

impl DecisionPort for AlwaysHold {
    fn decide(&self, _: &str, _: NaiveDate, _: &DecisionContext<'_>) -> Signal {
        Signal::Hold
    }
}

/// Opens on exactly the listed dates.
pub struct OpenOnDates(pub HashSet<NaiveDate>);

impl OpenOnDates {
    pub fn single(date: NaiveDate) -> Self {
        OpenOnDates([date].into_iter().collect())
    }
}

impl DecisionPort for OpenOnDates {
    fn decide(&self, _: &str, date: NaiveDate, _: &DecisionContext<'_>) -> Signal {
        if self.0.contains(&date) {
            Signal::Open
        } else {
            Signal::Hold
        }
    }
}
