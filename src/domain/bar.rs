//! Historical time-series facts: daily price bars, fund-flow samples,
//! and news items. Immutable once stored, ordered by date per instrument.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub instrument: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// Close-to-close change relative to a reference close, in percent.
    pub fn change_pct_from(&self, reference_close: f64) -> f64 {
        if reference_close == 0.0 {
            0.0
        } else {
            (self.close - reference_close) / reference_close * 100.0
        }
    }
}

/// Daily net fund-flow breakdown by order size.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSample {
    pub instrument: String,
    pub date: NaiveDate,
    pub main_net_inflow: f64,
    pub small_net_inflow: f64,
    pub medium_net_inflow: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub instrument: String,
    pub date: NaiveDate,
    pub title: String,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            instrument: "600519".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 95.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn change_pct_positive() {
        let bar = sample_bar();
        assert!((bar.change_pct_from(100.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn change_pct_negative() {
        let bar = sample_bar();
        // (105 - 120) / 120 * 100 = -12.5
        assert!((bar.change_pct_from(120.0) - (-12.5)).abs() < f64::EPSILON);
    }

    #[test]
    fn change_pct_zero_reference() {
        let bar = sample_bar();
        assert!((bar.change_pct_from(0.0) - 0.0).abs() < f64::EPSILON);
    }
}
