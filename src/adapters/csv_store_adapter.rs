//! CSV file store adapter.
//!
//! Layout: one set of files per instrument under a base directory,
//! `<instrument>_prices.csv` plus optional `<instrument>_flows.csv`
//! and `<instrument>_news.csv`. A missing file reads as no data; a
//! malformed file is a store error.

use crate::domain::bar::{FlowSample, NewsItem, PriceBar};
use crate::domain::error::LookbackError;
use crate::ports::store_port::StorePort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvStoreAdapter {
    base_path: PathBuf,
}

impl CsvStoreAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn file_path(&self, instrument: &str, kind: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", instrument, kind))
    }

    /// Read a file's contents, treating absence as no data.
    fn read_optional(&self, instrument: &str, kind: &str) -> Result<Option<String>, LookbackError> {
        let path = self.file_path(instrument, kind);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LookbackError::Store {
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }
}

fn store_err(reason: String) -> LookbackError {
    LookbackError::Store { reason }
}

fn get_field<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, LookbackError> {
    record
        .get(index)
        .ok_or_else(|| store_err(format!("missing {} column", name)))
}

fn parse_record_date(record: &csv::StringRecord, index: usize) -> Result<NaiveDate, LookbackError> {
    let raw = get_field(record, index, "date")?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| store_err(format!("invalid date {}: {}", raw, e)))
}

fn parse_f64(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, LookbackError> {
    get_field(record, index, name)?
        .parse()
        .map_err(|e| store_err(format!("invalid {} value: {}", name, e)))
}

fn parse_i64(record: &csv::StringRecord, index: usize, name: &str) -> Result<i64, LookbackError> {
    get_field(record, index, name)?
        .parse()
        .map_err(|e| store_err(format!("invalid {} value: {}", name, e)))
}

impl StorePort for CsvStoreAdapter {
    fn price_bars(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, LookbackError> {
        let Some(content) = self.read_optional(instrument, "prices")? else {
            return Ok(Vec::new());
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| store_err(format!("CSV parse error: {}", e)))?;
            let date = parse_record_date(&record, 0)?;
            if date < start || date > end {
                continue;
            }
            bars.push(PriceBar {
                instrument: instrument.to_string(),
                date,
                open: parse_f64(&record, 1, "open")?,
                high: parse_f64(&record, 2, "high")?,
                low: parse_f64(&record, 3, "low")?,
                close: parse_f64(&record, 4, "close")?,
                volume: parse_i64(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn flow_samples(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FlowSample>, LookbackError> {
        let Some(content) = self.read_optional(instrument, "flows")? else {
            return Ok(Vec::new());
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut flows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| store_err(format!("CSV parse error: {}", e)))?;
            let date = parse_record_date(&record, 0)?;
            if date < start || date > end {
                continue;
            }
            flows.push(FlowSample {
                instrument: instrument.to_string(),
                date,
                main_net_inflow: parse_f64(&record, 1, "main_net_inflow")?,
                small_net_inflow: parse_f64(&record, 2, "small_net_inflow")?,
                medium_net_inflow: parse_f64(&record, 3, "medium_net_inflow")?,
            });
        }

        flows.sort_by_key(|f| f.date);
        Ok(flows)
    }

    fn news_items(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, LookbackError> {
        let Some(content) = self.read_optional(instrument, "news")? else {
            return Ok(Vec::new());
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut news = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| store_err(format!("CSV parse error: {}", e)))?;
            let date = parse_record_date(&record, 0)?;
            if date < start || date > end {
                continue;
            }
            news.push(NewsItem {
                instrument: instrument.to_string(),
                date,
                title: get_field(&record, 1, "title")?.to_string(),
                source: get_field(&record, 2, "source")?.to_string(),
            });
        }

        news.sort_by_key(|n| n.date);
        Ok(news)
    }

    fn data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LookbackError> {
        let bars = self.price_bars(instrument, NaiveDate::MIN, NaiveDate::MAX)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let prices = "date,open,high,low,close,volume\n\
            2025-06-02,10.0,10.5,9.8,10.2,50000\n\
            2025-06-03,10.2,10.8,10.1,10.6,60000\n\
            2025-06-04,10.6,11.0,10.4,10.9,55000\n";
        fs::write(path.join("600519_prices.csv"), prices).unwrap();

        let flows = "date,main_net_inflow,small_net_inflow,medium_net_inflow\n\
            2025-06-02,1500000.0,-200000.0,50000.0\n\
            2025-06-03,-300000.0,100000.0,0.0\n";
        fs::write(path.join("600519_flows.csv"), flows).unwrap();

        let news = "date,title,source\n\
            2025-06-02,quarterly results beat estimates,wire\n";
        fs::write(path.join("600519_news.csv"), news).unwrap();

        (dir, path)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn price_bars_parsed_and_filtered() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvStoreAdapter::new(path);

        let bars = adapter.price_bars("600519", date(2), date(3)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2));
        assert_eq!(bars[0].open, 10.0);
        assert_eq!(bars[0].close, 10.2);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[1].date, date(3));
    }

    #[test]
    fn missing_prices_file_reads_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvStoreAdapter::new(path);
        assert!(adapter.price_bars("000000", date(1), date(30)).unwrap().is_empty());
    }

    #[test]
    fn malformed_prices_file_is_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(
            path.join("600519_prices.csv"),
            "date,open,high,low,close,volume\n2025-06-02,ten,10.5,9.8,10.2,50000\n",
        )
        .unwrap();
        let adapter = CsvStoreAdapter::new(path);
        let err = adapter.price_bars("600519", date(1), date(30)).unwrap_err();
        assert!(matches!(err, LookbackError::Store { .. }));
    }

    #[test]
    fn flows_parsed() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvStoreAdapter::new(path);

        let flows = adapter.flow_samples("600519", date(1), date(30)).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].main_net_inflow, 1_500_000.0);
        assert_eq!(flows[0].small_net_inflow, -200_000.0);
    }

    #[test]
    fn missing_flows_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(
            path.join("600519_prices.csv"),
            "date,open,high,low,close,volume\n2025-06-02,10,10,10,10,1\n",
        )
        .unwrap();
        let adapter = CsvStoreAdapter::new(path);
        assert!(adapter.flow_samples("600519", date(1), date(30)).unwrap().is_empty());
    }

    #[test]
    fn news_parsed() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvStoreAdapter::new(path);

        let news = adapter.news_items("600519", date(1), date(30)).unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].title, "quarterly results beat estimates");
        assert_eq!(news[0].source, "wire");
    }

    #[test]
    fn data_range_covers_whole_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvStoreAdapter::new(path);

        let (first, last, count) = adapter.data_range("600519").unwrap().unwrap();
        assert_eq!(first, date(2));
        assert_eq!(last, date(4));
        assert_eq!(count, 3);
    }

    #[test]
    fn data_range_unknown_instrument_is_none() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvStoreAdapter::new(path);
        assert!(adapter.data_range("000000").unwrap().is_none());
    }
}
