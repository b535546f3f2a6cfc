//! CSV report adapter: writes a finished run's trade log, daily mark
//! series, and summary statistics into an output directory.

use crate::domain::driver::SimulationResult;
use crate::domain::error::LookbackError;
use crate::domain::position::TradeAction;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn file_path(&self, instrument: &str, kind: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.csv", instrument, kind))
    }

    fn write_trades(&self, result: &SimulationResult) -> Result<(), LookbackError> {
        let path = self.file_path(&result.instrument, "trades");
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| LookbackError::Store {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        wtr.write_record([
            "date",
            "instrument",
            "action",
            "price",
            "shares",
            "cash_delta",
            "realized_profit",
            "reason",
        ])
        .map_err(csv_err)?;
        for trade in result.ledger.trades() {
            let action = match trade.action {
                TradeAction::Open => "OPEN",
                TradeAction::Close => "CLOSE",
            };
            let realized = trade
                .realized_profit
                .map(|p| format!("{:.2}", p))
                .unwrap_or_default();
            wtr.write_record([
                trade.date.to_string(),
                trade.instrument.clone(),
                action.to_string(),
                format!("{:.4}", trade.price),
                trade.shares.to_string(),
                format!("{:.2}", trade.cash_delta),
                realized,
                trade.reason.clone(),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_marks(&self, result: &SimulationResult) -> Result<(), LookbackError> {
        let path = self.file_path(&result.instrument, "marks");
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| LookbackError::Store {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        wtr.write_record(["date", "total_value"]).map_err(csv_err)?;
        for mark in result.ledger.daily_marks() {
            wtr.write_record([mark.date.to_string(), format!("{:.2}", mark.total_value)])
                .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_summary(&self, result: &SimulationResult) -> Result<(), LookbackError> {
        let path = self.file_path(&result.instrument, "summary");
        let ev = &result.evaluation;
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| LookbackError::Store {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        wtr.write_record(["metric", "value"]).map_err(csv_err)?;
        let rows: [(&str, String); 12] = [
            ("initial_capital", format!("{:.2}", ev.initial_capital)),
            ("final_value", format!("{:.2}", ev.final_value)),
            ("total_return_pct", format!("{:.4}", ev.total_return_pct)),
            ("total_trades", ev.total_trades.to_string()),
            ("wins", ev.wins.to_string()),
            ("losses", ev.losses.to_string()),
            ("win_rate_pct", format!("{:.2}", ev.win_rate_pct)),
            ("profit_ratio", format!("{:.4}", ev.profit_ratio)),
            ("avg_win", format!("{:.2}", ev.avg_win)),
            ("avg_loss", format!("{:.2}", ev.avg_loss)),
            ("max_drawdown_pct", format!("{:.4}", ev.max_drawdown_pct)),
            ("trading_days", result.trading_days.to_string()),
        ];
        for (metric, value) in rows {
            wtr.write_record([metric.to_string(), value]).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> LookbackError {
    LookbackError::Store {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_result(&self, result: &SimulationResult) -> Result<(), LookbackError> {
        fs::create_dir_all(&self.output_dir)?;
        self.write_trades(result)?;
        self.write_marks(result)?;
        self.write_summary(result)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluator::Evaluation;
    use crate::domain::ledger::Ledger;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn sample_result() -> SimulationResult {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open(date(2), "600519", 10.0, 500, "ENTRY_SIGNAL").unwrap();
        ledger.record_daily_mark(date(2), |_| Some(10.0));
        ledger
            .close(date(5), "600519", 11.5, 500, "TAKE_PROFIT:10")
            .unwrap();
        ledger.record_daily_mark(date(5), |_| Some(11.5));
        let evaluation = Evaluation::compute(&ledger);
        SimulationResult {
            instrument: "600519".to_string(),
            ledger,
            evaluation,
            skipped_entries: 0,
            skipped_exits: 0,
            trading_days: 2,
        }
    }

    #[test]
    fn writes_all_three_files() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        adapter.write_result(&sample_result()).unwrap();

        assert!(dir.path().join("600519_trades.csv").exists());
        assert!(dir.path().join("600519_marks.csv").exists());
        assert!(dir.path().join("600519_summary.csv").exists());
    }

    #[test]
    fn trades_file_round_trips_through_csv_reader() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        adapter.write_result(&sample_result()).unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("600519_trades.csv")).unwrap();
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][2], "OPEN");
        assert_eq!(&records[1][2], "CLOSE");
        assert_eq!(&records[1][7], "TAKE_PROFIT:10");
        // open has no realized profit
        assert_eq!(&records[0][6], "");
        assert_eq!(&records[1][6], "750.00");
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports").join("run1");
        let adapter = CsvReportAdapter::new(nested.clone());
        adapter.write_result(&sample_result()).unwrap();
        assert!(nested.join("600519_summary.csv").exists());
    }
}
