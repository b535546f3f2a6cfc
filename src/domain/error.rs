//! Fatal error taxonomy.
//!
//! Policy rejections (insufficient cash/shares, no position) live in
//! [`crate::domain::ledger::LedgerError`] and never abort a run; the
//! variants here indicate an invariant violation or an unusable
//! environment and do.

/// Top-level error type for lookback.
#[derive(Debug, thiserror::Error)]
pub enum LookbackError {
    #[error("invalid date {value}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid strategy: {reason}")]
    StrategyInvalid { reason: String },

    #[error("no data for {instrument}")]
    NoData { instrument: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LookbackError> for std::process::ExitCode {
    fn from(err: &LookbackError) -> Self {
        let code: u8 = match err {
            LookbackError::Io(_) => 1,
            LookbackError::ConfigParse { .. }
            | LookbackError::ConfigMissing { .. }
            | LookbackError::ConfigInvalid { .. } => 2,
            LookbackError::Store { .. } | LookbackError::NoData { .. } => 3,
            LookbackError::StrategyInvalid { .. } => 4,
            LookbackError::InvalidDate { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

/// Parse a `YYYY-MM-DD` date, mapping failure to [`LookbackError::InvalidDate`].
///
/// Calendar validity is enforced here at the boundary; everywhere else a
/// `NaiveDate` is valid by construction.
pub fn parse_date(value: &str) -> Result<chrono::NaiveDate, LookbackError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| LookbackError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2025-06-02").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn parse_date_not_a_calendar_date() {
        let err = parse_date("2025-02-30").unwrap_err();
        assert!(matches!(err, LookbackError::InvalidDate { .. }));
    }

    #[test]
    fn parse_date_wrong_format() {
        let err = parse_date("02/06/2025").unwrap_err();
        assert!(matches!(err, LookbackError::InvalidDate { .. }));
    }

    #[test]
    fn exit_codes() {
        let err = LookbackError::ConfigMissing {
            section: "backtest".into(),
            key: "start_date".into(),
        };
        let _code: std::process::ExitCode = (&err).into();

        let err = LookbackError::InvalidDate {
            value: "x".into(),
            reason: "bad".into(),
        };
        let _code: std::process::ExitCode = (&err).into();
    }
}
