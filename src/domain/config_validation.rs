//! Configuration validation.
//!
//! Validates all config fields before a backtest runs, so a bad file
//! fails fast with a named section and key instead of mid-run.

use crate::domain::error::LookbackError;
use crate::domain::strategy::{StrategyParams, Tier, parse_tiers};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_instruments(config)?;
    validate_lookback_days(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    validate_tiers(config)?;
    validate_stop_loss(config)?;
    validate_trail(config)?;
    validate_entry_fraction(config)?;
    validate_lot_size(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(LookbackError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_config_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_config_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(LookbackError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_config_date(value: Option<&str>, field: &str) -> Result<NaiveDate, LookbackError> {
    match value {
        None => Err(LookbackError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| LookbackError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    match config.get_string("backtest", "instruments") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(LookbackError::ConfigMissing {
            section: "backtest".to_string(),
            key: "instruments".to_string(),
        }),
    }
}

fn validate_lookback_days(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let value = config.get_int("backtest", "lookback_days", 30);
    if value < 1 {
        return Err(LookbackError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "lookback_days".to_string(),
            reason: "lookback_days must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_tiers(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let Some(raw) = config.get_string("strategy", "tiers") else {
        // omitted tiers fall back to the default ladder
        return Ok(());
    };
    let tiers = parse_tiers(&raw).map_err(|e| LookbackError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "tiers".to_string(),
        reason: e.to_string(),
    })?;
    let params = StrategyParams {
        tiers,
        ..Default::default()
    };
    params.validate().map_err(|e| LookbackError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "tiers".to_string(),
        reason: e.to_string(),
    })
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let value = config.get_double("strategy", "stop_loss_pct", -5.0);
    if value >= 0.0 {
        return Err(LookbackError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "stop_loss_pct".to_string(),
            reason: "stop_loss_pct must be negative".to_string(),
        });
    }
    Ok(())
}

fn validate_trail(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    if config.get_string("strategy", "trail_to_breakeven_pct").is_none() {
        return Ok(());
    }
    let value = config.get_double("strategy", "trail_to_breakeven_pct", 0.0);
    if value <= 0.0 {
        return Err(LookbackError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "trail_to_breakeven_pct".to_string(),
            reason: "trail_to_breakeven_pct must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_entry_fraction(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let value = config.get_double("strategy", "entry_fraction", 0.5);
    if value <= 0.0 || value > 1.0 {
        return Err(LookbackError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "entry_fraction".to_string(),
            reason: "entry_fraction must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_lot_size(config: &dyn ConfigPort) -> Result<(), LookbackError> {
    let value = config.get_int("strategy", "lot_size", 1);
    if value < 1 {
        return Err(LookbackError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "lot_size".to_string(),
            reason: "lot_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Split the `instruments` comma list into trimmed, non-empty codes.
pub fn parse_instruments(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build [`StrategyParams`] from the `[strategy]` section, validated.
pub fn strategy_params_from_config(
    config: &dyn ConfigPort,
) -> Result<StrategyParams, LookbackError> {
    let defaults = StrategyParams::default();
    let tiers: Vec<Tier> = match config.get_string("strategy", "tiers") {
        Some(raw) => parse_tiers(&raw)?,
        None => defaults.tiers.clone(),
    };
    let params = StrategyParams {
        name: config
            .get_string("strategy", "name")
            .unwrap_or(defaults.name),
        tiers,
        stop_loss_pct: config.get_double("strategy", "stop_loss_pct", defaults.stop_loss_pct),
        trail_to_breakeven_pct: config
            .get_string("strategy", "trail_to_breakeven_pct")
            .map(|_| config.get_double("strategy", "trail_to_breakeven_pct", 0.0)),
        entry_fraction: config.get_double("strategy", "entry_fraction", defaults.entry_fraction),
        lot_size: config.get_int("strategy", "lot_size", defaults.lot_size),
    };
    params.validate()?;
    Ok(params)
}
