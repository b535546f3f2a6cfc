//! Strategy parameters: tiered take-profit ladder, stop-loss, optional
//! trailing-to-breakeven, and position sizing.

use crate::domain::error::LookbackError;

/// One rung of the take-profit ladder: once peak gain reaches
/// `threshold_pct`, sell `sell_fraction` of the current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub threshold_pct: f64,
    pub sell_fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub name: String,
    /// Ascending by threshold; validated.
    pub tiers: Vec<Tier>,
    /// Negative, e.g. -5.0 closes the full position at a 5% loss.
    pub stop_loss_pct: f64,
    /// Once peak gain reaches this, a fall back to entry closes the
    /// position rather than letting a winner turn into a loser.
    pub trail_to_breakeven_pct: Option<f64>,
    /// Fraction of available cash committed per entry.
    pub entry_fraction: f64,
    /// Minimum tradable lot; share quantities are whole multiples.
    pub lot_size: i64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            name: "ladder".to_string(),
            tiers: vec![
                Tier { threshold_pct: 10.0, sell_fraction: 0.20 },
                Tier { threshold_pct: 15.0, sell_fraction: 0.20 },
                Tier { threshold_pct: 20.0, sell_fraction: 0.20 },
                Tier { threshold_pct: 30.0, sell_fraction: 1.0 },
            ],
            stop_loss_pct: -5.0,
            trail_to_breakeven_pct: None,
            entry_fraction: 0.5,
            lot_size: 1,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), LookbackError> {
        if self.stop_loss_pct >= 0.0 {
            return Err(invalid("stop_loss_pct must be negative"));
        }
        if !(self.entry_fraction > 0.0 && self.entry_fraction <= 1.0) {
            return Err(invalid("entry_fraction must be in (0, 1]"));
        }
        if self.lot_size < 1 {
            return Err(invalid("lot_size must be at least 1"));
        }
        if let Some(trail) = self.trail_to_breakeven_pct {
            if trail <= 0.0 {
                return Err(invalid("trail_to_breakeven_pct must be positive"));
            }
        }
        let mut prev_threshold = 0.0;
        for tier in &self.tiers {
            if tier.threshold_pct <= prev_threshold {
                return Err(invalid(
                    "tier thresholds must be positive and strictly ascending",
                ));
            }
            if !(tier.sell_fraction > 0.0 && tier.sell_fraction <= 1.0) {
                return Err(invalid("tier sell fractions must be in (0, 1]"));
            }
            prev_threshold = tier.threshold_pct;
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> LookbackError {
    LookbackError::StrategyInvalid {
        reason: reason.to_string(),
    }
}

/// Parse a tier list of the form `"10:0.2,15:0.2,30:1.0"`.
pub fn parse_tiers(input: &str) -> Result<Vec<Tier>, LookbackError> {
    let mut tiers = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty tier entry"));
        }
        let (threshold, fraction) = trimmed
            .split_once(':')
            .ok_or_else(|| invalid("tier entries must look like THRESHOLD:FRACTION"))?;
        let threshold_pct: f64 = threshold
            .trim()
            .parse()
            .map_err(|_| invalid("tier threshold is not a number"))?;
        let sell_fraction: f64 = fraction
            .trim()
            .parse()
            .map_err(|_| invalid("tier sell fraction is not a number"))?;
        tiers.push(Tier {
            threshold_pct,
            sell_fraction,
        });
    }
    Ok(tiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(StrategyParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_positive_stop_loss() {
        let params = StrategyParams {
            stop_loss_pct: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(LookbackError::StrategyInvalid { .. })
        ));
    }

    #[test]
    fn rejects_unsorted_tiers() {
        let params = StrategyParams {
            tiers: vec![
                Tier { threshold_pct: 15.0, sell_fraction: 0.2 },
                Tier { threshold_pct: 10.0, sell_fraction: 0.2 },
            ],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_tier_thresholds() {
        let params = StrategyParams {
            tiers: vec![
                Tier { threshold_pct: 10.0, sell_fraction: 0.2 },
                Tier { threshold_pct: 10.0, sell_fraction: 0.4 },
            ],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_fraction_above_one() {
        let params = StrategyParams {
            tiers: vec![Tier { threshold_pct: 10.0, sell_fraction: 1.5 }],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_entry_fraction_zero() {
        let params = StrategyParams {
            entry_fraction: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_trail() {
        let params = StrategyParams {
            trail_to_breakeven_pct: Some(0.0),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn parse_tiers_basic() {
        let tiers = parse_tiers("10:0.2, 15:0.2, 30:1.0").unwrap();
        assert_eq!(tiers.len(), 3);
        assert!((tiers[0].threshold_pct - 10.0).abs() < f64::EPSILON);
        assert!((tiers[2].sell_fraction - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_tiers_bad_separator() {
        assert!(parse_tiers("10=0.2").is_err());
    }

    #[test]
    fn parse_tiers_bad_number() {
        assert!(parse_tiers("ten:0.2").is_err());
    }

    #[test]
    fn parse_tiers_empty_entry() {
        assert!(parse_tiers("10:0.2,,15:0.2").is_err());
    }
}
