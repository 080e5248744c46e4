//! Configuration validation.
//!
//! Checks the `[data]`, `[analysis]` and `[portfolio]` sections before any
//! data is loaded.

use crate::domain::engine_config::parse_lookbacks;
use crate::domain::error::EngineError;
use crate::domain::series::Frequency;
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    match config.get_string("data", "prices") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(EngineError::ConfigMissing {
            section: "data".to_string(),
            key: "prices".to_string(),
        }),
    }
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_alpha(config)?;
    validate_risk_free_rate(config)?;
    validate_periods_per_year(config)?;
    validate_drawdown_eps(config)?;
    validate_lookbacks(config)?;
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_iron_threshold(config)?;
    validate_iron_rule(config)?;
    validate_counts(config)?;
    validate_fund_size(config)?;
    validate_non_negative(config, "trade_threshold")?;
    validate_non_negative(config, "transaction_cost_bps")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_alpha(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double("analysis", "alpha", 0.95);
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid("analysis", "alpha", "alpha must be between 0 and 1"));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double("analysis", "risk_free_rate", 0.0);
    if !(-1.0..1.0).contains(&value) {
        return Err(invalid(
            "analysis",
            "risk_free_rate",
            "risk_free_rate must be between -1 and 1",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if config.get_string("analysis", "periods_per_year").is_none() {
        return Ok(());
    }
    let value = config.get_double("analysis", "periods_per_year", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "analysis",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_drawdown_eps(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double("analysis", "drawdown_eps", 0.0);
    if value < 0.0 {
        return Err(invalid(
            "analysis",
            "drawdown_eps",
            "drawdown_eps must be non-negative",
        ));
    }
    Ok(())
}

fn validate_lookbacks(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if let Some(value) = config.get_string("analysis", "lookbacks") {
        parse_lookbacks(&value)?;
    }
    Ok(())
}

fn validate_iron_threshold(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double("portfolio", "iron_threshold", 0.02);
    if value < 0.0 {
        return Err(invalid(
            "portfolio",
            "iron_threshold",
            "iron_threshold must be non-negative",
        ));
    }
    Ok(())
}

fn validate_iron_rule(config: &dyn ConfigPort) -> Result<(), EngineError> {
    match config.get_string("portfolio", "iron_rule") {
        Some(rule) if !rule.trim().is_empty() => rule
            .parse::<Frequency>()
            .map(|_| ())
            .map_err(|_| invalid("portfolio", "iron_rule", "iron_rule must be one of W, M, Q, A")),
        _ => Ok(()),
    }
}

fn validate_counts(config: &dyn ConfigPort) -> Result<(), EngineError> {
    for key in ["snapshot_days", "top_n"] {
        if config.get_int("portfolio", key, 5) < 1 {
            return Err(EngineError::ConfigInvalid {
                section: "portfolio".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be at least 1"),
            });
        }
    }
    Ok(())
}

fn validate_fund_size(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double("portfolio", "fund_size", 1e6);
    if value <= 0.0 {
        return Err(invalid("portfolio", "fund_size", "fund_size must be positive"));
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, key: &str) -> Result<(), EngineError> {
    if config.get_double("portfolio", key, 0.0) < 0.0 {
        return Err(EngineError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be non-negative"),
        });
    }
    Ok(())
}
