//! Engine configuration from environment variables.
//!
//! Every knob has a default matching the demo strategy, so an empty
//! environment yields a runnable config. Malformed values fail loudly
//! rather than silently falling back — a typo in `BREACHBOT_LEVERAGE`
//! must not trade at the default leverage.

use anyhow::{bail, Context, Result};
use breachbot_core::config::EngineConfig;
use breachbot_core::domain::{MarginMode, Timeframe};
use std::env;
use std::str::FromStr;

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(default);
            }
            match trimmed.parse::<T>() {
                Ok(value) => Ok(value),
                Err(err) => bail!("invalid {name}='{trimmed}': {err}"),
            }
        }
        Err(_) => Ok(default),
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Build and validate an [`EngineConfig`] from `BREACHBOT_*` variables.
pub fn from_env() -> Result<EngineConfig> {
    let defaults = EngineConfig::default();
    let config = EngineConfig {
        symbol: env_str("BREACHBOT_SYMBOL", &defaults.symbol),
        timeframe: env_parse::<Timeframe>("BREACHBOT_TIMEFRAME", defaults.timeframe)?,
        leverage: env_parse("BREACHBOT_LEVERAGE", defaults.leverage)?,
        margin_mode: env_parse::<MarginMode>("BREACHBOT_MARGIN_MODE", defaults.margin_mode)?,
        base_margin: env_parse("BREACHBOT_BASE_MARGIN", defaults.base_margin)?,
        tp_percentage: env_parse("BREACHBOT_TP_PERCENTAGE", defaults.tp_percentage)?,
        risk_per_trade: env_parse("BREACHBOT_RISK_PER_TRADE", defaults.risk_per_trade)?,
        loss_threshold: env_parse("BREACHBOT_LOSS_THRESHOLD", defaults.loss_threshold)?,
        cooldown_secs: env_parse("BREACHBOT_COOLDOWN_SECS", defaults.cooldown_secs)?,
        max_attempts: env_parse("BREACHBOT_MAX_ATTEMPTS", defaults.max_attempts)?,
        backoff_base_ms: env_parse("BREACHBOT_BACKOFF_BASE_MS", defaults.backoff_base_ms)?,
    };
    config
        .validate()
        .context("environment produced an invalid engine config")?;
    Ok(config)
}
