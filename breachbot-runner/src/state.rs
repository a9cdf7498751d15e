//! Circuit-breaker state persistence.
//!
//! The breaker must survive a supervisor restart: a bot that forgets three
//! consecutive losses on every crash has no circuit breaker at all. State
//! is a single JSON file written after every position close.

use anyhow::{Context, Result};
use breachbot_core::risk::RiskState;
use std::fs;
use std::path::Path;

/// Write the risk state atomically (write-then-rename).
pub fn save(path: &Path, risk: &RiskState) -> Result<()> {
    let json = serde_json::to_string_pretty(risk).context("serializing risk state")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Load persisted risk state, or `None` when no file exists yet.
pub fn load(path: &Path) -> Result<Option<RiskState>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let risk = serde_json::from_str(&json)
        .with_context(|| format!("parsing risk state in {}", path.display()))?;
    Ok(Some(risk))
}
