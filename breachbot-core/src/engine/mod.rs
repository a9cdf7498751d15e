//! The per-candle pipeline: drain the pending slot, ingest the candle,
//! detect a signal, queue the next entry.
//!
//! The engine is process-scoped and owns all strategy state: the candle
//! window, the incremental EMA stream, the single pending-entry slot, the
//! risk/breaker bookkeeping, and the open-position record. It performs no
//! I/O — the driver feeds it candles and an account view, and dispatches
//! whatever intents it emits. One candle is processed at a time; strict
//! temporal ordering of signals and breaker transitions follows from the
//! window's ordering checks.

mod report;

pub use report::{CandleReport, OpenPosition, SkipReason};

use crate::account::AccountView;
use crate::config::{ConfigError, EngineConfig};
use crate::domain::{Candle, CandleWindow, OrderIntent, PendingEntry, WindowError};
use crate::indicators::{IndicatorEngine, IndicatorError};
use crate::risk::RiskState;
use crate::signals;
use crate::sizing;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A candle the window rejected, together with anything the engine consumed
/// before the rejection surfaced.
///
/// The pending slot is drained before the append, so a gap candle can carry
/// a stale-entry discard that would otherwise be lost with the failed report.
#[derive(Debug, Error)]
#[error("{window}")]
pub struct ProcessError {
    pub window: WindowError,
    /// A pending entry discarded while processing the rejected candle.
    pub discarded: Option<SkipReason>,
}

/// Signal-generation and order-lifecycle engine for one symbol.
pub struct Engine {
    config: EngineConfig,
    window: CandleWindow,
    indicators: IndicatorEngine,
    pending: Option<PendingEntry>,
    risk: RiskState,
    position: Option<OpenPosition>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let risk = RiskState::from_config(&config);
        Self::with_risk_state(config, risk)
    }

    /// Construct with restored risk state (circuit breaker survives restarts).
    pub fn with_risk_state(config: EngineConfig, risk: RiskState) -> Result<Self, ConfigError> {
        config.validate()?;
        let indicators = IndicatorEngine::with_defaults();
        let window = CandleWindow::new(indicators.min_history(), config.timeframe);
        Ok(Self {
            config,
            window,
            indicators,
            pending: None,
            risk,
            position: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn risk_state(&self) -> &RiskState {
        &self.risk
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        self.position.as_ref()
    }

    pub fn pending_entry(&self) -> Option<&PendingEntry> {
        self.pending.as_ref()
    }

    /// Candles the driver should fetch when (re)seeding history.
    pub fn required_history(&self) -> usize {
        self.indicators.min_history()
    }

    /// Replace all candle history, e.g. at startup or after a feed gap.
    ///
    /// Discards the pending entry (its execution candle is gone) and the EMA
    /// stream, then replays the supplied candles oldest-first. Risk state and
    /// the open-position record survive.
    pub fn seed_history(&mut self, candles: &[Candle]) -> Result<(), WindowError> {
        self.window.clear();
        self.indicators.reset();
        if self.pending.take().is_some() {
            warn!("pending entry discarded during history reseed");
        }
        for candle in candles {
            self.window.push(candle.clone())?;
            self.indicators.observe_close(candle.close);
        }
        debug!(candles = candles.len(), "history reseeded");
        Ok(())
    }

    /// Process one newly closed candle.
    ///
    /// Phases, in order:
    /// 1. Drain the pending slot against this candle's open price. The entry
    ///    executes only on its exact expected candle; anything else is a
    ///    stale discard. Breaker and risk gates apply here.
    /// 2. Append the candle (ordering, duplicate, and gap checks).
    /// 3. Compute the indicator snapshot and detect a breach on this close;
    ///    a directional signal fills the now-empty slot for the next open.
    ///
    /// A gap surfaces as a [`ProcessError`] wrapping `WindowError::FeedGap`;
    /// the caller reseeds via [`seed_history`](Self::seed_history) and
    /// resumes. The pending slot is always consumed before the append, so a
    /// failed append can never lose an executable entry — its timestamp
    /// check fails first and the discard rides along on the error.
    pub fn process_candle(
        &mut self,
        candle: Candle,
        account: &AccountView,
    ) -> Result<CandleReport, ProcessError> {
        let mut report = CandleReport::empty(candle.timestamp);

        if let Some(entry) = self.pending.take() {
            self.drain_entry(entry, &candle, account, &mut report);
        }

        if let Err(window) = self.window.push(candle.clone()) {
            return Err(ProcessError {
                window,
                discarded: report.skipped.take(),
            });
        }
        self.indicators.observe_close(candle.close);

        match self.indicators.snapshot(&self.window) {
            Ok(snapshot) => {
                // Single position at a time: while one is open, same- and
                // conflicting-direction signals are both suppressed.
                if self.position.is_none() && !account.has_open_position() {
                    if let Some(signal) = signals::detect(&candle, &snapshot) {
                        info!(
                            direction = ?signal.direction,
                            close = candle.close,
                            sma = snapshot.sma,
                            ema = snapshot.ema,
                            stop_reference = signal.stop_reference,
                            "band breach detected, entry queued for next open"
                        );
                        self.pending = Some(PendingEntry::new(signal));
                        report.signal = Some(signal);
                    }
                } else {
                    debug!("position open, signal detection suppressed");
                }
            }
            Err(IndicatorError::InsufficientHistory { have, need }) => {
                debug!(have, need, "warming up, no signal detection");
                report.warming_up = true;
            }
        }

        Ok(report)
    }

    fn drain_entry(
        &mut self,
        entry: PendingEntry,
        candle: &Candle,
        account: &AccountView,
        report: &mut CandleReport,
    ) {
        let expected_at = entry.executes_at(self.config.timeframe.interval());
        if candle.timestamp != expected_at {
            let reason = SkipReason::StaleSignal {
                queued_at: entry.signal.source_timestamp,
                expected_at,
            };
            warn!(%reason, "pending entry discarded");
            report.skipped = Some(reason);
            return;
        }
        if self.position.is_some() || account.has_open_position() {
            info!("skipping entry, active position exists");
            report.skipped = Some(SkipReason::PositionOpen);
            return;
        }
        if !self.risk.is_armed(candle.timestamp) {
            warn!(
                consecutive_losses = self.risk.consecutive_losses(),
                "entry blocked, circuit breaker in cooldown"
            );
            report.skipped = Some(SkipReason::CircuitBreakerTripped);
            return;
        }
        match sizing::build_intent(&self.config, &entry.signal, candle.open, account.balance) {
            Ok(intent) => {
                info!(
                    direction = ?intent.direction,
                    size = intent.size,
                    entry_price = intent.entry_price,
                    stop_loss = intent.stop_loss,
                    take_profit = intent.take_profit,
                    "entry sized and risk-approved"
                );
                report.intent = Some(intent);
            }
            Err(err) => {
                warn!(error = %err, "entry skipped");
                report.skipped = Some(SkipReason::SizingRejected(err));
            }
        }
    }

    /// Record the accepted entry as the open position.
    pub fn on_order_accepted(&mut self, intent: &OrderIntent, now: DateTime<Utc>) {
        self.position = Some(OpenPosition {
            direction: intent.direction,
            size: intent.size,
            entry_price: intent.entry_price,
            client_order_id: intent.client_order_id(),
            opened_at: now,
        });
    }

    /// Record a position close and feed the result into the breaker.
    pub fn on_position_closed(&mut self, pnl: f64, now: DateTime<Utc>) {
        self.position = None;
        if pnl < 0.0 {
            self.risk.record_loss(now);
            info!(
                pnl,
                consecutive_losses = self.risk.consecutive_losses(),
                "losing close recorded"
            );
        } else {
            self.risk.record_win();
            info!(pnl, "winning close recorded, loss streak reset");
        }
    }

    /// Manual circuit-breaker reset.
    pub fn rearm_breaker(&mut self) {
        self.risk.rearm();
        info!("circuit breaker manually re-armed");
    }
}
