//! The live polling loop: fetch candles, drive the engine, dispatch intents.
//!
//! One cycle per candle interval. Recoverable failures (network, rate
//! limits, feed gaps) are logged and the loop continues; only retry
//! exhaustion or an unrecoverable feed/account error returns to the
//! supervising process, which owns the restart decision. The loop itself
//! never terminates the process.

use crate::state;
use anyhow::Result;
use breachbot_core::account::{AccountError, AccountProvider, AccountView};
use breachbot_core::dispatch::{DispatchError, Dispatcher, ExecutionClient};
use breachbot_core::domain::{Candle, OrderResult, WindowError};
use breachbot_core::engine::Engine;
use breachbot_core::feed::{CandleFeed, FeedError};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Extra candles fetched beyond the indicator minimum, so a cycle that
/// lands two intervals late still sees every candle it missed.
const FETCH_SLACK: usize = 5;

/// Wall clock and sleeper, injectable so tests run without real time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Production clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// What one cycle accomplished.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub candles_processed: usize,
    pub orders_placed: usize,
}

/// Cycle failure, split by whether the loop may continue.
#[derive(Debug)]
pub enum CycleError {
    /// Logged and retried on the next cycle.
    Transient(String),
    /// Propagated to the supervisor.
    Fatal(anyhow::Error),
}

fn feed_error(err: FeedError) -> CycleError {
    if err.is_transient() {
        CycleError::Transient(err.to_string())
    } else {
        CycleError::Fatal(err.into())
    }
}

fn account_error(err: AccountError) -> CycleError {
    match err {
        AccountError::NetworkUnreachable(_) => CycleError::Transient(err.to_string()),
        AccountError::Other(_) => CycleError::Fatal(err.into()),
    }
}

/// Drives one engine against the exchange collaborators.
pub struct TradingLoop<'a> {
    engine: Engine,
    feed: &'a dyn CandleFeed,
    account: &'a dyn AccountProvider,
    dispatcher: Dispatcher<'a>,
    clock: &'a dyn Clock,
    /// Where breaker state is persisted; `None` disables persistence.
    state_path: Option<PathBuf>,
    last_processed: Option<DateTime<Utc>>,
    /// Balance at entry, for PnL attribution when the position closes.
    entry_balance: Option<f64>,
    /// Set once an exchange position with no local record has been logged.
    reported_unmanaged: bool,
}

impl<'a> TradingLoop<'a> {
    pub fn new(
        engine: Engine,
        feed: &'a dyn CandleFeed,
        account: &'a dyn AccountProvider,
        client: &'a dyn ExecutionClient,
        clock: &'a dyn Clock,
        state_path: Option<PathBuf>,
    ) -> Self {
        let dispatcher = Dispatcher::new(client, engine.config());
        Self {
            engine,
            feed,
            account,
            dispatcher,
            clock,
            state_path,
            last_processed: None,
            entry_balance: None,
            reported_unmanaged: false,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run until a fatal error. Never exits the process.
    pub fn run(&mut self) -> Result<()> {
        let interval = Duration::from_secs(self.engine.config().timeframe.interval_secs());
        let retry_delay = Duration::from_millis(self.engine.config().backoff_base_ms);
        info!(
            symbol = %self.engine.config().symbol,
            timeframe = %self.engine.config().timeframe,
            "trading loop started"
        );
        loop {
            match self.run_cycle() {
                Ok(report) => {
                    debug!(
                        candles = report.candles_processed,
                        orders = report.orders_placed,
                        "cycle complete"
                    );
                    self.clock.sleep(interval);
                }
                Err(CycleError::Transient(message)) => {
                    warn!(%message, "recoverable cycle failure, retrying next cycle");
                    self.clock.sleep(retry_delay);
                }
                Err(CycleError::Fatal(err)) => {
                    error!(error = %err, "unrecoverable failure, surfacing to supervisor");
                    return Err(err);
                }
            }
        }
    }

    /// One fetch-process-dispatch pass.
    pub fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let account = self.account.account().map_err(account_error)?;
        self.reconcile_position(&account);

        let config = self.engine.config();
        let limit = self.engine.required_history() + FETCH_SLACK;
        let candles = self
            .feed
            .fetch(&config.symbol, config.timeframe, limit)
            .map_err(feed_error)?;

        let mut report = CycleReport::default();
        if candles.is_empty() {
            warn!("feed returned no candles");
            return Ok(report);
        }

        if self.last_processed.is_none() {
            self.seed_from(&candles)?;
        }

        let last = self.last_processed.expect("seeded above");
        let fresh: Vec<Candle> = candles
            .iter()
            .filter(|c| c.timestamp > last)
            .cloned()
            .collect();

        for candle in fresh {
            match self.engine.process_candle(candle.clone(), &account) {
                Ok(candle_report) => {
                    self.last_processed = Some(candle.timestamp);
                    report.candles_processed += 1;
                    if let Some(reason) = &candle_report.skipped {
                        info!(%reason, "entry not taken");
                    }
                    if let Some(intent) = candle_report.intent {
                        self.dispatch(&intent, &account, &mut report)?;
                    }
                }
                Err(err) => match err.window {
                    WindowError::FeedGap { expected, got } => {
                        if let Some(reason) = err.discarded {
                            info!(%reason, "entry not taken");
                        }
                        warn!(%expected, %got, "feed gap detected, reseeding history");
                        self.seed_from(&candles)?;
                        break;
                    }
                    // Duplicate/out-of-order from the feed: resync next
                    // cycle rather than poisoning the window.
                    other => return Err(CycleError::Transient(other.to_string())),
                },
            }
        }

        Ok(report)
    }

    /// Reseed the engine from a fetched snapshot, leaving the newest candle
    /// unprocessed so the normal pipeline handles it.
    ///
    /// Only the longest contiguous run ending at the newest candle is used;
    /// indicators never span a gap, and a hole earlier in the snapshot must
    /// not poison the reseed.
    fn seed_from(&mut self, candles: &[Candle]) -> Result<(), CycleError> {
        let interval = self.engine.config().timeframe.interval();
        let mut start = candles.len() - 1;
        while start > 0 && candles[start].timestamp - candles[start - 1].timestamp == interval {
            start -= 1;
        }
        let suffix = &candles[start..];

        // Hold the newest candle back so the normal pipeline handles it;
        // with a single candle there is nothing to hold back.
        let split = if suffix.len() > 1 { suffix.len() - 1 } else { 1 };
        let (seed, _) = suffix.split_at(split);
        self.engine
            .seed_history(seed)
            .map_err(|err| CycleError::Transient(format!("reseed failed: {err}")))?;
        self.last_processed = seed.last().map(|c| c.timestamp);
        Ok(())
    }

    fn dispatch(
        &mut self,
        intent: &breachbot_core::domain::OrderIntent,
        account: &AccountView,
        report: &mut CycleReport,
    ) -> Result<(), CycleError> {
        match self.dispatcher.dispatch(intent) {
            Ok(OrderResult::Accepted { exchange_order_id }) => {
                info!(
                    %exchange_order_id,
                    direction = ?intent.direction,
                    size = intent.size,
                    "position opened"
                );
                self.engine.on_order_accepted(intent, self.clock.now());
                self.entry_balance = Some(account.balance);
                report.orders_placed += 1;
                Ok(())
            }
            Ok(OrderResult::Rejected { reason }) => {
                warn!(%reason, "exchange rejected the order, skipping trade");
                Ok(())
            }
            Err(err @ DispatchError::RetriesExhausted { .. }) => {
                Err(CycleError::Fatal(err.into()))
            }
        }
    }

    /// Detect a position closed by its stop or take-profit trigger.
    ///
    /// A position carried across a restart has no local record: its close
    /// cannot be attributed as win or loss and does not touch the breaker.
    /// The persisted risk state already carries the streak up to that trade.
    fn reconcile_position(&mut self, account: &AccountView) {
        if self.engine.position().is_none() {
            if account.has_open_position() {
                if !self.reported_unmanaged {
                    warn!(
                        positions = account.open_positions,
                        "exchange reports a position with no local record; \
                         its close will not feed the breaker"
                    );
                    self.reported_unmanaged = true;
                }
            } else {
                self.reported_unmanaged = false;
            }
            return;
        }
        if !account.has_open_position() {
            let pnl = self
                .entry_balance
                .map(|entry| account.balance - entry)
                .unwrap_or(0.0);
            info!(pnl, "position closed on exchange");
            self.engine.on_position_closed(pnl, self.clock.now());
            self.entry_balance = None;
            if let Some(path) = &self.state_path {
                if let Err(err) = state::save(path, self.engine.risk_state()) {
                    warn!(error = %err, "failed to persist risk state");
                }
            }
        }
    }
}
