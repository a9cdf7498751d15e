//! Order dispatch: submission, bounded retry with backoff, rate budget.
//!
//! Transient failures (network, rate limiting) are retried with exponential
//! backoff and full jitter, up to a bounded attempt count. Exchange-side
//! rejections are terminal and surface immediately. Every attempt for one
//! intent reuses the same idempotency token, so a retry after an ambiguous
//! failure cannot open a second position.

use crate::config::EngineConfig;
use crate::domain::{ExchangeOrderId, OrderIntent, OrderRequest, OrderResult};
use rand::Rng;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Submission failure as reported by the execution collaborator.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Rate limiting, timeouts, connection resets. Retried with backoff.
    #[error("transient execution error: {0}")]
    Transient(String),

    /// Invalid size, insufficient margin, bad parameters. Never retried.
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Dispatch failure after local recovery is exhausted.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Execution collaborator: accepts an order request with its idempotency
/// token, returns the exchange order id on acceptance.
pub trait ExecutionClient {
    fn submit(&self, request: &OrderRequest) -> Result<ExchangeOrderId, SubmitError>;
}

/// Sliding-window request budget (default 20 requests per 2 seconds).
///
/// An exhausted budget blocks until the window rolls — running over budget
/// is a transient condition, never a fatal one.
#[derive(Debug)]
pub struct RateBudget {
    capacity: usize,
    window: Duration,
    stamps: VecDeque<Instant>,
}

impl RateBudget {
    pub fn new(capacity: usize, window: Duration) -> Self {
        assert!(capacity >= 1, "rate budget capacity must be >= 1");
        Self {
            capacity,
            window,
            stamps: VecDeque::with_capacity(capacity),
        }
    }

    /// The exchange budget: 20 requests per 2 seconds.
    pub fn exchange_default() -> Self {
        Self::new(20, Duration::from_secs(2))
    }

    /// Take one request slot, sleeping until one frees up if necessary.
    pub fn acquire(&mut self) {
        let now = Instant::now();
        while let Some(front) = self.stamps.front() {
            if now.duration_since(*front) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
        if self.stamps.len() >= self.capacity {
            let oldest = *self.stamps.front().expect("budget full but empty");
            let wait = self.window.saturating_sub(oldest.elapsed());
            if !wait.is_zero() {
                warn!(wait_ms = wait.as_millis() as u64, "rate budget exhausted, waiting");
                std::thread::sleep(wait);
            }
            self.stamps.pop_front();
        }
        self.stamps.push_back(Instant::now());
    }
}

/// Submits risk-approved intents to the execution collaborator.
///
/// Rate-budget and backoff waits block the calling thread; the attempt
/// bound in [`EngineConfig::validate`](crate::config::EngineConfig::validate)
/// keeps the cumulative wait short of a candle interval.
pub struct Dispatcher<'a> {
    client: &'a dyn ExecutionClient,
    budget: RateBudget,
    max_attempts: u32,
    backoff_base: Duration,
}

/// Backoff delays never exceed this cap, regardless of attempt count.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

impl<'a> Dispatcher<'a> {
    pub fn new(client: &'a dyn ExecutionClient, config: &EngineConfig) -> Self {
        Self {
            client,
            budget: RateBudget::exchange_default(),
            max_attempts: config.max_attempts,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Replace the rate budget (tests use a smaller window).
    pub fn with_budget(mut self, budget: RateBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Submit an intent, retrying transient failures.
    ///
    /// Ok carries a terminal [`OrderResult`] (accepted or rejected); Err
    /// means every attempt failed transiently and the caller decides what
    /// to surface to the supervisor.
    pub fn dispatch(&mut self, intent: &OrderIntent) -> Result<OrderResult, DispatchError> {
        let request = intent.to_request();
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            self.budget.acquire();
            match self.client.submit(&request) {
                Ok(exchange_order_id) => {
                    info!(
                        client_order_id = %request.client_order_id,
                        exchange_order_id = %exchange_order_id,
                        attempt,
                        "order accepted"
                    );
                    return Ok(OrderResult::Accepted { exchange_order_id });
                }
                Err(SubmitError::Rejected(reason)) => {
                    warn!(
                        client_order_id = %request.client_order_id,
                        %reason,
                        "order rejected, not retrying"
                    );
                    return Ok(OrderResult::Rejected { reason });
                }
                Err(SubmitError::Transient(message)) => {
                    last_error = message;
                    if attempt < self.max_attempts {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            client_order_id = %request.client_order_id,
                            attempt,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %last_error,
                            "transient submit failure, backing off"
                        );
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        Err(DispatchError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    /// Exponential backoff with full jitter: uniform in [0, base * 2^(n-1)].
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = (attempt - 1).min(16);
        let ceiling = self
            .backoff_base
            .saturating_mul(1u32 << shift)
            .min(MAX_BACKOFF);
        let millis = ceiling.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientOrderId, Direction, MarginMode};
    use chrono::TimeZone;
    use std::cell::RefCell;

    fn sample_intent() -> OrderIntent {
        OrderIntent {
            symbol: "XRP-USDT".into(),
            direction: Direction::Long,
            size: 0.01,
            entry_price: 30_000.0,
            stop_loss: 29_700.0,
            take_profit: 30_900.0,
            leverage: 3,
            margin_mode: MarginMode::Isolated,
            signal_timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
        }
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            max_attempts: 3,
            backoff_base_ms: 1,
            ..Default::default()
        }
    }

    /// Scripted client: pops one outcome per submit, records tokens.
    struct ScriptedClient {
        outcomes: RefCell<VecDeque<Result<ExchangeOrderId, SubmitError>>>,
        tokens: RefCell<Vec<ClientOrderId>>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<Result<ExchangeOrderId, SubmitError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                tokens: RefCell::new(Vec::new()),
            }
        }
    }

    impl ExecutionClient for ScriptedClient {
        fn submit(&self, request: &OrderRequest) -> Result<ExchangeOrderId, SubmitError> {
            self.tokens.borrow_mut().push(request.client_order_id.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .expect("client called more times than scripted")
        }
    }

    #[test]
    fn accepted_on_first_attempt() {
        let client = ScriptedClient::new(vec![Ok(ExchangeOrderId("ord-1".into()))]);
        let config = fast_config();
        let mut dispatcher = Dispatcher::new(&client, &config);
        let result = dispatcher.dispatch(&sample_intent()).unwrap();
        assert!(result.is_accepted());
        assert_eq!(client.tokens.borrow().len(), 1);
    }

    #[test]
    fn transient_failure_is_retried_with_same_token() {
        let client = ScriptedClient::new(vec![
            Err(SubmitError::Transient("rate limited".into())),
            Ok(ExchangeOrderId("ord-2".into())),
        ]);
        let config = fast_config();
        let mut dispatcher = Dispatcher::new(&client, &config);
        let result = dispatcher.dispatch(&sample_intent()).unwrap();
        assert!(result.is_accepted());

        let tokens = client.tokens.borrow();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], tokens[1]);
    }

    #[test]
    fn rejection_is_terminal_and_not_retried() {
        let client = ScriptedClient::new(vec![Err(SubmitError::Rejected(
            "insufficient margin".into(),
        ))]);
        let config = fast_config();
        let mut dispatcher = Dispatcher::new(&client, &config);
        let result = dispatcher.dispatch(&sample_intent()).unwrap();
        assert_eq!(
            result,
            OrderResult::Rejected {
                reason: "insufficient margin".into()
            }
        );
        assert_eq!(client.tokens.borrow().len(), 1);
    }

    #[test]
    fn retries_are_bounded() {
        let client = ScriptedClient::new(vec![
            Err(SubmitError::Transient("timeout".into())),
            Err(SubmitError::Transient("timeout".into())),
            Err(SubmitError::Transient("timeout".into())),
        ]);
        let config = fast_config();
        let mut dispatcher = Dispatcher::new(&client, &config);
        let err = dispatcher.dispatch(&sample_intent()).unwrap_err();
        match err {
            DispatchError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "timeout");
            }
        }
        assert_eq!(client.tokens.borrow().len(), 3);
    }

    #[test]
    fn rate_budget_blocks_when_window_is_full() {
        let mut budget = RateBudget::new(2, Duration::from_millis(50));
        let start = Instant::now();
        budget.acquire();
        budget.acquire();
        budget.acquire(); // must wait for the first slot to expire
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn rate_budget_frees_slots_after_window() {
        let mut budget = RateBudget::new(2, Duration::from_millis(10));
        budget.acquire();
        budget.acquire();
        std::thread::sleep(Duration::from_millis(15));
        let start = Instant::now();
        budget.acquire(); // both slots have expired, no wait
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn backoff_delay_respects_ceiling() {
        let client = ScriptedClient::new(vec![]);
        let config = EngineConfig {
            backoff_base_ms: 100,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(&client, &config);
        for attempt in 1..=10 {
            let delay = dispatcher.backoff_delay(attempt);
            let ceiling = Duration::from_millis(100).saturating_mul(1 << (attempt - 1));
            assert!(delay <= ceiling.min(MAX_BACKOFF));
        }
    }
}
