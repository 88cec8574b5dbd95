//! Ordered fallback-strategy executor.
//!
//! Externally-hosted content is unreliable: rate limits, geo-blocks,
//! transient scrape breakage. Rather than duplicating try/log/continue at
//! every call site, callers build a [`StrategyChain`] of alternative
//! implementations of one operation and run them in priority order until
//! one succeeds or all are exhausted.

use crate::error::{DubError, Result};
use async_trait::async_trait;
use std::fmt;

/// Outcome of a single strategy attempt.
#[derive(Debug)]
pub enum StrategyOutcome<T> {
    /// The strategy produced a usable payload.
    Success(T),
    /// A precondition was not met (missing credential, unsupported source).
    /// Recorded in diagnostics but does not count as a tried failure.
    Skip(String),
    /// The strategy ran and failed.
    Failure(String),
}

/// One alternative implementation of the chain's operation.
#[async_trait]
pub trait Strategy<T>: Send + Sync {
    /// Short label used in progress messages and diagnostics.
    fn label(&self) -> &str;

    /// Performs the operation once. Retry-with-backoff, if wanted, belongs
    /// inside the strategy, never in the chain.
    async fn attempt(&self) -> StrategyOutcome<T>;
}

/// Aggregate failure after every strategy was skipped or failed.
///
/// Carries every recorded reason in attempt order; this is the caller's
/// diagnostic surface, so nothing is dropped.
#[derive(Debug)]
pub struct ChainExhausted {
    /// Name of the logical operation the chain was performing.
    pub operation: String,
    /// `"{label}: {reason}"` entries, in attempt order.
    pub reasons: Vec<String>,
}

impl fmt::Display for ChainExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "All {} strategies failed: {}",
            self.operation,
            self.reasons.join("; ")
        )
    }
}

impl From<ChainExhausted> for DubError {
    fn from(e: ChainExhausted) -> Self {
        DubError::Acquisition {
            message: e.to_string(),
        }
    }
}

/// Callback invoked as each strategy starts, with its label. Used to
/// surface "trying X..." progress to the job record.
pub type AttemptObserver = Box<dyn Fn(&str) + Send + Sync>;

/// Ordered list of strategies for one logical operation.
pub struct StrategyChain<T> {
    operation: String,
    strategies: Vec<Box<dyn Strategy<T>>>,
    on_attempt: Option<AttemptObserver>,
    reset: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<T> StrategyChain<T> {
    /// Creates an empty chain for the named operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            strategies: Vec::new(),
            on_attempt: None,
            reset: None,
        }
    }

    /// Appends a strategy to the end of the chain.
    pub fn push(mut self, strategy: Box<dyn Strategy<T>>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Sets an observer called with each strategy's label before it runs.
    pub fn with_observer(mut self, observer: AttemptObserver) -> Self {
        self.on_attempt = Some(observer);
        self
    }

    /// Sets a reset hook run after each *failed* attempt, before the next
    /// strategy runs. A failed strategy must leave no partial artifacts
    /// that could be mistaken for the next strategy's output; the hook is
    /// where the caller clears them (e.g. deleting partially-written
    /// files). Not run after `Skip` — a skipped strategy never started.
    pub fn with_reset(mut self, reset: Box<dyn Fn() + Send + Sync>) -> Self {
        self.reset = Some(reset);
        self
    }

    /// Number of strategies in the chain.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// True when no strategies were added.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Runs strategies in order until one succeeds.
    ///
    /// Returns the first success's payload together with the winning
    /// strategy's label. On exhaustion, returns a [`ChainExhausted`] whose
    /// reasons list every skip and failure in order. No strategy is ever
    /// retried within one run.
    pub async fn run(&self) -> std::result::Result<(T, String), ChainExhausted> {
        let mut reasons = Vec::new();

        for strategy in &self.strategies {
            if let Some(observer) = &self.on_attempt {
                observer(strategy.label());
            }

            match strategy.attempt().await {
                StrategyOutcome::Success(payload) => {
                    return Ok((payload, strategy.label().to_string()));
                }
                StrategyOutcome::Skip(reason) => {
                    reasons.push(format!("{}: {}", strategy.label(), reason));
                }
                StrategyOutcome::Failure(reason) => {
                    reasons.push(format!("{}: {}", strategy.label(), reason));
                    if let Some(reset) = &self.reset {
                        reset();
                    }
                }
            }
        }

        Err(ChainExhausted {
            operation: self.operation.clone(),
            reasons,
        })
    }

    /// Like [`run`](Self::run), but maps exhaustion into a `DubError`.
    pub async fn run_or_err(&self) -> Result<(T, String)> {
        self.run().await.map_err(Into::into)
    }
}
