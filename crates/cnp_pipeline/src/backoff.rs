use std::time::Duration;

use cnp_core::config::PipelineConfig;
use cnp_core::{PublishError, PublishReceipt};
use rand::Rng;

/// Exponential backoff with additive jitter: `base * 2^attempt + uniform(0, max_jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_backoff(),
            max_jitter: config.max_jitter(),
        }
    }

    /// Smallest delay the policy may return for `attempt` (zero-based).
    pub fn lower_bound(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1_u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    pub fn delay_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        self.lower_bound(attempt).saturating_add(jitter.min(self.max_jitter))
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        self.delay_with_jitter(attempt, jitter)
    }

    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Lifecycle of one payload's publish attempts. `attempt` counts from zero.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishState {
    Pending,
    Publishing { attempt: u32 },
    Retrying { attempt: u32, delay: Duration, error: PublishError },
    Published { receipt: PublishReceipt, attempts: u32 },
    Abandoned { reason: String, attempts: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishEvent {
    Start,
    Succeeded(PublishReceipt),
    Failed(PublishError),
    BackoffElapsed,
    Cancelled,
}

impl PublishState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishState::Published { .. } | PublishState::Abandoned { .. })
    }

    /// Apply one event. Events that make no sense in the current state leave it
    /// unchanged.
    pub fn on(self, event: PublishEvent, policy: &BackoffPolicy) -> PublishState {
        match (self, event) {
            (PublishState::Pending, PublishEvent::Start) => PublishState::Publishing { attempt: 0 },
            (PublishState::Pending, PublishEvent::Cancelled) => PublishState::Abandoned {
                reason: "cancelled before publishing".to_string(),
                attempts: 0,
            },
            (PublishState::Publishing { attempt }, PublishEvent::Succeeded(receipt)) => PublishState::Published {
                receipt,
                attempts: attempt + 1,
            },
            (PublishState::Publishing { attempt }, PublishEvent::Failed(error)) => {
                if !error.is_retryable() {
                    PublishState::Abandoned {
                        reason: error.to_string(),
                        attempts: attempt + 1,
                    }
                } else if !policy.can_retry(attempt) {
                    PublishState::Abandoned {
                        reason: format!("retries exhausted: {}", error),
                        attempts: attempt + 1,
                    }
                } else {
                    PublishState::Retrying {
                        attempt,
                        delay: policy.delay_for(attempt),
                        error,
                    }
                }
            }
            (PublishState::Retrying { attempt, .. }, PublishEvent::BackoffElapsed) => {
                PublishState::Publishing { attempt: attempt + 1 }
            }
            (PublishState::Retrying { attempt, .. }, PublishEvent::Cancelled) => PublishState::Abandoned {
                reason: "cancelled during backoff".to_string(),
                attempts: attempt + 1,
            },
            (state, _) => state,
        }
    }
}
