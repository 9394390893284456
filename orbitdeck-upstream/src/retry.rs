//! Fixed-delay retry policy.

use orbitdeck_core::{UpstreamErrorCode, UpstreamFailure};
use std::time::Duration;

/// How many times a call is attempted and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Single attempt.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }

    /// Policy for the internal telemetry service: 3 attempts, 100 ms apart.
    pub const fn telemetry() -> Self {
        Self::fixed(3, Duration::from_millis(100))
    }

    /// Timeouts, transport errors and 5xx answers are worth another try.
    /// A 4xx or an unparsable body will not change on retry.
    pub fn should_retry(&self, failure: &UpstreamFailure) -> bool {
        match failure.code {
            UpstreamErrorCode::Timeout => true,
            UpstreamErrorCode::UpstreamError => failure.status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
