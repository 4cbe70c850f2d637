// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connection retry with exponential backoff.
//!
//! Only opening a connection is retried. Stored procedure calls run once.
//! The delay doubles after each failed attempt, `initial_delay * 2^attempt`,
//! capped at `max_delay`.

use std::time::Duration;

use tracing::{debug, warn};

use super::{DataHubConnection, DataHubConnector, StorageError, StorageResult};

/// How often and how patiently to retry opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to wait after the given zero-based failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Open a connection, retrying transient failures per `policy`.
///
/// Non-transient errors are returned immediately. After the last attempt the
/// final error is returned.
pub async fn connect_with_retry(
    connector: &dyn DataHubConnector,
    policy: &RetryPolicy,
) -> StorageResult<Box<dyn DataHubConnection>> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error: Option<StorageError> = None;

    for attempt in 0..attempts {
        match connector.connect().await {
            Ok(connection) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "connected after retry");
                }
                return Ok(connection);
            }
            Err(err) if err.is_transient() && attempt + 1 < attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "datahub-connection-error: retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                last_error = Some(err);
            }
            Err(err) => {
                warn!(
                    attempt = attempt + 1,
                    error = %err,
                    "datahub-connection-error: giving up"
                );
                return Err(err);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| StorageError::Connection("no connection attempt was made".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDataHub;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let store = InMemoryDataHub::new();
        store.fail_next_connects(2);

        let connection = connect_with_retry(&store, &fast(3)).await;
        assert!(connection.is_ok());
        assert_eq!(store.connect_attempts(), 3);
        assert_eq!(store.opened(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let store = InMemoryDataHub::new();
        store.fail_next_connects(5);

        let result = connect_with_retry(&store, &fast(3)).await;
        assert!(matches!(result, Err(StorageError::Connection(_))));
        assert_eq!(store.connect_attempts(), 3);
        assert_eq!(store.opened(), 0);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let store = InMemoryDataHub::new();
        assert!(connect_with_retry(&store, &fast(0)).await.is_ok());
        assert_eq!(store.connect_attempts(), 1);
    }
}
