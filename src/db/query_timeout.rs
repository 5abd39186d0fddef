// Store call timeout protection
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::error::StoreError;

pub struct QueryTimeout;

impl QueryTimeout {
    /// Execute a store call with a timeout so a stalled connection cannot hold a request.
    /// When the timer fires the call's future is dropped, which rolls back any open transaction.
    pub async fn execute_with_timeout<F, T, E>(
        query_fn: F,
        timeout_duration: Duration,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<StoreError>,
    {
        match timeout(timeout_duration, query_fn).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(StoreError::Timeout(timeout_duration)),
        }
    }

    /// Default timeout for store calls (5 seconds)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_calls_become_timeouts() {
        let result: Result<(), StoreError> = QueryTimeout::execute_with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, sqlx::Error>(())
            },
            Duration::from_millis(10),
        )
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let result = QueryTimeout::execute_with_timeout(
            async { Ok::<_, sqlx::Error>(42) },
            QueryTimeout::DEFAULT_TIMEOUT,
        )
        .await;

        assert_eq!(result.ok(), Some(42));
    }
}
