// db/db.rs
use std::future::Future;
use std::time::Duration;

use sqlx::{Pool, Postgres};

use super::{error::StoreError, query_timeout::QueryTimeout};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
    query_timeout: Duration,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl DBClient {
    /// Create a new DBClient using the default per-call timeout
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient {
            pool,
            query_timeout: QueryTimeout::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Runs one store call (a single query or a whole transaction) under the client's timeout.
    pub(crate) async fn timed<F, T, E>(&self, query_fn: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<StoreError>,
    {
        QueryTimeout::execute_with_timeout(query_fn, self.query_timeout).await
    }
}
