//! Query execution instrumentation
//!
//! Wraps a connection so metadata queries can be echoed for diagnostics,
//! short-circuited in dry-run mode, or bounded by a per-query timeout.
//! Cancellation works by dropping the in-flight call, which releases its
//! cursor on the timeout path exactly as on the success path.

use crate::db::{Connection, ExecResult, Rows, Value};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default)]
pub struct InstrumentOpts {
    /// Log query text and bound parameters before running.
    pub echo: bool,
    /// Never touch the backend; every query fails with `NoRows`.
    pub dry_run: bool,
    /// Upper bound for a single call.
    pub timeout: Option<Duration>,
}

/// A connection wrapper applying [`InstrumentOpts`] to every call. Shares
/// the underlying connection, so the same session can serve instrumented
/// metadata queries and plain statement execution.
pub struct InstrumentedConn {
    inner: Arc<dyn Connection>,
    opts: InstrumentOpts,
}

impl InstrumentedConn {
    pub fn new(inner: Arc<dyn Connection>, opts: InstrumentOpts) -> Self {
        Self { inner, opts }
    }
}

#[async_trait]
impl Connection for InstrumentedConn {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        if self.opts.echo {
            debug!(target: "sqlsh::db", query = sql, params = ?params, "executing query");
        }
        if self.opts.dry_run {
            return Err(Error::NoRows);
        }
        match self.opts.timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.query(sql, params))
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.inner.query(sql, params).await,
        }
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        if self.opts.echo {
            debug!(target: "sqlsh::db", query = sql, params = ?params, "executing statement");
        }
        if self.opts.dry_run {
            return Err(Error::NoRows);
        }
        match self.opts.timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.exec(sql, params))
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.inner.exec(sql, params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemConn;

    /// A connection that takes `delay` to answer anything.
    struct SlowConn {
        delay: Duration,
    }

    #[async_trait]
    impl Connection for SlowConn {
        async fn query(&self, _sql: &str, _params: &[Value]) -> Result<Rows> {
            tokio::time::sleep(self.delay).await;
            Ok(Rows::empty())
        }

        async fn exec(&self, _sql: &str, _params: &[Value]) -> Result<ExecResult> {
            tokio::time::sleep(self.delay).await;
            Ok(ExecResult {
                rows_affected: 0,
                elapsed: self.delay,
            })
        }
    }

    #[tokio::test]
    async fn dry_run_always_fails_with_no_rows() {
        let conn = InstrumentedConn::new(
            Arc::new(MemConn::with_sample_catalog()),
            InstrumentOpts {
                dry_run: true,
                ..Default::default()
            },
        );
        assert!(matches!(conn.query("SELECT 1", &[]).await, Err(Error::NoRows)));
        assert!(matches!(conn.exec("DELETE", &[]).await, Err(Error::NoRows)));
    }

    #[tokio::test]
    async fn timeout_cancels_slow_queries() {
        let conn = InstrumentedConn::new(
            Arc::new(SlowConn {
                delay: Duration::from_secs(5),
            }),
            InstrumentOpts {
                timeout: Some(Duration::from_millis(20)),
                ..Default::default()
            },
        );
        assert!(matches!(
            conn.query("SELECT 1", &[]).await,
            Err(Error::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn fast_queries_pass_through() {
        let conn = InstrumentedConn::new(
            Arc::new(MemConn::with_sample_catalog()),
            InstrumentOpts {
                timeout: Some(Duration::from_secs(1)),
                ..Default::default()
            },
        );
        assert!(conn.query("SELECT version()", &[]).await.is_ok());
    }
}
