//! Database driver abstraction
//!
//! Defines the interface that all database backends must implement. The
//! core never assumes more of a backend than what is declared here.

use crate::db::{ExecResult, Rows, Value};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// An open backend session.
///
/// All methods are async because callers live in a tokio runtime;
/// synchronous client libraries should bridge with `spawn_blocking`
/// internally. A connection is used by a single caller at a time;
/// independent connections share nothing and may run concurrently.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a query and return its rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Rows>;

    /// Run a statement that returns no rows.
    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult>;
}

/// A backend driver: knows how to open connections for its URL scheme and
/// how to normalize its client library's failures.
#[async_trait]
pub trait Driver: Send + Sync {
    /// URL scheme this driver answers to (`postgres`, `mysql`, `mem`, ...).
    fn name(&self) -> &'static str;

    /// Open a connection for a `scheme:...` connection URL.
    async fn open(&self, url: &str) -> Result<Box<dyn Connection>>;

    /// Map a failure into the backend's own (code, message) pair.
    fn err(&self, err: &Error) -> (String, String) {
        match err {
            Error::Backend { code, message, .. } => (code.clone(), message.clone()),
            other => (String::new(), other.to_string()),
        }
    }

    /// Whether the failure indicates a bad password (drivers that can tell
    /// let the shell re-prompt instead of giving up).
    fn is_password_err(&self, _err: &Error) -> bool {
        false
    }

    /// Human-readable server version.
    async fn version(&self, conn: &dyn Connection) -> Result<String> {
        let mut rows = conn.query("SELECT version()", &[]).await?;
        match rows.next_row().and_then(|r| r.into_iter().next()) {
            Some(v) => Ok(v.text()),
            None => Err(Error::NoRows),
        }
    }

    /// Name of the connected user, for backends that can report it.
    async fn user(&self, conn: &dyn Connection) -> Result<String> {
        let mut rows = conn.query("SELECT current_user", &[]).await?;
        match rows.next_row().and_then(|r| r.into_iter().next()) {
            Some(v) => Ok(v.text()),
            None => Err(Error::NoRows),
        }
    }

    /// Change the connected user's password, where the backend supports it.
    async fn change_password(
        &self,
        _conn: &dyn Connection,
        _user: &str,
        _new_password: &str,
    ) -> Result<()> {
        Err(Error::NotSupported("password change"))
    }
}

/// Wrap a backend failure with the driver's normalized name and code.
pub fn backend_err(driver: &str, code: impl Into<String>, message: impl Into<String>) -> Error {
    Error::Backend {
        driver: driver.to_string(),
        code: code.into(),
        message: message.into(),
    }
}

/// The set of installed drivers, looked up by URL scheme.
#[derive(Default)]
pub struct Registry {
    drivers: Vec<Arc<dyn Driver>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.drivers.push(driver);
    }

    /// Open `url`, routing on its scheme.
    pub async fn open(&self, url: &str) -> Result<(Arc<dyn Driver>, Box<dyn Connection>)> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| Error::InvalidDsn(format!("missing scheme in {url:?}")))?;

        let driver = self
            .drivers
            .iter()
            .find(|d| d.name() == scheme)
            .cloned()
            .ok_or_else(|| Error::InvalidDsn(format!("no driver for scheme {scheme:?}")))?;

        let conn = driver.open(url).await?;
        Ok((driver, conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemDriver;

    #[tokio::test]
    async fn registry_routes_on_scheme() {
        let mut registry = Registry::new();
        registry.register(Arc::new(MemDriver));

        assert!(registry.open("mem:").await.is_ok());
        assert!(matches!(
            registry.open("nope:foo").await,
            Err(Error::InvalidDsn(_))
        ));
        assert!(matches!(
            registry.open("not-a-url").await,
            Err(Error::InvalidDsn(_))
        ));
    }
}
