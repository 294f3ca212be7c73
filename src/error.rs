//! Crate-wide error taxonomy
//!
//! Lexer errors abort the current scan and are handed back to the caller;
//! metadata capability errors (`NotSupported`, `Timeout`, `NoRows`) are
//! recoverable and converted into "no contribution from this source" at the
//! call site; backend errors carry the driver's own code/message and are
//! always surfaced.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// End of the input stream reached while the lexer wanted more.
    /// Not a malformed statement by itself; callers inspect buffer state.
    #[error("end of input")]
    Eof,

    #[error("unterminated quoted string")]
    UnterminatedQuoted,

    #[error("invalid quoted string: {0}")]
    InvalidQuoted(&'static str),

    /// A metadata capability the composed reader does not provide.
    #[error("{0} not supported")]
    NotSupported(&'static str),

    /// A backend failure, normalized through the driver's `err` mapping.
    #[error("{driver}: {code}: {message}")]
    Backend {
        driver: String,
        code: String,
        message: String,
    },

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// Produced by dry-run query execution and by empty describe targets.
    #[error("no rows")]
    NoRows,

    /// Result-set accessor called before the first advance or after
    /// exhaustion.
    #[error("result set cursor is not positioned on a row")]
    Cursor,

    #[error("unknown command: \\{0}")]
    UnknownCommand(String),

    #[error("missing required argument to \\{0}")]
    MissingArg(&'static str),

    #[error("invalid connection string: {0}")]
    InvalidDsn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl Error {
    /// True for failures completion and describe writers treat as
    /// "this source contributes nothing" rather than a hard error.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Error::NotSupported(_) | Error::Timeout(_) | Error::NoRows
        )
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }
}
