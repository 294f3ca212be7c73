//! Cursor-style result sets for metadata records
//!
//! Ordered, single-pass-forward and restartable. Accessing the current
//! record before the first advance, or after exhaustion, is an error rather
//! than a panic. Not safe for concurrent iteration; a set has exactly one
//! owner.

use crate::error::{Error, Result};
use crate::meta::Record;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

pub struct ResultSet<T: Record> {
    rows: Vec<T>,
    /// None before the first advance; otherwise an index into `rows`.
    pos: Option<usize>,
    verbose: bool,
    predicate: Option<Predicate<T>>,
}

impl<T: Record> ResultSet<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            pos: None,
            verbose: false,
            predicate: None,
        }
    }

    /// Attach a row predicate; rows failing it are skipped by `advance`
    /// and excluded from `len`. Rewinds the cursor.
    pub fn with_predicate(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self.pos = None;
        self
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Column names reported for the current verbose mode.
    pub fn columns(&self) -> &'static [&'static str] {
        T::columns(self.verbose)
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        match &self.predicate {
            Some(p) => self.rows.iter().filter(|r| p(r)).count(),
            None => self.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move to the next visible row. Returns false once exhausted.
    pub fn advance(&mut self) -> bool {
        let mut next = self.pos.map_or(0, |p| p + 1);
        while next < self.rows.len() {
            let visible = self
                .predicate
                .as_ref()
                .map_or(true, |p| p(&self.rows[next]));
            if visible {
                self.pos = Some(next);
                return true;
            }
            next += 1;
        }
        self.pos = Some(self.rows.len());
        false
    }

    /// The row the cursor is on.
    pub fn current(&self) -> Result<&T> {
        match self.pos {
            Some(p) if p < self.rows.len() => Ok(&self.rows[p]),
            _ => Err(Error::Cursor),
        }
    }

    /// Rewind to before the first row.
    pub fn reset(&mut self) {
        self.pos = None;
    }

    /// Drain the remaining visible rows into a vector, cloning each.
    pub fn collect_remaining(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while self.advance() {
            if let Ok(row) = self.current() {
                out.push(row.clone());
            }
        }
        out
    }
}
