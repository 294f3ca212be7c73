//! rustyline glue for the completion engine

use crate::complete::Completer;
use rustyline::completion::{Completer as LineCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct ShellHelper {
    completer: Arc<Completer>,
    runtime: Handle,
}

impl ShellHelper {
    pub fn new(completer: Arc<Completer>, runtime: Handle) -> Self {
        Self { completer, runtime }
    }
}

impl LineCompleter for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, candidates) = self.runtime.block_on(self.completer.complete(line, pos));

        let pairs = candidates
            .into_iter()
            .map(|c| {
                let display = match &c.detail {
                    Some(detail) => format!("{} [{}] {}", c.text, c.kind.label(), detail),
                    None => format!("{} [{}]", c.text, c.kind.label()),
                };
                Pair {
                    display,
                    replacement: c.text,
                }
            })
            .collect();

        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}
