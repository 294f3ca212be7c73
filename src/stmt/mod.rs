//! Incremental statement lexer/buffer
//!
//! Consumes an unbounded stream of input chunks and produces, incrementally,
//! a statement text, an optional backslash command when a command boundary
//! is hit, and a ready flag once a statement terminator is reached. The
//! scanner tracks quote state (single, double, optional backtick and
//! `$tag$` dollar quoting), line and block comments, parenthesis balance and
//! inline `:name` variable interpolation, all of which survive across
//! chunks.
//!
//! Chunk granularity does not matter: pulled text is reassembled into lines
//! internally, and a trailing partial line is flushed when the source
//! signals end of stream. Appended lines are joined with `\n`, so the final
//! statement text is the same whether the input arrived whole, line by line
//! or character by character.

mod prefix;
mod var;

pub use prefix::MAX_PREFIX_WORDS;
pub use var::Variable;

use crate::config::LexerConfig;
use crate::error::{Error, Result};
use crate::quoting::{self, QuoteStyle, VarLookup};
use std::io;
use var::{is_name_char, is_name_start};

/// Longest accepted dollar-quote tag.
const MAX_DOLLAR_TAG: usize = 128;

/// Pull-based input source. Chunks are raw text of any granularity; a
/// line-oriented source (readline, file reader) must include the trailing
/// `\n` in each chunk. `Ok(None)` signals end of stream.
pub trait LineSource {
    fn next_chunk(&mut self) -> io::Result<Option<String>>;
}

impl<F> LineSource for F
where
    F: FnMut() -> io::Result<Option<String>>,
{
    fn next_chunk(&mut self) -> io::Result<Option<String>> {
        self()
    }
}

/// A parsed backslash command boundary: the command name and its raw,
/// still-quoted argument string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaCommand {
    pub name: String,
    pub args: String,
}

/// The statement buffer and its scanner.
///
/// Created empty; fed by successive [`StmtBuffer::next`] calls; cleared by
/// [`StmtBuffer::reset`] once the caller has consumed a ready statement or
/// a returned command.
pub struct StmtBuffer {
    src: Box<dyn LineSource>,
    opts: LexerConfig,

    // accumulated statement
    buf: Vec<char>,
    prefix: String,
    vars: Vec<Variable>,

    // scan state
    quote: Option<char>,
    dollar_tag: Option<String>,
    in_comment: bool,
    balance: usize,
    ready: bool,

    // unconsumed input
    pending: Vec<char>,
    rest: Vec<char>,
    pos: usize,
    fresh_line: bool,
}

impl StmtBuffer {
    pub fn new<S: LineSource + 'static>(src: S, opts: LexerConfig) -> Self {
        Self {
            src: Box::new(src),
            opts,
            buf: Vec::new(),
            prefix: String::new(),
            vars: Vec::new(),
            quote: None,
            dollar_tag: None,
            in_comment: false,
            balance: 0,
            ready: false,
            pending: Vec::new(),
            rest: Vec::new(),
            pos: 0,
            fresh_line: false,
        }
    }

    /// Accumulated statement text.
    pub fn text(&self) -> String {
        self.buf.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Upper-cased leading-keyword signature of the buffer.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Variable occurrences recorded on the most recently scanned line.
    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    /// True when the buffer ends at an unescaped, unquoted,
    /// balance-free `;`. Cleared by [`StmtBuffer::reset`] or by feeding
    /// further input.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// One-character state hint for continuation prompts.
    pub fn state(&self) -> &'static str {
        if self.in_comment {
            "*"
        } else if self.dollar_tag.is_some() {
            "$"
        } else if let Some(q) = self.quote {
            match q {
                '\'' => "'",
                '"' => "\"",
                _ => "`",
            }
        } else if self.balance > 0 {
            "("
        } else if self.buf.is_empty() {
            "="
        } else {
            "-"
        }
    }

    /// Clear the accumulated statement and all scan state. Unconsumed input
    /// is kept, so the remainder of a line holding several statements is
    /// still scanned by the following calls.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.prefix.clear();
        self.vars.clear();
        self.quote = None;
        self.dollar_tag = None;
        self.in_comment = false;
        self.balance = 0;
        self.ready = false;
    }

    /// Scan forward until a command boundary, a statement terminator or the
    /// end of the current line. Pulls more input only when everything
    /// previously pulled has been consumed; end of stream surfaces as
    /// [`Error::Eof`], and the caller distinguishes "no more input right
    /// now" from a malformed statement by inspecting buffer state.
    pub fn next(&mut self, vars: &dyn VarLookup) -> Result<Option<MetaCommand>> {
        if self.pos >= self.rest.len() {
            self.pull()?;
        }
        self.ready = false;

        let start = self.pos;
        let mut append_end = None;
        let mut command = None;

        while self.pos < self.rest.len() {
            let c = self.rest[self.pos];

            if self.in_comment {
                if c == '*' && self.peek(1) == Some('/') {
                    self.in_comment = false;
                    self.pos += 2;
                } else {
                    self.pos += 1;
                }
                continue;
            }

            if let Some(tag) = &self.dollar_tag {
                if c == '$' {
                    if let Some(end) = self.dollar_close(self.pos, tag) {
                        self.dollar_tag = None;
                        self.pos = end;
                        continue;
                    }
                }
                self.pos += 1;
                continue;
            }

            if let Some(q) = self.quote {
                if c == q {
                    // doubled single quote is an escaped quote, not a close
                    if q == '\'' && self.peek(1) == Some('\'') {
                        self.pos += 2;
                        continue;
                    }
                    self.quote = None;
                    self.pos += 1;
                } else if q == '\'' && c == '\\' && self.pos + 1 < self.rest.len() {
                    self.pos += 2;
                } else {
                    self.pos += 1;
                }
                continue;
            }

            match c {
                '\'' | '"' => {
                    self.quote = Some(c);
                    self.pos += 1;
                }
                '`' if self.opts.backtick_quotes => {
                    self.quote = Some('`');
                    self.pos += 1;
                }
                '$' if self.opts.dollar_quotes => {
                    if let Some((tag, end)) = self.dollar_open(self.pos) {
                        self.dollar_tag = Some(tag);
                        self.pos = end;
                    } else {
                        self.pos += 1;
                    }
                }
                '-' if self.peek(1) == Some('-') => {
                    self.pos = self.rest.len();
                }
                '/' if self.opts.block_comments && self.peek(1) == Some('*') => {
                    self.in_comment = true;
                    self.pos += 2;
                }
                '/' if self.opts.slash_comments && self.peek(1) == Some('/') => {
                    self.pos = self.rest.len();
                }
                '#' if self.opts.hash_comments => {
                    self.pos = self.rest.len();
                }
                '(' => {
                    self.balance += 1;
                    self.pos += 1;
                }
                ')' => {
                    self.balance = self.balance.saturating_sub(1);
                    self.pos += 1;
                }
                ':' => {
                    self.scan_variable(vars);
                }
                '\\' if self.peek(1) == Some(':') => {
                    // escaped colon: strip the backslash, keep the literal
                    self.vars.push(Variable::escaped(self.pos));
                    self.rest.remove(self.pos);
                    self.pos += 1;
                }
                '\\' if self.balance == 0 => {
                    append_end = Some(self.pos);
                    command = Some(self.scan_command());
                    break;
                }
                ';' if self.balance == 0 => {
                    self.pos += 1;
                    self.ready = true;
                    break;
                }
                _ => {
                    self.pos += 1;
                }
            }
        }

        let end = append_end.unwrap_or(self.pos);
        self.append(start, end);
        self.prefix = prefix::find(&self.buf, MAX_PREFIX_WORDS);
        Ok(command)
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.rest.get(self.pos + ahead).copied()
    }

    /// Take the next complete line out of `pending`, pulling chunks from
    /// the source as needed. A trailing partial line is flushed when the
    /// source reports end of stream.
    fn pull(&mut self) -> Result<()> {
        loop {
            if let Some(nl) = self.pending.iter().position(|&c| c == '\n') {
                let mut line: Vec<char> = self.pending.drain(..=nl).collect();
                line.pop();
                self.rest = line;
                self.pos = 0;
                self.fresh_line = true;
                return Ok(());
            }
            match self.src.next_chunk()? {
                Some(chunk) => self.pending.extend(chunk.chars()),
                None => {
                    if self.pending.is_empty() {
                        return Err(Error::Eof);
                    }
                    self.rest = std::mem::take(&mut self.pending);
                    self.pos = 0;
                    self.fresh_line = true;
                    return Ok(());
                }
            }
        }
    }

    /// Append the consumed range of the working line to the statement.
    /// Leading whitespace is dropped only when the buffer was empty; a
    /// whitespace-only range is invisible unless the scanner is inside an
    /// open quote or comment, where whitespace is significant.
    fn append(&mut self, start: usize, end: usize) {
        let seg = &self.rest[start..end];
        let in_literal =
            self.quote.is_some() || self.dollar_tag.is_some() || self.in_comment;

        if !in_literal && seg.iter().all(|c| c.is_whitespace()) {
            self.fresh_line = false;
            return;
        }

        let seg = if self.buf.is_empty() {
            let skip = seg.iter().take_while(|c| c.is_whitespace()).count();
            &seg[skip..]
        } else {
            seg
        };

        if !self.buf.is_empty() && self.fresh_line {
            self.buf.push('\n');
        }
        self.buf.extend_from_slice(seg);
        self.fresh_line = false;
    }

    /// Try to read a `$tag$` opener at `at`. Returns the tag and the offset
    /// just past the opener.
    fn dollar_open(&self, at: usize) -> Option<(String, usize)> {
        let mut i = at + 1;
        let mut tag = String::new();
        while let Some(&c) = self.rest.get(i) {
            if c == '$' {
                return Some((tag, i + 1));
            }
            if tag.is_empty() && !is_name_start(c) {
                return None;
            }
            if !tag.is_empty() && !is_name_char(c) {
                return None;
            }
            if tag.len() >= MAX_DOLLAR_TAG {
                return None;
            }
            tag.push(c);
            i += 1;
        }
        None
    }

    /// Check for the exact closing tag at `at`; returns the offset just
    /// past it.
    fn dollar_close(&self, at: usize, tag: &str) -> Option<usize> {
        let mut i = at + 1;
        for expected in tag.chars() {
            if self.rest.get(i) != Some(&expected) {
                return None;
            }
            i += 1;
        }
        (self.rest.get(i) == Some(&'$')).then_some(i + 1)
    }

    /// Scan a `:`-led variable reference, splicing the bound value into the
    /// working line in place. This is the one spot where already-scanned
    /// territory is rewritten; the scan cursor is re-anchored past the
    /// replacement so substituted text is never rescanned.
    fn scan_variable(&mut self, vars: &dyn VarLookup) {
        if self.peek(1) == Some(':') {
            // cast operator
            self.pos += 2;
            return;
        }

        let start = self.pos;
        let parsed = match self.peek(1) {
            Some(q @ ('\'' | '"')) => self.parse_quoted_name(start + 2, q),
            Some('{') => self.parse_optional_name(start + 2),
            Some(c) if is_name_start(c) => self.parse_bare_name(start + 1),
            _ => None,
        };

        let Some((name, quote, end)) = parsed else {
            self.pos += 1;
            return;
        };

        let value = vars.get(&name);
        let defined = value.is_some();

        let replacement = match (quote, value) {
            (Some('?'), _) => Some(if defined { "TRUE" } else { "FALSE" }.to_string()),
            (Some('\''), Some(v)) => Some(quoting::quote(&v, QuoteStyle::Single)),
            (Some('"'), Some(v)) => Some(quoting::quote(&v, QuoteStyle::Double)),
            (None, Some(v)) => Some(v),
            (_, None) => None,
            (Some(_), Some(_)) => None,
        };

        match replacement {
            Some(text) => {
                let chars: Vec<char> = text.chars().collect();
                let len = chars.len();
                self.rest.splice(start..end, chars);
                self.vars.push(Variable {
                    i: start,
                    end,
                    quote,
                    name,
                    len,
                    defined,
                });
                self.pos = start + len;
            }
            None => {
                self.vars.push(Variable {
                    i: start,
                    end,
                    quote,
                    name,
                    len: end - start,
                    defined: false,
                });
                self.pos = end;
            }
        }
    }

    /// `:'name'` / `:"name"` — `from` points just past the opening quote.
    fn parse_quoted_name(&self, from: usize, q: char) -> Option<(String, Option<char>, usize)> {
        let mut i = from;
        let mut name = String::new();
        while let Some(&c) = self.rest.get(i) {
            if c == q {
                if name.is_empty() {
                    return None;
                }
                return Some((name, Some(q), i + 1));
            }
            name.push(c);
            i += 1;
        }
        None
    }

    /// `:{?name}` — `from` points just past the `{`.
    fn parse_optional_name(&self, from: usize) -> Option<(String, Option<char>, usize)> {
        if self.rest.get(from) != Some(&'?') {
            return None;
        }
        let mut i = from + 1;
        let mut name = String::new();
        while let Some(&c) = self.rest.get(i) {
            if c == '}' {
                if name.is_empty() {
                    return None;
                }
                return Some((name, Some('?'), i + 1));
            }
            if (name.is_empty() && !is_name_start(c)) || (!name.is_empty() && !is_name_char(c)) {
                return None;
            }
            name.push(c);
            i += 1;
        }
        None
    }

    /// `:name` — `from` points at the first name character.
    fn parse_bare_name(&self, from: usize) -> Option<(String, Option<char>, usize)> {
        let mut i = from;
        let mut name = String::new();
        while let Some(&c) = self.rest.get(i) {
            if name.is_empty() && !is_name_start(c) {
                break;
            }
            if !name.is_empty() && !is_name_char(c) {
                break;
            }
            name.push(c);
            i += 1;
        }
        (!name.is_empty()).then_some((name, None, i))
    }

    /// Parse a backslash command at the cursor. The name runs until
    /// whitespace, a control character or another backslash; parameters
    /// continue, honoring quoting, until the next backslash or control
    /// character outside a quote. Nothing of the command is appended to the
    /// statement buffer.
    fn scan_command(&mut self) -> MetaCommand {
        let mut i = self.pos + 1;
        let name_start = i;
        while let Some(&c) = self.rest.get(i) {
            if c.is_whitespace() || c.is_control() || c == '\\' {
                break;
            }
            i += 1;
        }
        let name: String = self.rest[name_start..i].iter().collect();

        let args_start = i;
        let mut q: Option<char> = None;
        while let Some(&c) = self.rest.get(i) {
            if let Some(open) = q {
                if c == open {
                    q = None;
                }
                i += 1;
                continue;
            }
            match c {
                '\'' | '"' | '`' => {
                    q = Some(c);
                    i += 1;
                }
                '\\' => break,
                c if c.is_control() => break,
                _ => i += 1,
            }
        }
        let args: String = self.rest[args_start..i].iter().collect();
        self.pos = i;

        MetaCommand {
            name,
            args: args.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::collections::VecDeque;

    fn source(chunks: &[&str]) -> impl LineSource {
        let mut queue: VecDeque<String> =
            chunks.iter().map(|s| s.to_string()).collect();
        move || -> std::io::Result<Option<String>> { Ok(queue.pop_front()) }
    }

    fn buffer(chunks: &[&str]) -> StmtBuffer {
        StmtBuffer::new(source(chunks), LexerConfig::default())
    }

    fn no_vars() -> HashMap<String, String> {
        HashMap::new()
    }

    /// Drive the buffer to completion, collecting (text, command) units.
    fn drain(buf: &mut StmtBuffer, vars: &HashMap<String, String>) -> Vec<(String, Option<String>)> {
        let mut units = Vec::new();
        loop {
            match buf.next(vars) {
                Ok(Some(cmd)) => {
                    units.push((buf.text(), Some(cmd.name)));
                    buf.reset();
                }
                Ok(None) => {
                    if buf.ready() {
                        units.push((buf.text(), None));
                        buf.reset();
                    }
                }
                Err(Error::Eof) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        units
    }

    #[test]
    fn semicolon_terminates() {
        let mut buf = buffer(&["select 1;\n"]);
        assert!(buf.next(&no_vars()).unwrap().is_none());
        assert!(buf.ready());
        assert_eq!(buf.text(), "select 1;");
        assert_eq!(buf.prefix(), "SELECT 1");
    }

    #[test]
    fn two_units_on_one_line() {
        let mut buf = buffer(&["select 1; select 2\\g\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(
            units,
            vec![
                ("select 1;".to_string(), None),
                ("select 2".to_string(), Some("g".to_string())),
            ]
        );
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let text = "select *\nfrom t\nwhere x = 'a;b';\n";
        let whole = drain(&mut buffer(&[text]), &no_vars());

        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let by_line = drain(&mut buffer(&lines), &no_vars());

        let chars: Vec<String> = text.chars().map(|c| c.to_string()).collect();
        let char_refs: Vec<&str> = chars.iter().map(|s| s.as_str()).collect();
        let by_char = drain(&mut buffer(&char_refs), &no_vars());

        assert_eq!(whole, by_line);
        assert_eq!(whole, by_char);
        assert_eq!(whole[0].0, "select *\nfrom t\nwhere x = 'a;b';");
    }

    #[test]
    fn blank_lines_are_invisible() {
        let mut buf = buffer(&["select 1\n", "   \n", "\n", ";\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select 1\n;");
    }

    #[test]
    fn blank_line_inside_quote_is_kept() {
        let mut buf = buffer(&["select 'a\n", "\n", "b';\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select 'a\n\nb';");
    }

    #[test]
    fn leading_whitespace_dropped_only_when_empty() {
        let mut buf = buffer(&["   select\n", "   1;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select\n   1;");
    }

    #[test]
    fn doubled_single_quote_is_not_a_close() {
        let mut buf = buffer(&["select 'it''s; fine';\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select 'it''s; fine';");
    }

    #[test]
    fn semicolon_inside_parens_is_plain_text() {
        // neither the `;` nor the `\x` inside the balanced region splits
        // the statement
        let mut buf = buffer(&["select (f(1); \\x g(2)) more;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, "select (f(1); \\x g(2)) more;");
    }

    #[test]
    fn unbalanced_close_paren_does_not_go_negative() {
        let mut buf = buffer(&["select a) ; \n"]);
        let units = drain(&mut buf, &no_vars());
        assert!(units[0].0.ends_with(';'));
    }

    #[test]
    fn line_comment_hides_terminator() {
        let mut buf = buffer(&["select 1 -- not yet;\n", ";\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select 1 -- not yet;\n;");
    }

    #[test]
    fn block_comment_spans_chunks() {
        let mut buf = buffer(&["select /* one\n", "two */ 1;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select /* one\ntwo */ 1;");
    }

    #[test]
    fn block_comment_nesting_is_not_tracked() {
        let mut buf = buffer(&["select /* a /* b */ 1;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select /* a /* b */ 1;");
    }

    #[test]
    fn dollar_quote_needs_exact_tag() {
        let mut buf = buffer(&["select $tag$ body; $$ $other$ $tag$;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select $tag$ body; $$ $other$ $tag$;");
    }

    #[test]
    fn empty_dollar_tag_closes_on_bare_dollars() {
        let mut buf = buffer(&["select $$ a; b $$;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select $$ a; b $$;");
    }

    #[test]
    fn backtick_quoting_is_gated() {
        let mut off = buffer(&["select `a;\n"]);
        assert!(off.next(&no_vars()).unwrap().is_none());
        assert!(off.ready());

        let opts = LexerConfig {
            backtick_quotes: true,
            ..LexerConfig::default()
        };
        let mut on = StmtBuffer::new(source(&["select `a;\n"]), opts);
        assert!(on.next(&no_vars()).unwrap().is_none());
        assert!(!on.ready());
        assert_eq!(on.state(), "`");
    }

    #[test]
    fn command_with_args() {
        let mut buf = buffer(&["\\set name 'a b'\n"]);
        let cmd = buf.next(&no_vars()).unwrap().unwrap();
        assert_eq!(cmd.name, "set");
        assert_eq!(cmd.args, "name 'a b'");
        assert!(buf.is_empty());
    }

    #[test]
    fn command_only_line_leaves_buffer_untouched() {
        let mut buf = buffer(&["select 1\n", "\\p\n", ";\n"]);
        let cmds: Vec<_> = drain(&mut buf, &no_vars());
        // \p arrives while the statement is still open; the statement text
        // is intact afterwards
        assert_eq!(cmds[0].1.as_deref(), Some("p"));
        assert_eq!(cmds[0].0, "select 1");
    }

    #[test]
    fn variable_substitution_in_place() {
        let mut vars = HashMap::new();
        vars.insert("tbl".to_string(), "film".to_string());
        let mut buf = buffer(&["select * from :tbl;\n"]);
        let units = drain(&mut buf, &vars);
        assert_eq!(units[0].0, "select * from film;");
    }

    #[test]
    fn quoted_variable_forms() {
        let mut vars = HashMap::new();
        vars.insert("v".to_string(), "o'brien".to_string());
        let mut buf = buffer(&["select :'v', :\"v\";\n"]);
        let units = drain(&mut buf, &vars);
        assert_eq!(units[0].0, "select 'o''brien', \"o'brien\";");
    }

    #[test]
    fn optional_variable_test_form() {
        let mut vars = HashMap::new();
        vars.insert("set".to_string(), "1".to_string());
        let mut buf = buffer(&["select :{?set}, :{?unset};\n"]);
        let units = drain(&mut buf, &vars);
        assert_eq!(units[0].0, "select TRUE, FALSE;");
    }

    #[test]
    fn unbound_variable_is_left_alone() {
        let mut buf = buffer(&["select :missing;\n"]);
        let units = drain(&mut buf, &no_vars());
        assert_eq!(units[0].0, "select :missing;");
    }

    #[test]
    fn cast_operator_is_not_a_variable() {
        let mut vars = HashMap::new();
        vars.insert("int".to_string(), "boom".to_string());
        let mut buf = buffer(&["select x::int;\n"]);
        let units = drain(&mut buf, &vars);
        assert_eq!(units[0].0, "select x::int;");
    }

    #[test]
    fn escaped_colon_is_literal() {
        let mut vars = HashMap::new();
        vars.insert("v".to_string(), "boom".to_string());
        let mut buf = buffer(&["select \\:v;\n"]);
        let units = drain(&mut buf, &vars);
        assert_eq!(units[0].0, "select :v;");
    }

    #[test]
    fn no_substitution_inside_quotes() {
        let mut vars = HashMap::new();
        vars.insert("v".to_string(), "boom".to_string());
        let mut buf = buffer(&["select ':v';\n"]);
        let units = drain(&mut buf, &vars);
        assert_eq!(units[0].0, "select ':v';");
    }

    #[test]
    fn variables_are_recorded() {
        let mut vars = HashMap::new();
        vars.insert("tbl".to_string(), "film".to_string());
        let mut buf = buffer(&["select :tbl, :nope;\n"]);
        buf.next(&vars).unwrap();
        let recorded = buf.vars();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].name, "tbl");
        assert!(recorded[0].defined);
        assert_eq!(recorded[0].len, 4);
        assert_eq!(recorded[1].name, "nope");
        assert!(!recorded[1].defined);
    }

    #[test]
    fn eof_mid_quote_reports_eof_and_state() {
        let mut buf = buffer(&["select 'abc\n"]);
        assert!(buf.next(&no_vars()).unwrap().is_none());
        assert!(!buf.ready());
        assert_eq!(buf.state(), "'");
        assert!(matches!(buf.next(&no_vars()), Err(Error::Eof)));
        // the partial statement is still inspectable
        assert_eq!(buf.text(), "select 'abc");
    }

    #[test]
    fn final_partial_line_is_flushed() {
        let mut buf = buffer(&["select 1;"]);
        assert!(buf.next(&no_vars()).unwrap().is_none());
        assert!(buf.ready());
        assert_eq!(buf.text(), "select 1;");
    }

    #[test]
    fn prompt_states() {
        let mut buf = buffer(&["select (1,\n"]);
        assert_eq!(buf.state(), "=");
        buf.next(&no_vars()).unwrap();
        assert_eq!(buf.state(), "(");
    }
}
