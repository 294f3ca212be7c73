//! Interactive shell
//!
//! Binds readline input to the statement buffer, dispatches backslash
//! commands to the describe writers and variable store, and executes ready
//! statements against the open connection. A failing statement prints its
//! normalized backend error and the session continues.

mod helper;

pub use helper::ShellHelper;

use crate::complete::Completer;
use crate::config::AppConfig;
use crate::db::{Connection, Driver, InstrumentOpts, InstrumentedConn, Registry, Rows};
use crate::error::Error;
use crate::meta::{writer, InfoSchemaReader, MetaSource, ObjectType, PluginReader};
use crate::quoting;
use crate::stmt::{MetaCommand, StmtBuffer};
use anyhow::Result;
use comfy_table::{Attribute, Cell, ContentArrangement};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{CompletionType, Config, Editor};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;

/// Statement prefixes executed as queries; everything else runs as exec.
const QUERY_PREFIXES: &[&str] = &[
    "SELECT", "VALUES", "SHOW", "WITH", "EXPLAIN", "DESCRIBE", "PRAGMA",
];

pub struct Shell {
    editor: Editor<ShellHelper, FileHistory>,
    queue: Rc<RefCell<VecDeque<String>>>,
    buf: StmtBuffer,
    vars: HashMap<String, String>,
    registry: Registry,
    config: AppConfig,
    driver: Arc<dyn Driver>,
    conn: Arc<dyn Connection>,
    reader: Arc<PluginReader>,
    opts: InstrumentOpts,
    runtime: Handle,
}

impl Shell {
    pub fn new(
        runtime: Handle,
        registry: Registry,
        config: AppConfig,
        driver: Arc<dyn Driver>,
        conn: Arc<dyn Connection>,
        reader: Arc<PluginReader>,
        opts: InstrumentOpts,
    ) -> Result<Self> {
        let editor_config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let mut editor: Editor<ShellHelper, FileHistory> = Editor::with_config(editor_config)?;
        editor.set_helper(Some(ShellHelper::new(
            Arc::new(Completer::new(reader.clone())),
            runtime.clone(),
        )));
        if let Some(path) = history_path() {
            let _ = editor.load_history(&path);
        }

        let queue: Rc<RefCell<VecDeque<String>>> = Rc::new(RefCell::new(VecDeque::new()));
        let src = {
            let queue = Rc::clone(&queue);
            move || -> std::io::Result<Option<String>> { Ok(queue.borrow_mut().pop_front()) }
        };
        let buf = StmtBuffer::new(src, config.lexer);

        Ok(Self {
            editor,
            queue,
            buf,
            vars: HashMap::new(),
            registry,
            config,
            driver,
            conn,
            reader,
            opts,
            runtime,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = format!("{}{}> ", self.driver.name(), self.buf.state());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(&line);
                    }
                    self.queue.borrow_mut().push_back(line + "\n");
                    if self.pump()? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    self.buf.reset();
                    println!("^C");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("readline error: {err}");
                    break;
                }
            }
        }

        if let Some(path) = history_path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(&path);
        }
        Ok(())
    }

    /// Drain everything the buffer can produce from the queued input.
    /// Returns true when the session should end.
    fn pump(&mut self) -> Result<bool> {
        loop {
            match self.buf.next(&self.vars) {
                Ok(Some(cmd)) => {
                    if self.dispatch(cmd)? {
                        return Ok(true);
                    }
                }
                Ok(None) => {
                    if self.buf.ready() {
                        let text = self.buf.text();
                        let prefix = self.buf.prefix().to_string();
                        self.buf.reset();
                        self.execute(&text, &prefix);
                    }
                }
                // the terminal has to supply more input
                Err(Error::Eof) => return Ok(false),
                Err(e) => {
                    self.buf.reset();
                    println!("error: {e}");
                    return Ok(false);
                }
            }
        }
    }

    /// Handle one backslash command. Returns true on quit.
    fn dispatch(&mut self, cmd: MetaCommand) -> Result<bool> {
        let mut out = std::io::stdout();
        let args = cmd.args.as_str();

        match cmd.name.as_str() {
            "q" | "quit" => return Ok(true),
            "?" => self.help(),
            "p" => {
                if self.buf.is_empty() {
                    println!("Query buffer is empty.");
                } else {
                    println!("{}", self.buf.text());
                }
            }
            "r" => {
                self.buf.reset();
                println!("Query buffer reset.");
            }
            "g" => {
                let text = self.buf.text();
                let prefix = self.buf.prefix().to_string();
                self.buf.reset();
                self.execute(&text, &prefix);
            }
            "echo" => match quoting::unquote(args, false, &self.vars) {
                Ok((text, _)) => println!("{text}"),
                Err(e) => println!("error: {e}"),
            },
            "set" => self.set_var(args),
            "unset" => {
                let name = args.trim();
                if name.is_empty() {
                    println!("error: {}", Error::MissingArg("unset"));
                } else {
                    self.vars.remove(name);
                }
            }
            "c" => {
                let target = args.trim().to_string();
                if target.is_empty() {
                    println!("error: {}", Error::MissingArg("c"));
                } else if let Err(e) = self.connect(&target) {
                    println!("error: {e}");
                }
            }
            "l" => {
                if let Err(e) = self
                    .runtime
                    .block_on(writer::list_catalogs(&self.reader, &mut out))
                {
                    println!("error: {e}");
                }
            }
            name if name.starts_with('d') => {
                if let Err(e) = self.describe(name, args, &mut out) {
                    println!("error: {e}");
                }
            }
            other => println!("error: {}", Error::UnknownCommand(other.to_string())),
        }
        Ok(false)
    }

    /// Route a `\d`-family command to its writer.
    fn describe(&self, name: &str, pattern: &str, out: &mut dyn std::io::Write) -> Result<()> {
        let Some((base, system, verbose)) = parse_describe(name) else {
            println!("error: {}", Error::UnknownCommand(name.to_string()));
            return Ok(());
        };

        let reader = &self.reader;
        let result = match base.as_str() {
            "d" => {
                if pattern.is_empty() {
                    self.runtime.block_on(writer::list_tables(
                        reader,
                        &[ObjectType::Table, ObjectType::View, ObjectType::MaterializedView],
                        pattern,
                        verbose,
                        system,
                        out,
                    ))
                } else {
                    self.runtime.block_on(writer::describe_table_details(
                        reader, pattern, verbose, system, out,
                    ))
                }
            }
            "dt" => self.runtime.block_on(writer::list_tables(
                reader,
                &[ObjectType::Table],
                pattern,
                verbose,
                system,
                out,
            )),
            "dv" => self.runtime.block_on(writer::list_tables(
                reader,
                &[ObjectType::View],
                pattern,
                verbose,
                system,
                out,
            )),
            "dm" => self.runtime.block_on(writer::list_tables(
                reader,
                &[ObjectType::MaterializedView],
                pattern,
                verbose,
                system,
                out,
            )),
            "ds" => self.runtime.block_on(writer::list_tables(
                reader,
                &[ObjectType::Sequence],
                pattern,
                verbose,
                system,
                out,
            )),
            "di" => self
                .runtime
                .block_on(writer::list_indexes(reader, pattern, system, out)),
            "df" => self.runtime.block_on(writer::describe_functions(
                reader, pattern, verbose, system, out,
            )),
            "dn" => self.runtime.block_on(writer::list_schemas(
                reader, pattern, verbose, system, out,
            )),
            "dp" => self
                .runtime
                .block_on(writer::list_privileges(reader, pattern, out)),
            _ => {
                println!("error: {}", Error::UnknownCommand(name.to_string()));
                return Ok(());
            }
        };

        if let Err(e) = result {
            println!("error: {e}");
        }
        Ok(())
    }

    fn set_var(&mut self, args: &str) {
        let mut parts = args.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_string();
        if name.is_empty() {
            let mut names: Vec<_> = self.vars.iter().collect();
            names.sort();
            for (name, value) in names {
                println!("{name} = '{value}'");
            }
            return;
        }

        let raw = parts.next().unwrap_or("").trim();
        match quoting::unquote(raw, false, &self.vars) {
            Ok((value, _)) => {
                self.vars.insert(name, value);
            }
            Err(e) => println!("error: {e}"),
        }
    }

    /// Connect to a saved connection name or a raw URL, rebuilding the
    /// reader stack and the completion helper.
    fn connect(&mut self, target: &str) -> Result<()> {
        let url = self
            .config
            .get_connection(target)
            .map(|c| c.url.clone())
            .unwrap_or_else(|| target.to_string());

        let (driver, conn) = self.runtime.block_on(self.registry.open(&url))?;
        let conn: Arc<dyn Connection> = Arc::from(conn);
        let meta_conn = Arc::new(InstrumentedConn::new(conn.clone(), self.opts));
        let sources: Vec<Arc<dyn MetaSource>> = vec![Arc::new(InfoSchemaReader::new(meta_conn))];
        let reader = Arc::new(PluginReader::new(sources));

        self.driver = driver;
        self.conn = conn;
        self.reader = reader.clone();
        self.editor.set_helper(Some(ShellHelper::new(
            Arc::new(Completer::new(reader)),
            self.runtime.clone(),
        )));

        self.config.last_connection = Some(target.to_string());
        let _ = self.config.save();
        println!("You are now connected ({}).", self.driver.name());
        Ok(())
    }

    /// Execute one completed statement.
    fn execute(&mut self, text: &str, prefix: &str) {
        let text = text.trim().trim_end_matches(';').trim();
        if text.is_empty() {
            return;
        }

        let started = Instant::now();
        if is_query(prefix) {
            match self.runtime.block_on(self.conn.query(text, &[])) {
                Ok(rows) => render_rows(rows, started),
                Err(e) => self.report(e),
            }
        } else {
            match self.runtime.block_on(self.conn.exec(text, &[])) {
                Ok(result) => println!(
                    "OK, {} rows affected ({:.3} sec)",
                    result.rows_affected,
                    started.elapsed().as_secs_f64()
                ),
                Err(e) => self.report(e),
            }
        }
    }

    /// Print a failure with the driver's normalized code and message.
    fn report(&self, err: Error) {
        let (code, message) = self.driver.err(&err);
        if code.is_empty() {
            println!("error: {message}");
        } else {
            println!("error: {}: {code}: {message}", self.driver.name());
        }
    }

    fn help(&self) {
        println!("General");
        println!("  \\q                     quit");
        println!("  \\c NAME-OR-URL         connect to a saved name or connection URL");
        println!("  \\g                     execute the query buffer");
        println!("  \\p                     show the query buffer");
        println!("  \\r                     reset the query buffer");
        println!("  \\echo TEXT             print text");
        println!("Variables");
        println!("  \\set [NAME [VALUE]]    set a variable, or list them all");
        println!("  \\unset NAME            unset a variable");
        println!("Informational ('+': more detail, 'S': system objects)");
        println!("  \\d[S+] [PATTERN]       describe tables, views and sequences");
        println!("  \\dt \\dv \\dm \\ds        list tables, views, matviews, sequences");
        println!("  \\di [PATTERN]          list indexes");
        println!("  \\df[+] [PATTERN]       list functions");
        println!("  \\dn[+] [PATTERN]       list schemas");
        println!("  \\dp [PATTERN]          list privileges");
        println!("  \\l                     list catalogs");
    }
}

/// Split a `\d`-family name into its base and the `S`/`+` modifiers.
fn parse_describe(name: &str) -> Option<(String, bool, bool)> {
    if !name.starts_with('d') {
        return None;
    }
    let mut rest = name;
    let mut verbose = false;
    let mut system = false;
    while rest.ends_with('+') || rest.ends_with('S') {
        if rest.ends_with('+') {
            verbose = true;
        } else {
            system = true;
        }
        rest = &rest[..rest.len() - 1];
    }
    matches!(rest, "d" | "dt" | "dv" | "dm" | "ds" | "di" | "df" | "dn" | "dp")
        .then(|| (rest.to_string(), system, verbose))
}

/// Classify a statement by its keyword prefix. `SELECT INTO` creates a
/// table and runs as exec, which is why the prefix keeps more than one
/// word.
fn is_query(prefix: &str) -> bool {
    let mut words = prefix.split_whitespace();
    let first = words.next().unwrap_or("");
    if first == "SELECT" && words.next() == Some("INTO") {
        return false;
    }
    QUERY_PREFIXES.contains(&first)
}

fn render_rows(mut rows: Rows, started: Instant) {
    if rows.columns().is_empty() && rows.is_empty() {
        println!("OK ({:.3} sec)", started.elapsed().as_secs_f64());
        return;
    }

    let mut table = comfy_table::Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        rows.columns()
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );
    let mut count = 0usize;
    while let Some(row) = rows.next_row() {
        table.add_row(row.iter().map(|v| v.text()));
        count += 1;
    }
    println!("{table}");
    println!(
        "{count} row{} ({:.3} sec)",
        if count == 1 { "" } else { "s" },
        started.elapsed().as_secs_f64()
    );
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("sqlsh").join("history"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_modifiers() {
        assert_eq!(parse_describe("d"), Some(("d".into(), false, false)));
        assert_eq!(parse_describe("dt+"), Some(("dt".into(), false, true)));
        assert_eq!(parse_describe("dtS"), Some(("dt".into(), true, false)));
        assert_eq!(parse_describe("dS+"), Some(("d".into(), true, true)));
        assert_eq!(parse_describe("dx"), None);
        assert_eq!(parse_describe("x"), None);
    }

    #[test]
    fn query_classification_uses_the_prefix() {
        assert!(is_query("SELECT"));
        assert!(is_query("SELECT 1"));
        assert!(is_query("WITH RECURSIVE"));
        assert!(!is_query("SELECT INTO"));
        assert!(!is_query("INSERT INTO"));
        assert!(!is_query("CREATE TABLE"));
        assert!(!is_query(""));
    }
}
