//! Context-aware tab completion
//!
//! Extracts the word under the cursor and the reversed sequence of
//! previously typed words (balanced parentheses and quoted regions count as
//! one opaque word each), matches them against the grammar pattern table,
//! and runs the winning rule's suggestion actions against the metadata
//! capability system. A capability a source cannot answer contributes no
//! candidates; it never aborts completion.

pub mod grammar;

mod candidates;

pub use candidates::{Candidate, CandidateKind};

use crate::meta::PluginReader;
use std::collections::HashSet;
use std::sync::Arc;

/// Characters that end the word under the cursor. Dots, colons and
/// backslashes stay inside the word so qualified names, variables and
/// command names complete as a whole.
const WORD_BREAK: &[char] = &[
    ' ', '\t', '\n', ',', '(', ')', ';', '=', '<', '>', '+', '-', '*', '/', '%', '^', '\'', '"',
];

pub struct Completer {
    reader: Arc<PluginReader>,
}

impl Completer {
    pub fn new(reader: Arc<PluginReader>) -> Self {
        Self { reader }
    }

    /// Complete the word at `pos`, returning its start offset and the
    /// candidate list.
    pub async fn complete(&self, line: &str, pos: usize) -> (usize, Vec<Candidate>) {
        let pos = pos.min(line.len());
        let start = word_start(line, pos);
        let word = &line[start..pos];

        // backslash command names, matched case-sensitively
        if word.starts_with('\\') {
            let out = grammar::COMMANDS
                .iter()
                .map(|name| format!("\\{name}"))
                .filter(|full| full.starts_with(word))
                .map(Candidate::command)
                .collect();
            return (start, out);
        }

        let reversed = previous_words(&line[..start]);
        let rule = grammar::rules()
            .iter()
            .find(|r| r.matches(&reversed))
            .expect("the fallback rule matches everything");

        let mut out = Vec::new();
        for action in rule.actions {
            out.extend(candidates::run(&self.reader, action, &reversed, word).await);
        }

        // case-insensitive prefix filter against the typed word
        if !word.is_empty() {
            let word_lower = word.to_lowercase();
            out.retain(|c| c.text.to_lowercase().starts_with(&word_lower));
        }

        // an all-lowercase word keeps suggestions lowercase where the
        // match was case-insensitive (keywords)
        if !word.is_empty() && word.chars().all(|c| !c.is_uppercase()) {
            for c in &mut out {
                if c.kind == CandidateKind::Keyword {
                    c.text = c.text.to_lowercase();
                }
            }
        }

        // deduplicate by (qualified) name across sources
        let mut seen = HashSet::new();
        out.retain(|c| seen.insert(c.text.to_lowercase()));

        out.sort_by(|a, b| (a.kind.rank(), &a.text).cmp(&(b.kind.rank(), &b.text)));
        (start, out)
    }
}

/// Start offset of the word being typed at `pos`.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| WORD_BREAK.contains(&c))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// The previously typed words, most recent first. A balanced `(...)` run
/// and a quoted region each collapse into the word that contains them, so
/// completion never splits inside `(SELECT ...)` or a literal.
fn previous_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut i = chars.len();

    while i > 0 {
        while i > 0 && chars[i - 1].is_whitespace() {
            i -= 1;
        }
        if i == 0 {
            break;
        }
        let end = i;
        while i > 0 {
            let c = chars[i - 1];
            if c.is_whitespace() {
                break;
            }
            if c == ')' {
                i = skip_balanced(&chars, i);
                continue;
            }
            if c == '\'' || c == '"' {
                i = skip_quoted(&chars, i, c);
                continue;
            }
            i -= 1;
        }
        words.push(chars[i..end].iter().collect());
    }
    words
}

/// `chars[end - 1]` is `)`; step back to the matching `(`.
fn skip_balanced(chars: &[char], end: usize) -> usize {
    let mut depth = 0;
    let mut i = end;
    while i > 0 {
        i -= 1;
        match chars[i] {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    0
}

/// `chars[end - 1]` closes a quote; step back to its opener.
fn skip_quoted(chars: &[char], end: usize, q: char) -> usize {
    let mut i = end - 1;
    while i > 0 {
        i -= 1;
        if chars[i] == q {
            return i;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemConn;
    use crate::meta::{InfoSchemaReader, MetaSource};
    use pretty_assertions::assert_eq;

    fn completer() -> Completer {
        let conn = Arc::new(MemConn::with_sample_catalog());
        let sources: Vec<Arc<dyn MetaSource>> = vec![Arc::new(InfoSchemaReader::new(conn))];
        Completer::new(Arc::new(PluginReader::new(sources)))
    }

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn word_under_cursor() {
        assert_eq!(word_start("select fi", 9), 7);
        assert_eq!(word_start("select ", 7), 7);
        assert_eq!(word_start("fi", 2), 0);
        assert_eq!(word_start("select public.fi", 16), 7);
        assert_eq!(word_start("insert into film(co", 19), 17);
    }

    #[test]
    fn previous_words_are_reversed() {
        assert_eq!(
            previous_words("select * from "),
            ["from", "*", "select"]
        );
    }

    #[test]
    fn balanced_parens_are_one_word() {
        assert_eq!(
            previous_words("select count(x, y) from "),
            ["from", "count(x, y)", "select"]
        );
    }

    #[test]
    fn quoted_regions_are_opaque() {
        assert_eq!(
            previous_words("where name = 'a b c' and "),
            ["and", "'a b c'", "=", "name", "where"]
        );
    }

    #[test]
    fn unclosed_paren_is_its_own_word() {
        assert_eq!(
            previous_words("insert into film ("),
            ["(", "film", "into", "insert"]
        );
    }

    #[tokio::test]
    async fn from_suggests_tables_views_and_schemas() {
        let c = completer();
        let line = "SELECT * FROM ";
        let (_, out) = c.complete(line, line.len()).await;
        let names = texts(&out);
        assert!(names.contains(&"film"));
        assert!(names.contains(&"film_list"));
        assert!(names.contains(&"public"));
    }

    #[tokio::test]
    async fn delete_from_excludes_views_and_sequences() {
        let c = completer();
        let line = "DELETE FROM ";
        let (_, out) = c.complete(line, line.len()).await;
        let names = texts(&out);
        assert!(names.contains(&"film"));
        assert!(names.contains(&"actor"));
        assert!(!names.contains(&"film_list"));
        assert!(!names.contains(&"film_film_id_seq"));
    }

    #[tokio::test]
    async fn insert_column_list_suggests_columns_of_that_table_only() {
        let c = completer();
        let line = "INSERT INTO film (";
        let (_, out) = c.complete(line, line.len()).await;
        let names = texts(&out);
        assert!(names.contains(&"film_id"));
        assert!(names.contains(&"title"));
        assert!(!names.contains(&"actor_id"));
        assert!(!names.contains(&"first_name"));
    }

    #[tokio::test]
    async fn prefix_narrows_candidates() {
        let c = completer();
        let line = "SELECT * FROM fi";
        let (start, out) = c.complete(line, line.len()).await;
        assert_eq!(start, 14);
        let names = texts(&out);
        assert_eq!(names, ["film", "film_actor", "film_list", "film_film_id_seq"]);
    }

    #[tokio::test]
    async fn qualified_prefix_stays_qualified() {
        let c = completer();
        let line = "SELECT * FROM public.fi";
        let (_, out) = c.complete(line, line.len()).await;
        let names = texts(&out);
        assert_eq!(
            names,
            [
                "public.film",
                "public.film_actor",
                "public.film_list",
                "public.film_film_id_seq"
            ]
        );
    }

    #[tokio::test]
    async fn lowercase_input_keeps_keywords_lowercase() {
        let c = completer();
        let (_, out) = c.complete("sel", 3).await;
        assert!(texts(&out).contains(&"select"));
    }

    #[tokio::test]
    async fn backslash_commands_complete_case_sensitively() {
        let c = completer();
        let (start, out) = c.complete("\\d", 2).await;
        assert_eq!(start, 0);
        let names = texts(&out);
        assert!(names.contains(&"\\dt"));
        assert!(names.contains(&"\\df"));
        assert!(!names.contains(&"\\echo"));
    }

    #[tokio::test]
    async fn missing_capabilities_contribute_nothing() {
        // a reader with no capabilities at all: every source degrades
        let empty = Completer::new(Arc::new(PluginReader::new(vec![])));
        let line = "SELECT * FROM ";
        let (_, out) = empty.complete(line, line.len()).await;
        assert!(out.is_empty());

        // keyword rules still work without any backend
        let (_, out) = empty.complete("SEL", 3).await;
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn update_set_suggests_target_columns() {
        let c = completer();
        let line = "UPDATE actor SET ";
        let (_, out) = c.complete(line, line.len()).await;
        let names = texts(&out);
        assert!(names.contains(&"first_name"));
        assert!(!names.contains(&"title"));
    }
}
