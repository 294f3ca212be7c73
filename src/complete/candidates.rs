//! Candidate generation
//!
//! Turns a matched grammar rule into concrete suggestions by querying the
//! composed metadata reader. Sources that cannot answer (missing
//! capability, timeout, dry-run) contribute nothing; real backend failures
//! are logged and likewise yield no candidates, because losing one
//! completion source must not disturb typing.

use crate::complete::grammar::RuleAction;
use crate::error::Error;
use crate::meta::{
    CatalogReader, ColumnReader, Filter, FunctionReader, ObjectType, PluginReader, SchemaReader,
    SequenceReader, TableReader,
};
use futures::join;
use tracing::{debug, warn};

/// A single completion suggestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Replacement text for the word under the cursor.
    pub text: String,
    pub kind: CandidateKind,
    /// Extra context shown next to the suggestion (owning schema or table).
    pub detail: Option<String>,
}

impl Candidate {
    pub fn keyword(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CandidateKind::Keyword,
            detail: None,
        }
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CandidateKind::Command,
            detail: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateKind {
    Column,
    Table,
    View,
    Sequence,
    Schema,
    Catalog,
    Function,
    Keyword,
    Command,
}

impl CandidateKind {
    /// Sort rank: the most specific object kinds list first.
    pub fn rank(self) -> u8 {
        match self {
            CandidateKind::Column => 0,
            CandidateKind::Table => 1,
            CandidateKind::View => 2,
            CandidateKind::Sequence => 3,
            CandidateKind::Schema => 4,
            CandidateKind::Catalog => 5,
            CandidateKind::Function => 6,
            CandidateKind::Keyword => 7,
            CandidateKind::Command => 8,
        }
    }

    /// Two-letter tag for completion menus.
    pub fn label(self) -> &'static str {
        match self {
            CandidateKind::Column => "co",
            CandidateKind::Table => "tb",
            CandidateKind::View => "vw",
            CandidateKind::Sequence => "sq",
            CandidateKind::Schema => "sc",
            CandidateKind::Catalog => "db",
            CandidateKind::Function => "fn",
            CandidateKind::Keyword => "kw",
            CandidateKind::Command => "\\.",
        }
    }
}

/// Run one rule action.
pub(super) async fn run(
    reader: &PluginReader,
    action: &RuleAction,
    reversed: &[String],
    word: &str,
) -> Vec<Candidate> {
    match action {
        RuleAction::Keywords(list) => list.iter().map(|k| Candidate::keyword(*k)).collect(),
        RuleAction::Selectables => relations(reader, word, ObjectType::SELECTABLE, true).await,
        RuleAction::TablesOnly | RuleAction::Insertables => {
            relations(reader, word, ObjectType::TABLE_LIKE, false).await
        }
        RuleAction::Attributes => attributes(reader, reversed).await,
        RuleAction::Namespaces => namespaces(reader, word).await,
        RuleAction::Functions => functions(reader).await,
    }
}

/// Relation names matching the word's optional `schema.` qualifier.
async fn relations(
    reader: &PluginReader,
    word: &str,
    kinds: &[ObjectType],
    include_sequences: bool,
) -> Vec<Candidate> {
    let (qualifier, _) = split_qualifier(word);
    let mut filter = Filter::new()
        .types(kinds)
        .only_visible(qualifier.is_none());
    if let Some(q) = qualifier {
        filter = filter.schema(q.to_string());
    }

    let (tables, sequences) = join!(
        fetch_tables(reader, &filter),
        fetch_sequences(reader, &filter, include_sequences)
    );

    let qualify = |name: &str| match qualifier {
        Some(q) => format!("{q}.{name}"),
        None => name.to_string(),
    };

    let mut out: Vec<Candidate> = tables
        .into_iter()
        .map(|t| Candidate {
            text: qualify(&t.name),
            kind: relation_kind(t.kind),
            detail: Some(t.schema),
        })
        .collect();
    out.extend(sequences.into_iter().map(|s| Candidate {
        text: qualify(&s.name),
        kind: CandidateKind::Sequence,
        detail: Some(s.schema),
    }));
    out
}

async fn fetch_tables(reader: &PluginReader, filter: &Filter) -> Vec<crate::meta::Table> {
    match reader.tables(filter).await {
        Ok(mut rs) => rs.collect_remaining(),
        Err(e) => {
            note(&e, "tables");
            Vec::new()
        }
    }
}

async fn fetch_sequences(
    reader: &PluginReader,
    filter: &Filter,
    enabled: bool,
) -> Vec<crate::meta::Sequence> {
    if !enabled {
        return Vec::new();
    }
    match reader.sequences(filter).await {
        Ok(mut rs) => rs.collect_remaining(),
        Err(e) => {
            note(&e, "sequences");
            Vec::new()
        }
    }
}

/// Column names of every table the statement has referenced so far.
async fn attributes(reader: &PluginReader, reversed: &[String]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for table in context_tables(reversed) {
        let filter = Filter::new().parent(table);
        match reader.columns(&filter).await {
            Ok(mut rs) => {
                while rs.advance() {
                    if let Ok(col) = rs.current() {
                        out.push(Candidate {
                            text: col.name.clone(),
                            kind: CandidateKind::Column,
                            detail: Some(format!("{} {}", col.table, col.data_type)),
                        });
                    }
                }
            }
            Err(e) => note(&e, "columns"),
        }
    }
    out
}

/// Schema and catalog names for an unqualified word.
async fn namespaces(reader: &PluginReader, word: &str) -> Vec<Candidate> {
    if word.contains('.') {
        return Vec::new();
    }

    let schemas = async {
        match reader.schemas(&Filter::new()).await {
            Ok(mut rs) => rs.collect_remaining(),
            Err(e) => {
                note(&e, "schemas");
                Vec::new()
            }
        }
    };
    let catalogs = async {
        match reader.catalogs(&Filter::new()).await {
            Ok(mut rs) => rs.collect_remaining(),
            Err(e) => {
                note(&e, "catalogs");
                Vec::new()
            }
        }
    };
    let (schemas, catalogs) = join!(schemas, catalogs);

    let mut out: Vec<Candidate> = schemas
        .into_iter()
        .map(|s| Candidate {
            text: s.name,
            kind: CandidateKind::Schema,
            detail: None,
        })
        .collect();
    out.extend(catalogs.into_iter().map(|c| Candidate {
        text: c.name,
        kind: CandidateKind::Catalog,
        detail: None,
    }));
    out
}

async fn functions(reader: &PluginReader) -> Vec<Candidate> {
    match reader.functions(&Filter::new()).await {
        Ok(mut rs) => {
            let mut out = Vec::new();
            while rs.advance() {
                if let Ok(f) = rs.current() {
                    out.push(Candidate {
                        text: f.name.clone(),
                        kind: CandidateKind::Function,
                        detail: Some(f.schema.clone()),
                    });
                }
            }
            out
        }
        Err(e) => {
            note(&e, "functions");
            Vec::new()
        }
    }
}

/// Table names anchored by FROM/JOIN/INTO/UPDATE in the words typed so far.
fn context_tables(reversed: &[String]) -> Vec<String> {
    const ANCHORS: &[&str] = &["from", "join", "into", "update"];
    let mut tables = Vec::new();
    for (i, w) in reversed.iter().enumerate() {
        if i > 0 && ANCHORS.iter().any(|a| w.eq_ignore_ascii_case(a)) {
            let target = reversed[i - 1].trim_matches(|c: char| c == ',' || c == ';');
            let name = target.rsplit_once('.').map(|(_, n)| n).unwrap_or(target);
            if !name.is_empty()
                && name.chars().all(|c| c.is_alphanumeric() || c == '_')
                && !tables.iter().any(|t| t == name)
            {
                tables.push(name.to_string());
            }
        }
    }
    tables
}

fn split_qualifier(word: &str) -> (Option<&str>, &str) {
    match word.rsplit_once('.') {
        Some((qualifier, rest)) => (Some(qualifier), rest),
        None => (None, word),
    }
}

fn relation_kind(kind: ObjectType) -> CandidateKind {
    match kind {
        ObjectType::View | ObjectType::MaterializedView => CandidateKind::View,
        ObjectType::Sequence => CandidateKind::Sequence,
        _ => CandidateKind::Table,
    }
}

fn note(err: &Error, capability: &str) {
    if err.is_degraded() {
        debug!(target: "sqlsh::complete", capability, "source skipped: {err}");
    } else {
        warn!(target: "sqlsh::complete", capability, "metadata query failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn context_tables_follow_anchors() {
        assert_eq!(
            context_tables(&words(&["(", "film", "INTO", "INSERT"])),
            ["film"]
        );
        assert_eq!(
            context_tables(&words(&["SET", "public.actor", "UPDATE"])),
            ["actor"]
        );
        assert_eq!(
            context_tables(&words(&["b", "JOIN", "a", "FROM", "*", "SELECT"])),
            ["b", "a"]
        );
        assert!(context_tables(&words(&["SELECT"])).is_empty());
    }

    #[test]
    fn qualifier_splits_on_last_dot() {
        assert_eq!(split_qualifier("public.fi"), (Some("public"), "fi"));
        assert_eq!(split_qualifier("fi"), (None, "fi"));
        assert_eq!(split_qualifier("public."), (Some("public"), ""));
    }
}
