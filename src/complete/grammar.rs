//! Completion grammar patterns
//!
//! An ordered table of word-pattern sequences and the suggestion rules
//! they trigger. Patterns are tail-matched against the reversed sequence of
//! previously typed words; the first matching entry wins. SQL patterns
//! match case-insensitively, backslash commands case-sensitively.

/// A single word pattern.
#[derive(Clone, Copy, Debug)]
pub enum WordPat {
    /// Exact word.
    Lit(&'static str),
    /// Any of the listed words.
    Alt(&'static [&'static str]),
    /// Word beginning with the fragment (`foo*`).
    StartsWith(&'static str),
    /// Word ending with the fragment (`*foo`).
    EndsWith(&'static str),
    /// Any word except this one.
    Not(&'static str),
    /// Any word at all.
    Any,
}

impl WordPat {
    pub fn matches(&self, word: &str, case_insensitive: bool) -> bool {
        let eq = |a: &str, b: &str| {
            if case_insensitive {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        };
        match self {
            WordPat::Lit(lit) => eq(lit, word),
            WordPat::Alt(alts) => alts.iter().any(|lit| eq(lit, word)),
            WordPat::StartsWith(fragment) => {
                if case_insensitive {
                    word.len() >= fragment.len()
                        && word.is_char_boundary(fragment.len())
                        && word[..fragment.len()].eq_ignore_ascii_case(fragment)
                } else {
                    word.starts_with(fragment)
                }
            }
            WordPat::EndsWith(fragment) => {
                if case_insensitive {
                    word.len() >= fragment.len()
                        && word.is_char_boundary(word.len() - fragment.len())
                        && word[word.len() - fragment.len()..].eq_ignore_ascii_case(fragment)
                } else {
                    word.ends_with(fragment)
                }
            }
            WordPat::Not(lit) => !eq(lit, word),
            WordPat::Any => true,
        }
    }
}

/// What a matched rule suggests.
#[derive(Clone, Copy, Debug)]
pub enum RuleAction {
    /// A fixed keyword list.
    Keywords(&'static [&'static str]),
    /// Tables, views, materialized views and sequences — FROM targets.
    Selectables,
    /// Plain tables only — DELETE/UPDATE/TRUNCATE targets.
    TablesOnly,
    /// INSERT targets.
    Insertables,
    /// Column names of the tables referenced by the statement so far.
    Attributes,
    /// Schema (and catalog) names.
    Namespaces,
    /// Callable routines.
    Functions,
}

pub struct CompletionRule {
    pub pats: &'static [WordPat],
    pub case_insensitive: bool,
    pub actions: &'static [RuleAction],
}

impl CompletionRule {
    /// Tail-match against the reversed previous words: the last pattern
    /// token is compared to the most recent word, and so on backwards.
    pub fn matches(&self, reversed: &[String]) -> bool {
        if reversed.len() < self.pats.len() {
            return false;
        }
        self.pats
            .iter()
            .rev()
            .zip(reversed.iter())
            .all(|(pat, word)| pat.matches(word, self.case_insensitive))
    }
}

/// Keywords that may start a statement or follow most contexts.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT INTO", "UPDATE", "DELETE FROM", "CREATE", "DROP", "ALTER", "TRUNCATE",
    "WITH", "EXPLAIN", "BEGIN", "COMMIT", "ROLLBACK", "GRANT", "REVOKE", "VALUES", "SET",
];

/// Keywords offered right after SELECT.
pub const SELECT_KEYWORDS: &[&str] = &["*", "DISTINCT", "ALL"];

/// Condition keywords offered in WHERE-like contexts.
pub const CONDITION_KEYWORDS: &[&str] = &[
    "AND", "OR", "NOT", "IN", "LIKE", "BETWEEN", "EXISTS", "IS NULL", "IS NOT NULL",
];

/// Keywords after a complete INSERT column list.
const AFTER_COLUMN_LIST: &[&str] = &["VALUES", "SELECT"];

/// Backslash command names the shell understands, in listing order.
pub const COMMANDS: &[&str] = &[
    "?", "c", "d", "d+", "df", "df+", "di", "dm", "dn", "dn+", "dp", "ds", "dt", "dt+", "dv",
    "echo", "g", "l", "p", "q", "quit", "r", "set", "unset",
];

/// The pattern table, consulted top to bottom; the first hit wins.
pub fn rules() -> &'static [CompletionRule] {
    const RULES: &[CompletionRule] = &[
        // INSERT INTO film (a, b) | — the column list is closed
        CompletionRule {
            pats: &[
                WordPat::Lit("INSERT"),
                WordPat::Lit("INTO"),
                WordPat::Any,
                WordPat::EndsWith(")"),
            ],
            case_insensitive: true,
            actions: &[RuleAction::Keywords(AFTER_COLUMN_LIST)],
        },
        // INSERT INTO film ( | — inside the column list
        CompletionRule {
            pats: &[
                WordPat::Lit("INSERT"),
                WordPat::Lit("INTO"),
                WordPat::Any,
                WordPat::StartsWith("("),
            ],
            case_insensitive: true,
            actions: &[RuleAction::Attributes],
        },
        // UPDATE film SET |
        CompletionRule {
            pats: &[WordPat::Lit("UPDATE"), WordPat::Any, WordPat::Lit("SET")],
            case_insensitive: true,
            actions: &[RuleAction::Attributes],
        },
        // DELETE FROM | — plain tables only
        CompletionRule {
            pats: &[WordPat::Lit("DELETE"), WordPat::Lit("FROM")],
            case_insensitive: true,
            actions: &[RuleAction::TablesOnly],
        },
        // INSERT INTO |
        CompletionRule {
            pats: &[WordPat::Lit("INSERT"), WordPat::Lit("INTO")],
            case_insensitive: true,
            actions: &[RuleAction::Insertables],
        },
        // TABLE preceded by anything but CREATE names an existing table
        CompletionRule {
            pats: &[WordPat::Not("CREATE"), WordPat::Lit("TABLE")],
            case_insensitive: true,
            actions: &[RuleAction::TablesOnly],
        },
        // DROP/ALTER SCHEMA |
        CompletionRule {
            pats: &[
                WordPat::Alt(&["DROP", "ALTER"]),
                WordPat::Lit("SCHEMA"),
            ],
            case_insensitive: true,
            actions: &[RuleAction::Namespaces],
        },
        // FROM / JOIN take any selectable, possibly schema-qualified
        CompletionRule {
            pats: &[WordPat::Alt(&["FROM", "JOIN"])],
            case_insensitive: true,
            actions: &[RuleAction::Selectables, RuleAction::Namespaces],
        },
        // UPDATE |
        CompletionRule {
            pats: &[WordPat::Lit("UPDATE")],
            case_insensitive: true,
            actions: &[RuleAction::TablesOnly],
        },
        CompletionRule {
            pats: &[WordPat::Lit("TRUNCATE")],
            case_insensitive: true,
            actions: &[RuleAction::TablesOnly],
        },
        // column contexts
        CompletionRule {
            pats: &[WordPat::Alt(&["WHERE", "AND", "OR", "ON", "HAVING"])],
            case_insensitive: true,
            actions: &[RuleAction::Attributes, RuleAction::Keywords(CONDITION_KEYWORDS)],
        },
        CompletionRule {
            pats: &[
                WordPat::Alt(&["GROUP", "ORDER"]),
                WordPat::Lit("BY"),
            ],
            case_insensitive: true,
            actions: &[RuleAction::Attributes],
        },
        CompletionRule {
            pats: &[WordPat::Lit("SELECT")],
            case_insensitive: true,
            actions: &[
                RuleAction::Keywords(SELECT_KEYWORDS),
                RuleAction::Functions,
                RuleAction::Attributes,
            ],
        },
        CompletionRule {
            pats: &[WordPat::Alt(&["CALL", "EXEC", "EXECUTE"])],
            case_insensitive: true,
            actions: &[RuleAction::Functions],
        },
        // fallback: statement starters
        CompletionRule {
            pats: &[],
            case_insensitive: true,
            actions: &[RuleAction::Keywords(STATEMENT_KEYWORDS)],
        },
    ];
    RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn first_match(reversed: &[String]) -> &'static CompletionRule {
        rules()
            .iter()
            .find(|r| r.matches(reversed))
            .expect("fallback rule always matches")
    }

    #[test]
    fn word_patterns() {
        assert!(WordPat::Lit("FROM").matches("from", true));
        assert!(!WordPat::Lit("FROM").matches("from", false));
        assert!(WordPat::Alt(&["A", "B"]).matches("b", true));
        assert!(WordPat::StartsWith("(").matches("(col,", true));
        assert!(WordPat::EndsWith(")").matches("(a,b)", true));
        assert!(WordPat::Not("CREATE").matches("DROP", true));
        assert!(!WordPat::Not("CREATE").matches("create", true));
        assert!(WordPat::Any.matches("anything", true));
    }

    #[test]
    fn delete_from_picks_tables_only() {
        let rule = first_match(&words(&["FROM", "DELETE"]));
        assert!(matches!(rule.actions[0], RuleAction::TablesOnly));
    }

    #[test]
    fn insert_column_list_picks_attributes() {
        let rule = first_match(&words(&["(", "film", "INTO", "INSERT"]));
        assert!(matches!(rule.actions[0], RuleAction::Attributes));

        // closed list falls through to VALUES/SELECT
        let rule = first_match(&words(&["(a,b)", "film", "INTO", "INSERT"]));
        assert!(matches!(rule.actions[0], RuleAction::Keywords(_)));
    }

    #[test]
    fn from_matches_with_longer_history() {
        let rule = first_match(&words(&["FROM", "*", "SELECT"]));
        assert!(matches!(rule.actions[0], RuleAction::Selectables));
    }

    #[test]
    fn table_after_drop_but_not_create() {
        let rule = first_match(&words(&["TABLE", "DROP"]));
        assert!(matches!(rule.actions[0], RuleAction::TablesOnly));

        let rule = first_match(&words(&["TABLE", "CREATE"]));
        // falls through to the statement-keyword fallback
        assert!(matches!(rule.actions[0], RuleAction::Keywords(_)));
    }

    #[test]
    fn empty_history_hits_fallback() {
        let rule = first_match(&words(&[]));
        assert!(
            matches!(rule.actions[0], RuleAction::Keywords(k) if k == STATEMENT_KEYWORDS)
        );
    }
}
