//! Typed query parameters for metadata readers
//!
//! A `Filter` is an immutable descriptor passed by reference into every
//! capability method; readers never mutate it. Name fields are shell-style
//! glob patterns (`*` and `?`), matched case-insensitively.

use crate::meta::ObjectType;
use regex::Regex;

/// Schemas hidden unless a caller asks for system objects.
pub(crate) const SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "pg_catalog",
    "pg_toast",
    "mysql",
    "performance_schema",
    "sys",
];

pub(crate) fn is_system_schema(schema: &str) -> bool {
    SYSTEM_SCHEMAS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(schema))
}

#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// Catalog name pattern.
    pub catalog: Option<String>,
    /// Schema name pattern.
    pub schema: Option<String>,
    /// Owning object pattern: table for columns/indexes, routine for
    /// routine parameters.
    pub parent: Option<String>,
    /// Secondary owner pattern, e.g. the index for index columns.
    pub reference: Option<String>,
    /// Object name pattern.
    pub name: Option<String>,
    /// Allowed object kinds; empty means any.
    pub types: Vec<ObjectType>,
    /// Include system schemas and objects.
    pub with_system: bool,
    /// Restrict to objects visible without qualification. Readers without
    /// search-path knowledge treat this as a no-op.
    pub only_visible: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a `schema.name` or `name` pattern the way describe commands
    /// accept them.
    pub fn from_pattern(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Self::default();
        }
        match pattern.split_once('.') {
            Some((schema, name)) => Self {
                schema: Some(schema.to_string()),
                name: (!name.is_empty()).then(|| name.to_string()),
                ..Self::default()
            },
            None => Self {
                name: Some(pattern.to_string()),
                ..Self::default()
            },
        }
    }

    pub fn schema(mut self, pattern: impl Into<String>) -> Self {
        self.schema = Some(pattern.into());
        self
    }

    pub fn parent(mut self, pattern: impl Into<String>) -> Self {
        self.parent = Some(pattern.into());
        self
    }

    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }

    pub fn types(mut self, types: &[ObjectType]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn with_system(mut self, with_system: bool) -> Self {
        self.with_system = with_system;
        self
    }

    pub fn only_visible(mut self, only_visible: bool) -> Self {
        self.only_visible = only_visible;
        self
    }

    pub fn matches_catalog(&self, catalog: &str) -> bool {
        matches_opt(&self.catalog, catalog)
    }

    pub fn matches_schema(&self, schema: &str) -> bool {
        if !self.with_system && self.schema.is_none() && is_system_schema(schema) {
            return false;
        }
        matches_opt(&self.schema, schema)
    }

    pub fn matches_parent(&self, parent: &str) -> bool {
        matches_opt(&self.parent, parent)
    }

    pub fn matches_reference(&self, reference: &str) -> bool {
        matches_opt(&self.reference, reference)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        matches_opt(&self.name, name)
    }

    pub fn matches_type(&self, t: ObjectType) -> bool {
        self.types.is_empty() || self.types.contains(&t)
    }
}

fn matches_opt(pattern: &Option<String>, text: &str) -> bool {
    match pattern {
        Some(p) => glob_match(p, text),
        None => true,
    }
}

/// Shell-style glob match: `*` is any run, `?` any single character.
/// Patterns without metacharacters are plain case-insensitive equality.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains(['*', '?']) {
        return pattern.eq_ignore_ascii_case(text);
    }
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    // the pattern is escaped above, so this can only fail on a regex
    // size limit; treat that as a non-match
    Regex::new(&re).map(|r| r.is_match(text)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globs() {
        assert!(glob_match("film", "FILM"));
        assert!(glob_match("film*", "film_actor"));
        assert!(glob_match("*actor", "film_actor"));
        assert!(glob_match("f?lm", "film"));
        assert!(!glob_match("film", "film_actor"));
        assert!(!glob_match("f?lm", "flm"));
    }

    #[test]
    fn pattern_splits_on_dot() {
        let f = Filter::from_pattern("public.film*");
        assert_eq!(f.schema.as_deref(), Some("public"));
        assert_eq!(f.name.as_deref(), Some("film*"));

        let f = Filter::from_pattern("film");
        assert!(f.schema.is_none());
        assert_eq!(f.name.as_deref(), Some("film"));

        let f = Filter::from_pattern("public.");
        assert_eq!(f.schema.as_deref(), Some("public"));
        assert!(f.name.is_none());
    }

    #[test]
    fn system_schemas_are_hidden_by_default() {
        let f = Filter::new();
        assert!(f.matches_schema("public"));
        assert!(!f.matches_schema("information_schema"));
        assert!(f.clone().with_system(true).matches_schema("pg_catalog"));
        // an explicit schema pattern overrides the system hiding
        assert!(f.schema("information_schema").matches_schema("information_schema"));
    }

    #[test]
    fn type_allow_list() {
        let f = Filter::new().types(&[ObjectType::View]);
        assert!(f.matches_type(ObjectType::View));
        assert!(!f.matches_type(ObjectType::Table));
        assert!(Filter::new().matches_type(ObjectType::Table));
    }
}
