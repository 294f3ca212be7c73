//! Typed metadata records shared by all readers and writers
//!
//! Each record kind knows the column set it reports, with an optional
//! verbose variant, so result sets can be rendered without the writer
//! knowing anything about the record's shape.

/// Object kind, used both in records and in filter allow-lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Catalog,
    Schema,
    Table,
    View,
    MaterializedView,
    Sequence,
    SystemTable,
    Function,
    Procedure,
    Index,
    Trigger,
    Constraint,
    Column,
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ObjectType::Catalog => "catalog",
            ObjectType::Schema => "schema",
            ObjectType::Table => "table",
            ObjectType::View => "view",
            ObjectType::MaterializedView => "materialized view",
            ObjectType::Sequence => "sequence",
            ObjectType::SystemTable => "system table",
            ObjectType::Function => "function",
            ObjectType::Procedure => "procedure",
            ObjectType::Index => "index",
            ObjectType::Trigger => "trigger",
            ObjectType::Constraint => "constraint",
            ObjectType::Column => "column",
        };
        write!(f, "{s}")
    }
}

impl ObjectType {
    /// Map an INFORMATION_SCHEMA `table_type` string.
    pub fn from_table_type(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VIEW" => ObjectType::View,
            "MATERIALIZED VIEW" => ObjectType::MaterializedView,
            "SEQUENCE" => ObjectType::Sequence,
            t if t.starts_with("SYSTEM") => ObjectType::SystemTable,
            _ => ObjectType::Table,
        }
    }

    /// Object kinds that may appear in a FROM clause.
    pub const SELECTABLE: &'static [ObjectType] = &[
        ObjectType::Table,
        ObjectType::View,
        ObjectType::MaterializedView,
        ObjectType::Sequence,
    ];

    /// Plain tables only: the targets of DELETE/UPDATE/INSERT.
    pub const TABLE_LIKE: &'static [ObjectType] = &[ObjectType::Table];
}

/// A homogeneous record a result set can hold and a writer can render.
pub trait Record: Clone + Send + Sync {
    fn columns(verbose: bool) -> &'static [&'static str];
    fn values(&self, verbose: bool) -> Vec<String>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    pub name: String,
}

impl Record for Catalog {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Catalog"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![self.name.clone()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub catalog: String,
    pub name: String,
}

impl Record for Schema {
    fn columns(verbose: bool) -> &'static [&'static str] {
        if verbose {
            &["Schema", "Catalog"]
        } else {
            &["Schema"]
        }
    }

    fn values(&self, verbose: bool) -> Vec<String> {
        if verbose {
            vec![self.name.clone(), self.catalog.clone()]
        } else {
            vec![self.name.clone()]
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub kind: ObjectType,
}

impl Table {
    /// Name qualified with its schema, as completion offers it.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl Record for Table {
    fn columns(verbose: bool) -> &'static [&'static str] {
        if verbose {
            &["Schema", "Name", "Type", "Catalog"]
        } else {
            &["Schema", "Name", "Type"]
        }
    }

    fn values(&self, verbose: bool) -> Vec<String> {
        let mut row = vec![
            self.schema.clone(),
            self.name.clone(),
            self.kind.to_string(),
        ];
        if verbose {
            row.push(self.catalog.clone());
        }
        row
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub ordinal: i64,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl Record for Column {
    fn columns(verbose: bool) -> &'static [&'static str] {
        if verbose {
            &["Name", "Type", "Nullable", "Default"]
        } else {
            &["Name", "Type", "Nullable"]
        }
    }

    fn values(&self, verbose: bool) -> Vec<String> {
        let mut row = vec![
            self.name.clone(),
            self.data_type.clone(),
            if self.nullable { "YES" } else { "NO" }.to_string(),
        ];
        if verbose {
            row.push(self.default.clone().unwrap_or_default());
        }
        row
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub unique: bool,
    pub primary: bool,
}

impl Record for Index {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Schema", "Table", "Name", "Unique", "Primary"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.schema.clone(),
            self.table.clone(),
            self.name.clone(),
            yes_no(self.unique),
            yes_no(self.primary),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexColumn {
    pub schema: String,
    pub table: String,
    pub index: String,
    pub name: String,
    pub ordinal: i64,
}

impl Record for IndexColumn {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Index", "Name", "Ordinal"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.index.clone(),
            self.name.clone(),
            self.ordinal.to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub definition: String,
}

impl Record for Trigger {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Schema", "Table", "Name", "Definition"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.schema.clone(),
            self.table.clone(),
            self.name.clone(),
            self.definition.clone(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// `PRIMARY KEY`, `FOREIGN KEY`, `UNIQUE` or `CHECK`.
    pub kind: String,
}

impl Record for Constraint {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Table", "Name", "Type"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![self.table.clone(), self.name.clone(), self.kind.clone()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintColumn {
    pub schema: String,
    pub table: String,
    pub constraint: String,
    pub name: String,
    pub ordinal: i64,
}

impl Record for ConstraintColumn {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Constraint", "Name", "Ordinal"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.constraint.clone(),
            self.name.clone(),
            self.ordinal.to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub catalog: String,
    pub schema: String,
    pub name: String,
    pub specific_name: String,
    /// `FUNCTION` or `PROCEDURE`.
    pub kind: String,
    pub result_type: Option<String>,
}

impl Record for Function {
    fn columns(verbose: bool) -> &'static [&'static str] {
        if verbose {
            &["Schema", "Name", "Result type", "Type", "Specific name"]
        } else {
            &["Schema", "Name", "Result type", "Type"]
        }
    }

    fn values(&self, verbose: bool) -> Vec<String> {
        let mut row = vec![
            self.schema.clone(),
            self.name.clone(),
            self.result_type.clone().unwrap_or_default(),
            self.kind.to_lowercase(),
        ];
        if verbose {
            row.push(self.specific_name.clone());
        }
        row
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionColumn {
    pub schema: String,
    /// `specific_name` of the owning routine.
    pub function: String,
    pub name: String,
    pub ordinal: i64,
    /// `IN`, `OUT` or `INOUT`.
    pub mode: String,
    pub data_type: String,
}

impl Record for FunctionColumn {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Function", "Name", "Mode", "Type"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.function.clone(),
            self.name.clone(),
            self.mode.clone(),
            self.data_type.clone(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub start: i64,
    pub min: i64,
    pub max: i64,
    pub increment: i64,
    pub cycles: bool,
}

impl Record for Sequence {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Schema", "Name", "Type", "Start", "Min", "Max", "Increment", "Cycles"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.schema.clone(),
            self.name.clone(),
            self.data_type.clone(),
            self.start.to_string(),
            self.min.to_string(),
            self.max.to_string(),
            self.increment.to_string(),
            yes_no(self.cycles),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Privilege {
    pub schema: String,
    pub name: String,
    pub grantee: String,
    pub privilege: String,
}

impl Record for Privilege {
    fn columns(_verbose: bool) -> &'static [&'static str] {
        &["Schema", "Name", "Grantee", "Privilege"]
    }

    fn values(&self, _verbose: bool) -> Vec<String> {
        vec![
            self.schema.clone(),
            self.name.clone(),
            self.grantee.clone(),
            self.privilege.clone(),
        ]
    }
}

fn yes_no(v: bool) -> String {
    if v { "yes" } else { "no" }.to_string()
}
