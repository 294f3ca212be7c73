//! In-memory reference backend
//!
//! Serves a canned catalog through the same contract real drivers satisfy.
//! INFORMATION_SCHEMA queries are answered from the catalog, so the
//! metadata readers, describe writers and tab completion all work without a
//! live server. WHERE clauses are not evaluated here; the metadata reader
//! applies its filters client-side.

use crate::db::{Connection, Driver, ExecResult, Rows, Value};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub struct MemDriver;

#[async_trait]
impl Driver for MemDriver {
    fn name(&self) -> &'static str {
        "mem"
    }

    async fn open(&self, _url: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(MemConn::with_sample_catalog()))
    }
}

#[derive(Clone, Debug)]
pub struct MemColumn {
    pub name: &'static str,
    pub data_type: &'static str,
    pub nullable: bool,
    pub default: Option<&'static str>,
}

#[derive(Clone, Debug)]
pub struct MemTable {
    pub schema: &'static str,
    pub name: &'static str,
    /// INFORMATION_SCHEMA table_type: `BASE TABLE` or `VIEW`.
    pub kind: &'static str,
    pub columns: Vec<MemColumn>,
}

#[derive(Clone, Debug)]
pub struct MemRoutine {
    pub schema: &'static str,
    pub name: &'static str,
    /// `FUNCTION` or `PROCEDURE`.
    pub kind: &'static str,
    pub result_type: Option<&'static str>,
    /// (mode, name, data_type) triples in declaration order.
    pub params: Vec<(&'static str, &'static str, &'static str)>,
}

#[derive(Clone, Debug)]
pub struct MemSequence {
    pub schema: &'static str,
    pub name: &'static str,
    pub data_type: &'static str,
    pub start: i64,
    pub min: i64,
    pub max: i64,
    pub increment: i64,
    pub cycles: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MemCatalog {
    pub name: String,
    pub schemata: Vec<&'static str>,
    pub tables: Vec<MemTable>,
    pub routines: Vec<MemRoutine>,
    pub sequences: Vec<MemSequence>,
    /// (schema, table, grantee, privilege) rows.
    pub privileges: Vec<(&'static str, &'static str, &'static str, &'static str)>,
}

impl MemCatalog {
    /// A small film-rental catalog with enough variety to exercise every
    /// reader the shell composes: two user schemas, a view, functions, a
    /// procedure and sequences.
    pub fn sample() -> Self {
        fn col(name: &'static str, data_type: &'static str) -> MemColumn {
            MemColumn {
                name,
                data_type,
                nullable: false,
                default: None,
            }
        }

        Self {
            name: "mem".to_string(),
            schemata: vec!["public", "audit", "information_schema"],
            tables: vec![
                MemTable {
                    schema: "public",
                    name: "film",
                    kind: "BASE TABLE",
                    columns: vec![
                        MemColumn {
                            name: "film_id",
                            data_type: "integer",
                            nullable: false,
                            default: Some("nextval('film_film_id_seq')"),
                        },
                        col("title", "varchar"),
                        MemColumn {
                            name: "release_year",
                            data_type: "integer",
                            nullable: true,
                            default: None,
                        },
                        col("language_id", "integer"),
                    ],
                },
                MemTable {
                    schema: "public",
                    name: "actor",
                    kind: "BASE TABLE",
                    columns: vec![
                        col("actor_id", "integer"),
                        col("first_name", "varchar"),
                        col("last_name", "varchar"),
                    ],
                },
                MemTable {
                    schema: "public",
                    name: "film_actor",
                    kind: "BASE TABLE",
                    columns: vec![
                        col("actor_id", "integer"),
                        col("film_id", "integer"),
                        col("last_update", "timestamp"),
                    ],
                },
                MemTable {
                    schema: "public",
                    name: "city",
                    kind: "BASE TABLE",
                    columns: vec![
                        col("city_id", "integer"),
                        col("city", "varchar"),
                        col("country_id", "integer"),
                    ],
                },
                MemTable {
                    schema: "public",
                    name: "film_list",
                    kind: "VIEW",
                    columns: vec![
                        col("fid", "integer"),
                        col("title", "varchar"),
                        col("category", "varchar"),
                    ],
                },
                MemTable {
                    schema: "audit",
                    name: "log",
                    kind: "BASE TABLE",
                    columns: vec![
                        col("log_id", "integer"),
                        col("logged_at", "timestamp"),
                        col("message", "text"),
                    ],
                },
            ],
            routines: vec![
                MemRoutine {
                    schema: "public",
                    name: "film_in_stock",
                    kind: "FUNCTION",
                    result_type: Some("integer"),
                    params: vec![
                        ("IN", "p_film_id", "integer"),
                        ("IN", "p_store_id", "integer"),
                    ],
                },
                MemRoutine {
                    schema: "public",
                    name: "rewind",
                    kind: "PROCEDURE",
                    result_type: None,
                    params: vec![("IN", "p_film_id", "integer")],
                },
            ],
            sequences: vec![
                MemSequence {
                    schema: "public",
                    name: "film_film_id_seq",
                    data_type: "bigint",
                    start: 1,
                    min: 1,
                    max: i64::MAX,
                    increment: 1,
                    cycles: false,
                },
                MemSequence {
                    schema: "audit",
                    name: "log_id_seq",
                    data_type: "bigint",
                    start: 1,
                    min: 1,
                    max: i64::MAX,
                    increment: 1,
                    cycles: false,
                },
            ],
            privileges: vec![
                ("public", "film", "sqlsh", "SELECT"),
                ("public", "film", "sqlsh", "INSERT"),
                ("public", "actor", "sqlsh", "SELECT"),
            ],
        }
    }
}

/// A connection over a [`MemCatalog`].
pub struct MemConn {
    catalog: MemCatalog,
}

impl MemConn {
    pub fn new(catalog: MemCatalog) -> Self {
        Self { catalog }
    }

    pub fn with_sample_catalog() -> Self {
        Self::new(MemCatalog::sample())
    }

    fn schemata_rows(&self) -> Rows {
        let rows = self
            .catalog
            .schemata
            .iter()
            .map(|s| vec![Value::from(self.catalog.name.clone()), Value::from(*s)])
            .collect();
        Rows::new(names(&["catalog_name", "schema_name"]), rows)
    }

    fn table_rows(&self) -> Rows {
        let rows = self
            .catalog
            .tables
            .iter()
            .map(|t| {
                vec![
                    Value::from(self.catalog.name.clone()),
                    Value::from(t.schema),
                    Value::from(t.name),
                    Value::from(t.kind),
                ]
            })
            .collect();
        Rows::new(
            names(&["table_catalog", "table_schema", "table_name", "table_type"]),
            rows,
        )
    }

    fn column_rows(&self) -> Rows {
        let mut rows = Vec::new();
        for table in &self.catalog.tables {
            for (ordinal, c) in table.columns.iter().enumerate() {
                rows.push(vec![
                    Value::from(self.catalog.name.clone()),
                    Value::from(table.schema),
                    Value::from(table.name),
                    Value::from(c.name),
                    Value::Int(ordinal as i64 + 1),
                    Value::from(c.data_type),
                    Value::from(if c.nullable { "YES" } else { "NO" }),
                    c.default.map(Value::from).unwrap_or(Value::Null),
                ]);
            }
        }
        Rows::new(
            names(&[
                "table_catalog",
                "table_schema",
                "table_name",
                "column_name",
                "ordinal_position",
                "data_type",
                "is_nullable",
                "column_default",
            ]),
            rows,
        )
    }

    fn routine_rows(&self) -> Rows {
        let rows = self
            .catalog
            .routines
            .iter()
            .map(|r| {
                vec![
                    Value::from(r.name),
                    Value::from(self.catalog.name.clone()),
                    Value::from(r.schema),
                    Value::from(r.name),
                    Value::from(r.kind),
                    r.result_type.map(Value::from).unwrap_or(Value::Null),
                ]
            })
            .collect();
        Rows::new(
            names(&[
                "specific_name",
                "routine_catalog",
                "routine_schema",
                "routine_name",
                "routine_type",
                "data_type",
            ]),
            rows,
        )
    }

    fn parameter_rows(&self) -> Rows {
        let mut rows = Vec::new();
        for routine in &self.catalog.routines {
            for (ordinal, (mode, name, data_type)) in routine.params.iter().enumerate() {
                rows.push(vec![
                    Value::from(routine.schema),
                    Value::from(routine.name),
                    Value::Int(ordinal as i64 + 1),
                    Value::from(*mode),
                    Value::from(*name),
                    Value::from(*data_type),
                ]);
            }
        }
        Rows::new(
            names(&[
                "specific_schema",
                "specific_name",
                "ordinal_position",
                "parameter_mode",
                "parameter_name",
                "data_type",
            ]),
            rows,
        )
    }

    fn sequence_rows(&self) -> Rows {
        let rows = self
            .catalog
            .sequences
            .iter()
            .map(|s| {
                vec![
                    Value::from(self.catalog.name.clone()),
                    Value::from(s.schema),
                    Value::from(s.name),
                    Value::from(s.data_type),
                    Value::Int(s.start),
                    Value::Int(s.min),
                    Value::Int(s.max),
                    Value::Int(s.increment),
                    Value::from(if s.cycles { "YES" } else { "NO" }),
                ]
            })
            .collect();
        Rows::new(
            names(&[
                "sequence_catalog",
                "sequence_schema",
                "sequence_name",
                "data_type",
                "start_value",
                "minimum_value",
                "maximum_value",
                "increment",
                "cycle_option",
            ]),
            rows,
        )
    }

    fn privilege_rows(&self) -> Rows {
        let rows = self
            .catalog
            .privileges
            .iter()
            .map(|(schema, table, grantee, privilege)| {
                vec![
                    Value::from(self.catalog.name.clone()),
                    Value::from(*schema),
                    Value::from(*table),
                    Value::from(*grantee),
                    Value::from(*privilege),
                ]
            })
            .collect();
        Rows::new(
            names(&[
                "table_catalog",
                "table_schema",
                "table_name",
                "grantee",
                "privilege_type",
            ]),
            rows,
        )
    }
}

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

#[async_trait]
impl Connection for MemConn {
    async fn query(&self, sql: &str, _params: &[Value]) -> Result<Rows> {
        let q = sql.to_ascii_lowercase();
        let rows = if q.contains("information_schema.schemata") {
            self.schemata_rows()
        } else if q.contains("information_schema.tables") {
            self.table_rows()
        } else if q.contains("information_schema.columns") {
            self.column_rows()
        } else if q.contains("information_schema.parameters") {
            self.parameter_rows()
        } else if q.contains("information_schema.routines") {
            self.routine_rows()
        } else if q.contains("information_schema.sequences") {
            self.sequence_rows()
        } else if q.contains("information_schema.table_privileges") {
            self.privilege_rows()
        } else if q.contains("version()") {
            Rows::new(
                names(&["version"]),
                vec![vec![Value::from("sqlsh in-memory backend")]],
            )
        } else {
            // not a real executor; plain SQL yields nothing
            Rows::empty()
        };
        Ok(rows)
    }

    async fn exec(&self, _sql: &str, _params: &[Value]) -> Result<ExecResult> {
        Ok(ExecResult {
            rows_affected: 0,
            elapsed: Duration::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_information_schema() {
        let conn = MemConn::with_sample_catalog();
        let rows = conn
            .query("SELECT * FROM information_schema.tables", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 6);

        let rows = conn
            .query("SELECT * FROM information_schema.schemata", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn plain_sql_is_inert() {
        let conn = MemConn::with_sample_catalog();
        let rows = conn.query("SELECT * FROM film", &[]).await.unwrap();
        assert!(rows.is_empty());
    }
}
