//! Generic INFORMATION_SCHEMA reader
//!
//! Implements the schema, table, column, function, sequence and privilege
//! capabilities over any backend exposing the standard INFORMATION_SCHEMA
//! views. Cheap equality narrowing is pushed into the query when a filter
//! field is a plain name; the glob filters are always re-applied
//! client-side, so a backend that ignores the WHERE clause (or a pattern
//! the SQL cannot express) still yields correct results.
//!
//! Catalogs, indexes and index columns have no portable INFORMATION_SCHEMA
//! representation; those capabilities are left to backend-specific readers
//! composed in front of this one.

use crate::db::{Connection, Value};
use crate::error::Result;
use crate::meta::filter::is_system_schema;
use crate::meta::{
    Column, ColumnReader, Filter, Function, FunctionColumn, FunctionColumnReader, FunctionReader,
    MetaSource, ObjectType, Privilege, PrivilegeReader, ResultSet, Schema, SchemaReader, Sequence,
    SequenceReader, Table, TableReader,
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct InfoSchemaReader {
    conn: Arc<dyn Connection>,
}

impl InfoSchemaReader {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

/// Append `column = ?` narrowing for plain (glob-free) patterns.
fn narrow(
    clauses: &mut Vec<String>,
    params: &mut Vec<Value>,
    column: &str,
    pattern: &Option<String>,
) {
    if let Some(p) = pattern {
        if !p.contains(['*', '?']) {
            clauses.push(format!("{column} = ?"));
            params.push(Value::from(p.clone()));
        }
    }
}

fn build(base: &str, clauses: Vec<String>, order_by: &str) -> String {
    let mut sql = base.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(order_by);
    sql
}

fn text(row: &[Value], i: usize) -> String {
    row.get(i).map(|v| v.text()).unwrap_or_default()
}

fn opt_text(row: &[Value], i: usize) -> Option<String> {
    match row.get(i) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v.text()),
    }
}

fn int(row: &[Value], i: usize) -> i64 {
    row.get(i).and_then(|v| v.to_i64()).unwrap_or_default()
}

fn yes(row: &[Value], i: usize) -> bool {
    text(row, i).eq_ignore_ascii_case("yes")
}

#[async_trait]
impl SchemaReader for InfoSchemaReader {
    async fn schemas(&self, filter: &Filter) -> Result<ResultSet<Schema>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "schema_name", &filter.name);
        let sql = build(
            "SELECT catalog_name, schema_name FROM information_schema.schemata",
            clauses,
            "schema_name",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let schema = Schema {
                catalog: text(&row, 0),
                name: text(&row, 1),
            };
            let hidden =
                !filter.with_system && filter.name.is_none() && is_system_schema(&schema.name);
            if !hidden
                && filter.matches_catalog(&schema.catalog)
                && filter.matches_name(&schema.name)
            {
                out.push(schema);
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ResultSet::new(out))
    }
}

#[async_trait]
impl TableReader for InfoSchemaReader {
    async fn tables(&self, filter: &Filter) -> Result<ResultSet<Table>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "table_schema", &filter.schema);
        narrow(&mut clauses, &mut params, "table_name", &filter.name);
        let sql = build(
            "SELECT table_catalog, table_schema, table_name, table_type \
             FROM information_schema.tables",
            clauses,
            "table_schema, table_name",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let table = Table {
                catalog: text(&row, 0),
                schema: text(&row, 1),
                name: text(&row, 2),
                kind: ObjectType::from_table_type(&text(&row, 3)),
            };
            if filter.matches_catalog(&table.catalog)
                && filter.matches_schema(&table.schema)
                && filter.matches_name(&table.name)
                && filter.matches_type(table.kind)
            {
                out.push(table);
            }
        }
        out.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        Ok(ResultSet::new(out))
    }
}

#[async_trait]
impl ColumnReader for InfoSchemaReader {
    async fn columns(&self, filter: &Filter) -> Result<ResultSet<Column>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "table_schema", &filter.schema);
        narrow(&mut clauses, &mut params, "table_name", &filter.parent);
        let sql = build(
            "SELECT table_catalog, table_schema, table_name, column_name, \
             ordinal_position, data_type, is_nullable, column_default \
             FROM information_schema.columns",
            clauses,
            "table_schema, table_name, ordinal_position",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let column = Column {
                schema: text(&row, 1),
                table: text(&row, 2),
                name: text(&row, 3),
                ordinal: int(&row, 4),
                data_type: text(&row, 5),
                nullable: yes(&row, 6),
                default: opt_text(&row, 7),
            };
            if filter.matches_schema(&column.schema)
                && filter.matches_parent(&column.table)
                && filter.matches_name(&column.name)
            {
                out.push(column);
            }
        }
        out.sort_by(|a, b| {
            (&a.schema, &a.table, a.ordinal).cmp(&(&b.schema, &b.table, b.ordinal))
        });
        Ok(ResultSet::new(out))
    }
}

#[async_trait]
impl FunctionReader for InfoSchemaReader {
    async fn functions(&self, filter: &Filter) -> Result<ResultSet<Function>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "routine_schema", &filter.schema);
        narrow(&mut clauses, &mut params, "routine_name", &filter.name);
        let sql = build(
            "SELECT specific_name, routine_catalog, routine_schema, routine_name, \
             routine_type, data_type FROM information_schema.routines",
            clauses,
            "routine_schema, routine_name",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let function = Function {
                specific_name: text(&row, 0),
                catalog: text(&row, 1),
                schema: text(&row, 2),
                name: text(&row, 3),
                kind: text(&row, 4),
                result_type: opt_text(&row, 5),
            };
            let kind = if function.kind.eq_ignore_ascii_case("procedure") {
                ObjectType::Procedure
            } else {
                ObjectType::Function
            };
            if filter.matches_schema(&function.schema)
                && filter.matches_name(&function.name)
                && filter.matches_type(kind)
            {
                out.push(function);
            }
        }
        out.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        Ok(ResultSet::new(out))
    }
}

#[async_trait]
impl FunctionColumnReader for InfoSchemaReader {
    async fn function_columns(&self, filter: &Filter) -> Result<ResultSet<FunctionColumn>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "specific_schema", &filter.schema);
        narrow(&mut clauses, &mut params, "specific_name", &filter.parent);
        let sql = build(
            "SELECT specific_schema, specific_name, ordinal_position, \
             parameter_mode, parameter_name, data_type \
             FROM information_schema.parameters",
            clauses,
            "specific_name, ordinal_position",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let param = FunctionColumn {
                schema: text(&row, 0),
                function: text(&row, 1),
                ordinal: int(&row, 2),
                mode: text(&row, 3),
                name: text(&row, 4),
                data_type: text(&row, 5),
            };
            if filter.matches_schema(&param.schema) && filter.matches_parent(&param.function) {
                out.push(param);
            }
        }
        out.sort_by(|a, b| (&a.function, a.ordinal).cmp(&(&b.function, b.ordinal)));
        Ok(ResultSet::new(out))
    }
}

#[async_trait]
impl SequenceReader for InfoSchemaReader {
    async fn sequences(&self, filter: &Filter) -> Result<ResultSet<Sequence>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "sequence_schema", &filter.schema);
        narrow(&mut clauses, &mut params, "sequence_name", &filter.name);
        let sql = build(
            "SELECT sequence_catalog, sequence_schema, sequence_name, data_type, \
             start_value, minimum_value, maximum_value, increment, cycle_option \
             FROM information_schema.sequences",
            clauses,
            "sequence_schema, sequence_name",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let sequence = Sequence {
                schema: text(&row, 1),
                name: text(&row, 2),
                data_type: text(&row, 3),
                start: int(&row, 4),
                min: int(&row, 5),
                max: int(&row, 6),
                increment: int(&row, 7),
                cycles: yes(&row, 8),
            };
            if filter.matches_schema(&sequence.schema) && filter.matches_name(&sequence.name) {
                out.push(sequence);
            }
        }
        out.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        Ok(ResultSet::new(out))
    }
}

#[async_trait]
impl PrivilegeReader for InfoSchemaReader {
    async fn privileges(&self, filter: &Filter) -> Result<ResultSet<Privilege>> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        narrow(&mut clauses, &mut params, "table_schema", &filter.schema);
        narrow(&mut clauses, &mut params, "table_name", &filter.name);
        let sql = build(
            "SELECT table_catalog, table_schema, table_name, grantee, privilege_type \
             FROM information_schema.table_privileges",
            clauses,
            "table_schema, table_name, grantee",
        );

        let mut rows = self.conn.query(&sql, &params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row() {
            let privilege = Privilege {
                schema: text(&row, 1),
                name: text(&row, 2),
                grantee: text(&row, 3),
                privilege: text(&row, 4),
            };
            if filter.matches_schema(&privilege.schema) && filter.matches_name(&privilege.name) {
                out.push(privilege);
            }
        }
        out.sort_by(|a, b| {
            (&a.schema, &a.name, &a.grantee).cmp(&(&b.schema, &b.name, &b.grantee))
        });
        Ok(ResultSet::new(out))
    }
}

impl MetaSource for InfoSchemaReader {
    fn schema_reader(&self) -> Option<&dyn SchemaReader> {
        Some(self)
    }
    fn table_reader(&self) -> Option<&dyn TableReader> {
        Some(self)
    }
    fn column_reader(&self) -> Option<&dyn ColumnReader> {
        Some(self)
    }
    fn function_reader(&self) -> Option<&dyn FunctionReader> {
        Some(self)
    }
    fn function_column_reader(&self) -> Option<&dyn FunctionColumnReader> {
        Some(self)
    }
    fn sequence_reader(&self) -> Option<&dyn SequenceReader> {
        Some(self)
    }
    fn privilege_reader(&self) -> Option<&dyn PrivilegeReader> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemConn;

    fn reader() -> InfoSchemaReader {
        InfoSchemaReader::new(Arc::new(MemConn::with_sample_catalog()))
    }

    #[tokio::test]
    async fn schemas_hide_system_by_default() {
        let mut rs = reader().schemas(&Filter::new()).await.unwrap();
        let names: Vec<String> = rs.collect_remaining().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, ["audit", "public"]);

        let rs = reader()
            .schemas(&Filter::new().with_system(true))
            .await
            .unwrap();
        assert_eq!(rs.len(), 3);
    }

    #[tokio::test]
    async fn tables_filter_by_glob_and_type() {
        let mut rs = reader()
            .tables(&Filter::new().name("film*"))
            .await
            .unwrap();
        let names: Vec<String> = rs.collect_remaining().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, ["film", "film_actor", "film_list"]);

        let mut rs = reader()
            .tables(&Filter::new().types(&[ObjectType::View]))
            .await
            .unwrap();
        let views = rs.collect_remaining();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "film_list");
    }

    #[tokio::test]
    async fn columns_of_one_table_in_order() {
        let mut rs = reader()
            .columns(&Filter::new().parent("film"))
            .await
            .unwrap();
        let cols = rs.collect_remaining();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].name, "film_id");
        assert_eq!(cols[0].ordinal, 1);
        assert!(cols[0].default.is_some());
        assert_eq!(cols[1].name, "title");
    }

    #[tokio::test]
    async fn functions_and_parameters() {
        let mut rs = reader().functions(&Filter::new()).await.unwrap();
        let funcs = rs.collect_remaining();
        assert_eq!(funcs.len(), 2);

        let only_procs = reader()
            .functions(&Filter::new().types(&[ObjectType::Procedure]))
            .await
            .unwrap();
        assert_eq!(only_procs.len(), 1);

        let mut rs = reader()
            .function_columns(&Filter::new().parent("film_in_stock"))
            .await
            .unwrap();
        let params = rs.collect_remaining();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "p_film_id");
        assert_eq!(params[0].mode, "IN");
    }

    #[tokio::test]
    async fn sequences_and_privileges() {
        let rs = reader()
            .sequences(&Filter::new().schema("public"))
            .await
            .unwrap();
        assert_eq!(rs.len(), 1);

        let rs = reader()
            .privileges(&Filter::new().name("film"))
            .await
            .unwrap();
        assert_eq!(rs.len(), 2);
    }
}
