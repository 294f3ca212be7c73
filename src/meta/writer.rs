//! Describe and list writers
//!
//! Render the composed reader's answers as formatted tables for the
//! `\d`-family commands. A capability the reader lacks skips its section
//! silently; backend failures propagate.

use crate::error::Result;
use crate::meta::{
    CatalogReader, ColumnReader, ConstraintReader, Filter, FunctionColumnReader, FunctionReader,
    IndexReader, ObjectType, PluginReader, PrivilegeReader, Record, ResultSet, SchemaReader,
    SequenceReader, TableReader,
};
use comfy_table::{Attribute, Cell, ContentArrangement};
use std::io::Write;

fn table_shell() -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn render<T: Record>(rs: &mut ResultSet<T>, out: &mut dyn Write) -> Result<()> {
    let mut table = table_shell();
    table.set_header(
        rs.columns()
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );
    rs.reset();
    while rs.advance() {
        table.add_row(rs.current()?.values(rs.verbose()));
    }
    writeln!(out, "{table}")?;
    Ok(())
}

/// List catalogs (`\l`).
pub async fn list_catalogs(reader: &PluginReader, out: &mut dyn Write) -> Result<()> {
    match reader.catalogs(&Filter::new()).await {
        Ok(mut rs) => render(&mut rs, out),
        Err(e) if e.is_degraded() => {
            writeln!(out, "catalog listing is not supported by this backend")?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// List schemas (`\dn`).
pub async fn list_schemas(
    reader: &PluginReader,
    pattern: &str,
    verbose: bool,
    with_system: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut filter = Filter::new().with_system(with_system);
    if !pattern.is_empty() {
        filter = filter.name(pattern);
    }
    let mut rs = reader.schemas(&filter).await?;
    rs.set_verbose(verbose);
    render(&mut rs, out)
}

/// List relations of the given kinds (`\dt`, `\dv`, `\dm`, `\ds`).
pub async fn list_tables(
    reader: &PluginReader,
    kinds: &[ObjectType],
    pattern: &str,
    verbose: bool,
    with_system: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let filter = Filter::from_pattern(pattern)
        .types(kinds)
        .with_system(with_system);
    let mut wrote = false;

    match reader.tables(&filter).await {
        Ok(mut rs) if !rs.is_empty() => {
            rs.set_verbose(verbose);
            render(&mut rs, out)?;
            wrote = true;
        }
        Ok(_) => {}
        Err(e) if e.is_degraded() => {}
        Err(e) => return Err(e),
    }

    // sequences are listed through their own capability when asked for
    if kinds.contains(&ObjectType::Sequence) {
        match reader.sequences(&filter).await {
            Ok(mut seqs) if !seqs.is_empty() => {
                render(&mut seqs, out)?;
                wrote = true;
            }
            Ok(_) => {}
            Err(e) if e.is_degraded() => {}
            Err(e) => return Err(e),
        }
    }

    if !wrote {
        writeln!(out, "Did not find any matching relations.")?;
    }
    Ok(())
}

/// Describe each relation matching the pattern: columns, then indexes and
/// constraints when the composed reader can answer for them (`\d`).
pub async fn describe_table_details(
    reader: &PluginReader,
    pattern: &str,
    verbose: bool,
    with_system: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let filter = Filter::from_pattern(pattern).with_system(with_system);
    let mut tables = match reader.tables(&filter).await {
        Ok(rs) => rs,
        Err(e) if e.is_degraded() => {
            writeln!(out, "Did not find any relation named \"{pattern}\".")?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let matches = tables.collect_remaining();
    if matches.is_empty() {
        writeln!(out, "Did not find any relation named \"{pattern}\".")?;
        return Ok(());
    }

    for table in matches {
        writeln!(out, "{} \"{}.{}\"", title(table.kind), table.schema, table.name)?;

        let owned = Filter::new()
            .schema(table.schema.clone())
            .parent(table.name.clone())
            .with_system(with_system);

        match reader.columns(&owned).await {
            Ok(mut cols) => {
                cols.set_verbose(verbose);
                render(&mut cols, out)?;
            }
            Err(e) if e.is_degraded() => {}
            Err(e) => return Err(e),
        }

        match reader.indexes(&owned).await {
            Ok(mut idx) if !idx.is_empty() => {
                writeln!(out, "Indexes:")?;
                render(&mut idx, out)?;
            }
            Ok(_) => {}
            Err(e) if e.is_degraded() => {}
            Err(e) => return Err(e),
        }

        match reader.constraints(&owned).await {
            Ok(mut cons) if !cons.is_empty() => {
                writeln!(out, "Constraints:")?;
                render(&mut cons, out)?;
            }
            Ok(_) => {}
            Err(e) if e.is_degraded() => {}
            Err(e) => return Err(e),
        }

        writeln!(out)?;
    }
    Ok(())
}

/// List functions; verbose adds the argument list assembled from the
/// function-column capability (`\df`).
pub async fn describe_functions(
    reader: &PluginReader,
    pattern: &str,
    verbose: bool,
    with_system: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let filter = Filter::from_pattern(pattern).with_system(with_system);
    let mut rs = match reader.functions(&filter).await {
        Ok(rs) => rs,
        Err(e) if e.is_degraded() => {
            writeln!(out, "Did not find any matching functions.")?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let functions = rs.collect_remaining();
    if functions.is_empty() {
        writeln!(out, "Did not find any matching functions.")?;
        return Ok(());
    }

    let mut table = table_shell();
    let mut header = vec!["Schema", "Name", "Result type"];
    if verbose {
        header.push("Argument types");
    }
    header.push("Type");
    table.set_header(
        header
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );

    for f in functions {
        let mut row = vec![
            f.schema.clone(),
            f.name.clone(),
            f.result_type.clone().unwrap_or_default(),
        ];
        if verbose {
            row.push(function_args(reader, &f.specific_name).await?);
        }
        row.push(f.kind.to_lowercase());
        table.add_row(row);
    }
    writeln!(out, "{table}")?;
    Ok(())
}

/// Assemble `mode name type` argument text for one routine; a missing
/// function-column capability yields an empty list.
async fn function_args(reader: &PluginReader, specific_name: &str) -> Result<String> {
    let filter = Filter::new().parent(specific_name);
    match reader.function_columns(&filter).await {
        Ok(mut rs) => {
            let mut parts = Vec::new();
            while rs.advance() {
                let p = rs.current()?;
                if p.mode.eq_ignore_ascii_case("in") {
                    parts.push(format!("{} {}", p.name, p.data_type));
                } else {
                    parts.push(format!("{} {} {}", p.mode, p.name, p.data_type));
                }
            }
            Ok(parts.join(", "))
        }
        Err(e) if e.is_degraded() => Ok(String::new()),
        Err(e) => Err(e),
    }
}

/// List indexes (`\di`).
pub async fn list_indexes(
    reader: &PluginReader,
    pattern: &str,
    with_system: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let filter = Filter::from_pattern(pattern).with_system(with_system);
    match reader.indexes(&filter).await {
        Ok(mut rs) => render(&mut rs, out),
        Err(e) if e.is_degraded() => {
            writeln!(out, "index listing is not supported by this backend")?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// List privilege summaries (`\dp`).
pub async fn list_privileges(
    reader: &PluginReader,
    pattern: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let filter = Filter::from_pattern(pattern);
    match reader.privileges(&filter).await {
        Ok(mut rs) => render(&mut rs, out),
        Err(e) if e.is_degraded() => {
            writeln!(out, "privilege listing is not supported by this backend")?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn title(kind: ObjectType) -> &'static str {
    match kind {
        ObjectType::View => "View",
        ObjectType::MaterializedView => "Materialized view",
        ObjectType::Sequence => "Sequence",
        ObjectType::SystemTable => "System table",
        _ => "Table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemConn;
    use crate::meta::{Index, InfoSchemaReader, MetaSource};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn composed() -> PluginReader {
        let conn = Arc::new(MemConn::with_sample_catalog());
        PluginReader::new(vec![Arc::new(InfoSchemaReader::new(conn))])
    }

    fn written(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn lists_schemas() {
        let mut out = Vec::new();
        list_schemas(&composed(), "", false, false, &mut out)
            .await
            .unwrap();
        let text = written(out);
        assert!(text.contains("public"));
        assert!(text.contains("audit"));
        assert!(!text.contains("information_schema"));
    }

    #[tokio::test]
    async fn lists_tables_and_views_separately() {
        let mut out = Vec::new();
        list_tables(
            &composed(),
            &[ObjectType::Table],
            "",
            false,
            false,
            &mut out,
        )
        .await
        .unwrap();
        let text = written(out);
        assert!(text.contains("film"));
        assert!(!text.contains("film_list"));

        let mut out = Vec::new();
        list_tables(&composed(), &[ObjectType::View], "", false, false, &mut out)
            .await
            .unwrap();
        let text = written(out);
        assert!(text.contains("film_list"));
        assert!(!text.contains("film_actor"));
    }

    #[tokio::test]
    async fn describe_renders_columns_and_skips_missing_sections() {
        let mut out = Vec::new();
        describe_table_details(&composed(), "film", false, false, &mut out)
            .await
            .unwrap();
        let text = written(out);
        assert!(text.contains("Table \"public.film\""));
        assert!(text.contains("film_id"));
        assert!(text.contains("title"));
        // no index capability composed: the section is skipped, not an error
        assert!(!text.contains("Indexes:"));
    }

    /// A backend-specific source contributing only indexes.
    struct IndexesOnly;

    #[async_trait]
    impl IndexReader for IndexesOnly {
        async fn indexes(&self, filter: &Filter) -> crate::error::Result<ResultSet<Index>> {
            let all = vec![Index {
                schema: "public".into(),
                table: "film".into(),
                name: "film_pkey".into(),
                unique: true,
                primary: true,
            }];
            Ok(ResultSet::new(
                all.into_iter()
                    .filter(|i| filter.matches_parent(&i.table))
                    .collect(),
            ))
        }
    }

    impl MetaSource for IndexesOnly {
        fn index_reader(&self) -> Option<&dyn IndexReader> {
            Some(self)
        }
    }

    #[tokio::test]
    async fn composed_index_source_fills_the_section() {
        let conn = Arc::new(MemConn::with_sample_catalog());
        let reader = PluginReader::new(vec![
            Arc::new(IndexesOnly),
            Arc::new(InfoSchemaReader::new(conn)),
        ]);

        let mut out = Vec::new();
        describe_table_details(&reader, "film", false, false, &mut out)
            .await
            .unwrap();
        let text = written(out);
        assert!(text.contains("Indexes:"));
        assert!(text.contains("film_pkey"));

        let mut out = Vec::new();
        list_indexes(&reader, "", false, &mut out).await.unwrap();
        assert!(written(out).contains("film_pkey"));
    }

    #[tokio::test]
    async fn missing_index_capability_degrades_list() {
        let mut out = Vec::new();
        list_indexes(&composed(), "", false, &mut out).await.unwrap();
        assert!(written(out).contains("not supported"));
    }

    #[tokio::test]
    async fn functions_verbose_includes_arguments() {
        let mut out = Vec::new();
        describe_functions(&composed(), "", true, false, &mut out)
            .await
            .unwrap();
        let text = written(out);
        assert!(text.contains("film_in_stock"));
        assert!(text.contains("p_film_id integer"));
        assert!(text.contains("procedure"));
    }

    #[tokio::test]
    async fn privileges_render() {
        let mut out = Vec::new();
        list_privileges(&composed(), "film", &mut out).await.unwrap();
        let text = written(out);
        assert!(text.contains("sqlsh"));
        assert!(text.contains("SELECT"));
    }

    #[tokio::test]
    async fn unknown_relation_reports_cleanly() {
        let mut out = Vec::new();
        describe_table_details(&composed(), "nothing_here", false, false, &mut out)
            .await
            .unwrap();
        assert!(written(out).contains("Did not find any relation"));
    }

    #[tokio::test]
    async fn sequences_listed_through_their_own_capability() {
        let mut out = Vec::new();
        list_tables(
            &composed(),
            &[ObjectType::Sequence],
            "",
            false,
            false,
            &mut out,
        )
        .await
        .unwrap();
        let text = written(out);
        assert!(text.contains("film_film_id_seq"));
    }
}
