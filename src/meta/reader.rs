//! Metadata reader capabilities and plugin composition
//!
//! Each object kind gets its own narrow capability trait; a backend reader
//! implements whatever subset it can. [`MetaSource`] is the advertisement
//! surface: a per-capability optional accessor, `None` by default.
//!
//! [`PluginReader`] composes an ordered list of sources into one reader:
//! each capability is bound once, at construction, to the first source that
//! advertises it, so source order is precedence order. A backend-specific
//! reader is listed before the generic INFORMATION_SCHEMA reader so its
//! answers win. Calling an unbound capability fails with
//! [`Error::NotSupported`], which callers treat as "no candidates from this
//! source", never as fatal.

use crate::error::{Error, Result};
use crate::meta::{
    Catalog, Column, Constraint, ConstraintColumn, Filter, Function, FunctionColumn, Index,
    IndexColumn, Privilege, ResultSet, Schema, Sequence, Table, Trigger,
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn catalogs(&self, filter: &Filter) -> Result<ResultSet<Catalog>>;
}

#[async_trait]
pub trait SchemaReader: Send + Sync {
    async fn schemas(&self, filter: &Filter) -> Result<ResultSet<Schema>>;
}

#[async_trait]
pub trait TableReader: Send + Sync {
    async fn tables(&self, filter: &Filter) -> Result<ResultSet<Table>>;
}

#[async_trait]
pub trait ColumnReader: Send + Sync {
    async fn columns(&self, filter: &Filter) -> Result<ResultSet<Column>>;
}

#[async_trait]
pub trait IndexReader: Send + Sync {
    async fn indexes(&self, filter: &Filter) -> Result<ResultSet<Index>>;
}

#[async_trait]
pub trait IndexColumnReader: Send + Sync {
    async fn index_columns(&self, filter: &Filter) -> Result<ResultSet<IndexColumn>>;
}

#[async_trait]
pub trait TriggerReader: Send + Sync {
    async fn triggers(&self, filter: &Filter) -> Result<ResultSet<Trigger>>;
}

#[async_trait]
pub trait ConstraintReader: Send + Sync {
    async fn constraints(&self, filter: &Filter) -> Result<ResultSet<Constraint>>;
}

#[async_trait]
pub trait ConstraintColumnReader: Send + Sync {
    async fn constraint_columns(&self, filter: &Filter) -> Result<ResultSet<ConstraintColumn>>;
}

#[async_trait]
pub trait FunctionReader: Send + Sync {
    async fn functions(&self, filter: &Filter) -> Result<ResultSet<Function>>;
}

#[async_trait]
pub trait FunctionColumnReader: Send + Sync {
    async fn function_columns(&self, filter: &Filter) -> Result<ResultSet<FunctionColumn>>;
}

#[async_trait]
pub trait SequenceReader: Send + Sync {
    async fn sequences(&self, filter: &Filter) -> Result<ResultSet<Sequence>>;
}

#[async_trait]
pub trait PrivilegeReader: Send + Sync {
    async fn privileges(&self, filter: &Filter) -> Result<ResultSet<Privilege>>;
}

/// What a reader can do. Every accessor defaults to `None`; implementors
/// override the ones they support, returning `self`.
pub trait MetaSource: Send + Sync {
    fn catalog_reader(&self) -> Option<&dyn CatalogReader> {
        None
    }
    fn schema_reader(&self) -> Option<&dyn SchemaReader> {
        None
    }
    fn table_reader(&self) -> Option<&dyn TableReader> {
        None
    }
    fn column_reader(&self) -> Option<&dyn ColumnReader> {
        None
    }
    fn index_reader(&self) -> Option<&dyn IndexReader> {
        None
    }
    fn index_column_reader(&self) -> Option<&dyn IndexColumnReader> {
        None
    }
    fn trigger_reader(&self) -> Option<&dyn TriggerReader> {
        None
    }
    fn constraint_reader(&self) -> Option<&dyn ConstraintReader> {
        None
    }
    fn constraint_column_reader(&self) -> Option<&dyn ConstraintColumnReader> {
        None
    }
    fn function_reader(&self) -> Option<&dyn FunctionReader> {
        None
    }
    fn function_column_reader(&self) -> Option<&dyn FunctionColumnReader> {
        None
    }
    fn sequence_reader(&self) -> Option<&dyn SequenceReader> {
        None
    }
    fn privilege_reader(&self) -> Option<&dyn PrivilegeReader> {
        None
    }
}

/// Capability-wise composition of several partial readers.
pub struct PluginReader {
    catalogs: Option<Arc<dyn MetaSource>>,
    schemas: Option<Arc<dyn MetaSource>>,
    tables: Option<Arc<dyn MetaSource>>,
    columns: Option<Arc<dyn MetaSource>>,
    indexes: Option<Arc<dyn MetaSource>>,
    index_columns: Option<Arc<dyn MetaSource>>,
    triggers: Option<Arc<dyn MetaSource>>,
    constraints: Option<Arc<dyn MetaSource>>,
    constraint_columns: Option<Arc<dyn MetaSource>>,
    functions: Option<Arc<dyn MetaSource>>,
    function_columns: Option<Arc<dyn MetaSource>>,
    sequences: Option<Arc<dyn MetaSource>>,
    privileges: Option<Arc<dyn MetaSource>>,
}

impl PluginReader {
    /// Bind each capability to the first source in `sources` advertising
    /// it. Binding happens here, once; calls never re-probe the list.
    pub fn new(sources: Vec<Arc<dyn MetaSource>>) -> Self {
        fn bind(
            sources: &[Arc<dyn MetaSource>],
            has: impl Fn(&dyn MetaSource) -> bool,
        ) -> Option<Arc<dyn MetaSource>> {
            sources.iter().find(|s| has(s.as_ref())).cloned()
        }

        Self {
            catalogs: bind(&sources, |s| s.catalog_reader().is_some()),
            schemas: bind(&sources, |s| s.schema_reader().is_some()),
            tables: bind(&sources, |s| s.table_reader().is_some()),
            columns: bind(&sources, |s| s.column_reader().is_some()),
            indexes: bind(&sources, |s| s.index_reader().is_some()),
            index_columns: bind(&sources, |s| s.index_column_reader().is_some()),
            triggers: bind(&sources, |s| s.trigger_reader().is_some()),
            constraints: bind(&sources, |s| s.constraint_reader().is_some()),
            constraint_columns: bind(&sources, |s| s.constraint_column_reader().is_some()),
            functions: bind(&sources, |s| s.function_reader().is_some()),
            function_columns: bind(&sources, |s| s.function_column_reader().is_some()),
            sequences: bind(&sources, |s| s.sequence_reader().is_some()),
            privileges: bind(&sources, |s| s.privilege_reader().is_some()),
        }
    }
}

#[async_trait]
impl CatalogReader for PluginReader {
    async fn catalogs(&self, filter: &Filter) -> Result<ResultSet<Catalog>> {
        match self.catalogs.as_deref().and_then(MetaSource::catalog_reader) {
            Some(r) => r.catalogs(filter).await,
            None => Err(Error::NotSupported("catalogs")),
        }
    }
}

#[async_trait]
impl SchemaReader for PluginReader {
    async fn schemas(&self, filter: &Filter) -> Result<ResultSet<Schema>> {
        match self.schemas.as_deref().and_then(MetaSource::schema_reader) {
            Some(r) => r.schemas(filter).await,
            None => Err(Error::NotSupported("schemas")),
        }
    }
}

#[async_trait]
impl TableReader for PluginReader {
    async fn tables(&self, filter: &Filter) -> Result<ResultSet<Table>> {
        match self.tables.as_deref().and_then(MetaSource::table_reader) {
            Some(r) => r.tables(filter).await,
            None => Err(Error::NotSupported("tables")),
        }
    }
}

#[async_trait]
impl ColumnReader for PluginReader {
    async fn columns(&self, filter: &Filter) -> Result<ResultSet<Column>> {
        match self.columns.as_deref().and_then(MetaSource::column_reader) {
            Some(r) => r.columns(filter).await,
            None => Err(Error::NotSupported("columns")),
        }
    }
}

#[async_trait]
impl IndexReader for PluginReader {
    async fn indexes(&self, filter: &Filter) -> Result<ResultSet<Index>> {
        match self.indexes.as_deref().and_then(MetaSource::index_reader) {
            Some(r) => r.indexes(filter).await,
            None => Err(Error::NotSupported("indexes")),
        }
    }
}

#[async_trait]
impl IndexColumnReader for PluginReader {
    async fn index_columns(&self, filter: &Filter) -> Result<ResultSet<IndexColumn>> {
        match self
            .index_columns
            .as_deref()
            .and_then(MetaSource::index_column_reader)
        {
            Some(r) => r.index_columns(filter).await,
            None => Err(Error::NotSupported("index columns")),
        }
    }
}

#[async_trait]
impl TriggerReader for PluginReader {
    async fn triggers(&self, filter: &Filter) -> Result<ResultSet<Trigger>> {
        match self.triggers.as_deref().and_then(MetaSource::trigger_reader) {
            Some(r) => r.triggers(filter).await,
            None => Err(Error::NotSupported("triggers")),
        }
    }
}

#[async_trait]
impl ConstraintReader for PluginReader {
    async fn constraints(&self, filter: &Filter) -> Result<ResultSet<Constraint>> {
        match self
            .constraints
            .as_deref()
            .and_then(MetaSource::constraint_reader)
        {
            Some(r) => r.constraints(filter).await,
            None => Err(Error::NotSupported("constraints")),
        }
    }
}

#[async_trait]
impl ConstraintColumnReader for PluginReader {
    async fn constraint_columns(&self, filter: &Filter) -> Result<ResultSet<ConstraintColumn>> {
        match self
            .constraint_columns
            .as_deref()
            .and_then(MetaSource::constraint_column_reader)
        {
            Some(r) => r.constraint_columns(filter).await,
            None => Err(Error::NotSupported("constraint columns")),
        }
    }
}

#[async_trait]
impl FunctionReader for PluginReader {
    async fn functions(&self, filter: &Filter) -> Result<ResultSet<Function>> {
        match self
            .functions
            .as_deref()
            .and_then(MetaSource::function_reader)
        {
            Some(r) => r.functions(filter).await,
            None => Err(Error::NotSupported("functions")),
        }
    }
}

#[async_trait]
impl FunctionColumnReader for PluginReader {
    async fn function_columns(&self, filter: &Filter) -> Result<ResultSet<FunctionColumn>> {
        match self
            .function_columns
            .as_deref()
            .and_then(MetaSource::function_column_reader)
        {
            Some(r) => r.function_columns(filter).await,
            None => Err(Error::NotSupported("function columns")),
        }
    }
}

#[async_trait]
impl SequenceReader for PluginReader {
    async fn sequences(&self, filter: &Filter) -> Result<ResultSet<Sequence>> {
        match self
            .sequences
            .as_deref()
            .and_then(MetaSource::sequence_reader)
        {
            Some(r) => r.sequences(filter).await,
            None => Err(Error::NotSupported("sequences")),
        }
    }
}

#[async_trait]
impl PrivilegeReader for PluginReader {
    async fn privileges(&self, filter: &Filter) -> Result<ResultSet<Privilege>> {
        match self
            .privileges
            .as_deref()
            .and_then(MetaSource::privilege_reader)
        {
            Some(r) => r.privileges(filter).await,
            None => Err(Error::NotSupported("privileges")),
        }
    }
}

// A composed reader advertises exactly the capabilities it bound, so
// compositions nest.
impl MetaSource for PluginReader {
    fn catalog_reader(&self) -> Option<&dyn CatalogReader> {
        self.catalogs.as_ref().map(|_| self as &dyn CatalogReader)
    }
    fn schema_reader(&self) -> Option<&dyn SchemaReader> {
        self.schemas.as_ref().map(|_| self as &dyn SchemaReader)
    }
    fn table_reader(&self) -> Option<&dyn TableReader> {
        self.tables.as_ref().map(|_| self as &dyn TableReader)
    }
    fn column_reader(&self) -> Option<&dyn ColumnReader> {
        self.columns.as_ref().map(|_| self as &dyn ColumnReader)
    }
    fn index_reader(&self) -> Option<&dyn IndexReader> {
        self.indexes.as_ref().map(|_| self as &dyn IndexReader)
    }
    fn index_column_reader(&self) -> Option<&dyn IndexColumnReader> {
        self.index_columns
            .as_ref()
            .map(|_| self as &dyn IndexColumnReader)
    }
    fn trigger_reader(&self) -> Option<&dyn TriggerReader> {
        self.triggers.as_ref().map(|_| self as &dyn TriggerReader)
    }
    fn constraint_reader(&self) -> Option<&dyn ConstraintReader> {
        self.constraints
            .as_ref()
            .map(|_| self as &dyn ConstraintReader)
    }
    fn constraint_column_reader(&self) -> Option<&dyn ConstraintColumnReader> {
        self.constraint_columns
            .as_ref()
            .map(|_| self as &dyn ConstraintColumnReader)
    }
    fn function_reader(&self) -> Option<&dyn FunctionReader> {
        self.functions.as_ref().map(|_| self as &dyn FunctionReader)
    }
    fn function_column_reader(&self) -> Option<&dyn FunctionColumnReader> {
        self.function_columns
            .as_ref()
            .map(|_| self as &dyn FunctionColumnReader)
    }
    fn sequence_reader(&self) -> Option<&dyn SequenceReader> {
        self.sequences.as_ref().map(|_| self as &dyn SequenceReader)
    }
    fn privilege_reader(&self) -> Option<&dyn PrivilegeReader> {
        self.privileges
            .as_ref()
            .map(|_| self as &dyn PrivilegeReader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ObjectType;

    /// Serves a single fixed table; nothing else.
    struct TablesOnly {
        table: &'static str,
    }

    #[async_trait]
    impl TableReader for TablesOnly {
        async fn tables(&self, _filter: &Filter) -> Result<ResultSet<Table>> {
            Ok(ResultSet::new(vec![Table {
                catalog: "t".into(),
                schema: "public".into(),
                name: self.table.into(),
                kind: ObjectType::Table,
            }]))
        }
    }

    impl MetaSource for TablesOnly {
        fn table_reader(&self) -> Option<&dyn TableReader> {
            Some(self)
        }
    }

    /// Serves a single fixed column; nothing else.
    struct ColumnsOnly;

    #[async_trait]
    impl ColumnReader for ColumnsOnly {
        async fn columns(&self, _filter: &Filter) -> Result<ResultSet<Column>> {
            Ok(ResultSet::new(vec![Column {
                schema: "public".into(),
                table: "film".into(),
                name: "title".into(),
                ordinal: 1,
                data_type: "varchar".into(),
                nullable: false,
                default: None,
            }]))
        }
    }

    impl MetaSource for ColumnsOnly {
        fn column_reader(&self) -> Option<&dyn ColumnReader> {
            Some(self)
        }
    }

    #[tokio::test]
    async fn partial_sources_compose() {
        let reader = PluginReader::new(vec![
            Arc::new(TablesOnly { table: "film" }),
            Arc::new(ColumnsOnly),
        ]);
        let filter = Filter::new();

        // implemented by one source each
        assert_eq!(reader.tables(&filter).await.unwrap().len(), 1);
        assert_eq!(reader.columns(&filter).await.unwrap().len(), 1);

        // implemented by neither
        assert!(matches!(
            reader.schemas(&filter).await,
            Err(Error::NotSupported("schemas"))
        ));
    }

    #[tokio::test]
    async fn first_implementor_wins() {
        let reader = PluginReader::new(vec![
            Arc::new(TablesOnly { table: "specific" }),
            Arc::new(TablesOnly { table: "generic" }),
        ]);
        let mut tables = reader.tables(&Filter::new()).await.unwrap();
        assert!(tables.advance());
        assert_eq!(tables.current().unwrap().name, "specific");
    }

    #[tokio::test]
    async fn compositions_nest() {
        let inner = PluginReader::new(vec![Arc::new(TablesOnly { table: "film" })]);
        let outer = PluginReader::new(vec![Arc::new(inner) as Arc<dyn MetaSource>]);

        assert_eq!(outer.tables(&Filter::new()).await.unwrap().len(), 1);
        assert!(outer.schema_reader().is_none());
        assert!(matches!(
            outer.schemas(&Filter::new()).await,
            Err(Error::NotSupported(_))
        ));
    }
}
