use serde_json::{json, Value};
use tracing::{trace, warn};

use super::args::{FieldArgs, FieldInfo, Selection};
use super::errors::ResolveError;
use super::schema::RequestScope;
use super::strategy::Strategy;
use crate::loader::LoadRequest;
use crate::meta::{FilterOp, MetaField, MetaIndex, MetaType, RelationKind};
use crate::query::{
    compile_count, compile_select, parse_sort, parse_where, FilterNode, FilterTree, SelectSpec,
    SortSpec, ID_COLUMN,
};
use crate::store::{query_all, DescriptorKind, Page, PageRequest, Record};

/// What a field resolved to.
#[derive(Debug)]
pub enum Resolved {
    Null,
    Value(Value),
    Record(Record),
    Records(Vec<Record>),
    Page(Page),
}

impl Resolved {
    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Resolved::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Resolved::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<&Page> {
        match self {
            Resolved::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// The resolution function for one field, chosen once when the schema is
/// built.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    typename: String,
    field: MetaField,
    strategy: Strategy,
}

impl FieldResolver {
    pub fn new(parent: &MetaType, field: &MetaField, strategy: Strategy) -> Self {
        Self {
            typename: parent.typename.clone(),
            field: field.clone(),
            strategy,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn field(&self) -> &MetaField {
        &self.field
    }

    /// Resolve the field on `source`. Failures are traced with the strategy
    /// and record id, then passed through the schema's error middleware.
    pub async fn resolve(
        &self,
        scope: &RequestScope<'_>,
        source: &Record,
        args: &FieldArgs,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        let result = match self.strategy {
            Strategy::Root => self.resolve_root(scope, args, info).await,
            Strategy::ByOurs => self.resolve_ours(scope, source, args, info).await,
            Strategy::ByTheirs => self.resolve_theirs(scope, source, args, info).await,
            Strategy::Embedded => self.resolve_embedded(scope, source).await,
            Strategy::Column => self.resolve_column(scope, source).await,
        };
        result.map_err(|err| {
            let err = err.traced(
                self.strategy.label(),
                &self.typename,
                source.id(),
                &self.field.fieldname,
            );
            warn!(error = %err, "field resolution failed");
            scope.schema().handle_error(err, info)
        })
    }

    async fn resolve_root(
        &self,
        scope: &RequestScope<'_>,
        args: &FieldArgs,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        let filter = parse_where(&args.filter)?;
        let sort = parse_sort(&args.sort)?;
        self.query_related(scope, filter, sort, args, info).await
    }

    async fn resolve_ours(
        &self,
        scope: &RequestScope<'_>,
        source: &Record,
        args: &FieldArgs,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        let column = self.field.ours.as_deref().ok_or_else(|| self.missing_key("ours"))?;
        let ids = key_list(column, read_column(scope, source, column).await?)?;
        let mut filter = parse_where(&args.filter)?;
        let sort = parse_sort(&args.sort)?;

        let batchable = filter.is_empty()
            && sort.is_empty()
            && !self.field.is_paginated()
            && ids.len() <= scope.loader().config().batch_size;
        if batchable {
            return self.load_by_id(scope, ids, info).await;
        }
        if ids.is_empty() && !self.field.is_paginated() {
            return Ok(self.empty());
        }

        let key_filter = match ids.as_slice() {
            [id] if !self.field.return_many => FilterNode::column(ID_COLUMN, FilterOp::Eq, json!(id)),
            _ => FilterNode::column(ID_COLUMN, FilterOp::In, json!(ids)),
        };
        filter.insert(0, key_filter);
        self.query_related(scope, filter, sort, args, info).await
    }

    async fn resolve_theirs(
        &self,
        scope: &RequestScope<'_>,
        source: &Record,
        args: &FieldArgs,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        let column = self
            .field
            .theirs
            .as_deref()
            .ok_or_else(|| self.missing_key("theirs"))?;
        let id = source.id().ok_or_else(|| self.missing_key(ID_COLUMN))?;

        // A reverse key that is itself a list holds many parent ids.
        let index = scope.schema().index();
        let target = &self.field.return_typename;
        let reverse_many = index
            .ours_field(target, column)
            .or_else(|| index.field(target, column))
            .is_some_and(|reverse| reverse.return_many);
        let op = if reverse_many { FilterOp::In } else { FilterOp::Eq };

        let mut filter = parse_where(&args.filter)?;
        filter.insert(0, FilterNode::column(column, op, json!(id)));
        let sort = parse_sort(&args.sort)?;
        self.query_related(scope, filter, sort, args, info).await
    }

    async fn resolve_embedded(
        &self,
        scope: &RequestScope<'_>,
        source: &Record,
    ) -> Result<Resolved, ResolveError> {
        let value = read_column(scope, source, &self.field.fieldname).await?;
        let is_object = scope
            .schema()
            .index()
            .meta_type(&self.field.return_typename)
            .is_some();
        Ok(match value {
            Value::Null => Resolved::Null,
            Value::Array(items) if is_object => {
                Resolved::Records(items.into_iter().map(Record::Materialized).collect())
            }
            value @ Value::Object(_) if is_object => Resolved::Record(Record::Materialized(value)),
            value => Resolved::Value(value),
        })
    }

    async fn resolve_column(
        &self,
        scope: &RequestScope<'_>,
        source: &Record,
    ) -> Result<Resolved, ResolveError> {
        Ok(match read_column(scope, source, &self.field.fieldname).await? {
            Value::Null => Resolved::Null,
            value => Resolved::Value(value),
        })
    }

    /// Point lookups through the batching loader. Missing ids are dropped.
    async fn load_by_id(
        &self,
        scope: &RequestScope<'_>,
        ids: Vec<String>,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        if ids.is_empty() {
            return Ok(self.empty());
        }
        let (database, container) = self.location()?;
        let target = &self.field.return_typename;
        let columns = selected_columns(scope.schema().index(), target, Some(&info.selection));
        trace!(field = %self.field.fieldname, ids = ids.len(), "loading by id");
        let request = LoadRequest::new(target.as_str(), database, container)
            .columns(columns)
            .ids(ids);
        let records: Vec<Record> = scope
            .loader()
            .load(scope.context(), request)
            .await?
            .into_iter()
            .flatten()
            .map(|row| Record::from_row(row, DescriptorKind::Single, target, database, container))
            .collect();
        self.shape(records)
    }

    /// Compile and run a select for the related type, as a lazy page when
    /// the field is paginated.
    async fn query_related(
        &self,
        scope: &RequestScope<'_>,
        filter: FilterTree,
        sort: Vec<SortSpec>,
        args: &FieldArgs,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        let (database, container) = self.location()?;
        let index = scope.schema().index();
        let target = self.field.return_typename.as_str();

        if self.field.is_paginated() {
            let columns = selected_columns(index, target, info.selection.child("items"));
            let select = compile_select(
                index,
                SelectSpec {
                    typename: target,
                    columns: &columns,
                    filter: &filter,
                    sort: &sort,
                },
            )?;
            let count = compile_count(index, target, &filter)?;
            let limit = scope.schema().config().pagination.effective_limit(args.limit);
            let request = PageRequest {
                typename: target.to_string(),
                database: database.to_string(),
                container: container.to_string(),
                select,
                count,
                cursor: args.cursor.clone(),
                limit: Some(limit),
            };
            return Ok(Resolved::Page(Page::new(
                scope.store().clone(),
                scope.context().clone(),
                request,
            )));
        }

        let columns = selected_columns(index, target, Some(&info.selection));
        let select = compile_select(
            index,
            SelectSpec {
                typename: target,
                columns: &columns,
                filter: &filter,
                sort: &sort,
            },
        )?;
        trace!(query = %select.query_text, database, container, "resolver query");

        if self.field.return_many {
            let rows = query_all(
                scope.store().as_ref(),
                scope.context(),
                database,
                container,
                &select,
                None,
            )
            .await?;
            return Ok(Resolved::Records(
                rows.into_iter()
                    .map(|row| Record::from_row(row, DescriptorKind::List, target, database, container))
                    .collect(),
            ));
        }

        // Two rows are enough to detect a cardinality violation.
        let page = scope
            .store()
            .query(scope.context(), database, container, &select, None, Some(2))
            .await?;
        let records = page
            .items
            .into_iter()
            .map(|row| Record::from_row(row, DescriptorKind::Single, target, database, container))
            .collect();
        self.shape(records)
    }

    fn shape(&self, mut records: Vec<Record>) -> Result<Resolved, ResolveError> {
        if self.field.return_many {
            return Ok(Resolved::Records(records));
        }
        match records.len() {
            0 => Ok(Resolved::Null),
            1 => Ok(Resolved::Record(records.remove(0))),
            rows => Err(ResolveError::Cardinality {
                typename: self.typename.clone(),
                field: self.field.fieldname.clone(),
                rows,
            }),
        }
    }

    fn empty(&self) -> Resolved {
        if self.field.return_many {
            Resolved::Records(Vec::new())
        } else {
            Resolved::Null
        }
    }

    fn location(&self) -> Result<(&str, &str), ResolveError> {
        match (&self.field.database, &self.field.container) {
            (Some(database), Some(container)) => Ok((database.as_str(), container.as_str())),
            _ => Err(ResolveError::MissingLocation {
                typename: self.typename.clone(),
                field: self.field.fieldname.clone(),
            }),
        }
    }

    fn missing_key(&self, column: &str) -> ResolveError {
        ResolveError::MissingKey {
            typename: self.typename.clone(),
            field: self.field.fieldname.clone(),
            column: column.to_string(),
        }
    }
}

/// Read a column from the record, fetching it through the loader when the
/// record is described and the column was never loaded.
async fn read_column(
    scope: &RequestScope<'_>,
    source: &Record,
    column: &str,
) -> Result<Value, ResolveError> {
    if let Some(value) = source.get(column) {
        return Ok(value.clone());
    }
    let Some(descriptor) = source.source() else {
        return Ok(Value::Null);
    };
    let request = LoadRequest::new(
        descriptor.typename.as_str(),
        descriptor.database.as_str(),
        descriptor.container.as_str(),
    )
    .columns([column])
    .ids([descriptor.id.as_str()]);
    let row = scope.loader().load_one(scope.context(), request).await?;
    Ok(row
        .and_then(|row| row.get(column).cloned())
        .unwrap_or(Value::Null))
}

/// Normalize a local key value into a list of ids.
fn key_list(column: &str, value: Value) -> Result<Vec<String>, ResolveError> {
    let invalid = |value: &Value| ResolveError::InvalidKey {
        column: column.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(id) => Ok(vec![id]),
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(id) => Ok(id),
                other => Err(invalid(&other)),
            })
            .collect(),
        other => Err(invalid(&other)),
    }
}

/// Storage columns needed to answer `selection` on records of `typename`.
/// Relations resolved from elsewhere need no column besides `id`.
pub fn selected_columns(
    index: &MetaIndex,
    typename: &str,
    selection: Option<&Selection>,
) -> Vec<String> {
    let Some(selection) = selection else {
        return Vec::new();
    };
    selection
        .names()
        .filter_map(|name| {
            let field = index.field(typename, name)?;
            match field.kind {
                RelationKind::Embedded => Some(field.fieldname.clone()),
                RelationKind::OneOurs | RelationKind::ManyOurs => field.ours.clone(),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::meta::{FieldAnnotation, TypeAnnotation};
    use crate::query::QueryError;
    use crate::resolver::DocumentSchema;
    use crate::store::{RequestContext, StoreError, StorePage};
    use crate::testing::RecordingStore;
    use std::sync::Arc;

    fn schema() -> DocumentSchema {
        let annotations = vec![
            TypeAnnotation::new("Query")
                .field(
                    FieldAnnotation::new("dummies", "Dummy")
                        .many()
                        .located("db", "Dummies")
                        .pagination(false),
                )
                .field(FieldAnnotation::new("dummyPage", "Dummy").many().located("db", "Dummies")),
            TypeAnnotation::new("Dummy")
                .field(FieldAnnotation::new("id", "ID"))
                .field(FieldAnnotation::new("name", "String"))
                .field(FieldAnnotation::new("address", "Address"))
                .field(FieldAnnotation::new("related", "Dummy").ours("relatedId"))
                .field(FieldAnnotation::new("friends", "Dummy").many().ours("friendIds"))
                .field(FieldAnnotation::new("owner", "Owner").theirs("dummyId"))
                .field(
                    FieldAnnotation::new("fans", "Owner")
                        .many()
                        .theirs("likedIds")
                        .pagination(false),
                ),
            TypeAnnotation::new("Owner")
                .located("db", "Owners")
                .field(FieldAnnotation::new("dummyId", "String"))
                .field(FieldAnnotation::new("likedIds", "String").many()),
            TypeAnnotation::new("Address").field(FieldAnnotation::new("city", "String")),
        ];
        DocumentSchema::compile(&annotations, &Config::default()).unwrap()
    }

    fn rows(items: Vec<Value>) -> Arc<RecordingStore> {
        Arc::new(RecordingStore::new(move |_| Ok(StorePage::new(items.clone()))))
    }

    fn described(value: Value) -> Record {
        Record::from_row(value, DescriptorKind::List, "Dummy", "db", "Dummies")
    }

    #[tokio::test]
    async fn test_root_many_queries_container() {
        let schema = schema();
        let store = rows(vec![json!({"id": "1", "name": "Alice"})]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let info = FieldInfo::new("Query", "dummies").with_selection(Selection::new().field("name"));
        let args = FieldArgs::new()
            .filter(json!({"name_eq": "Alice"}))
            .sort(json!({"name_ASC": 1}));

        let resolved = scope
            .resolve(&Record::Materialized(json!({})), &args, &info)
            .await
            .unwrap();

        let records = resolved.as_records().unwrap();
        assert_eq!(records[0].source().unwrap().kind, DescriptorKind::List);
        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].container, "Dummies");
        assert_eq!(
            calls[0].sql.query_text,
            "SELECT c.id, c.name FROM c WHERE c.name = @p1 ORDER BY c.name, c.id"
        );
    }

    #[tokio::test]
    async fn test_paginated_root_is_lazy() {
        let schema = schema();
        let store = rows(vec![json!({"id": "1"})]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let info = FieldInfo::new("Query", "dummyPage");
        let args = FieldArgs::new().cursor("abc").limit(5000);

        let resolved = scope
            .resolve(&Record::Materialized(json!({})), &args, &info)
            .await
            .unwrap();

        let page = resolved.as_page().unwrap();
        assert!(store.calls().is_empty());
        assert_eq!(page.cursor(), Some("abc"));
        assert_eq!(page.request().limit, Some(1000));
        page.items().await.unwrap();
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_one_ours_goes_through_loader() {
        let schema = schema();
        let store = rows(vec![json!({"id": "5", "name": "Bob"})]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let info = FieldInfo::new("Dummy", "related").with_selection(Selection::new().field("name"));

        let resolved = scope
            .resolve(
                &described(json!({"id": "1", "relatedId": "5"})),
                &FieldArgs::new(),
                &info,
            )
            .await
            .unwrap();

        let record = resolved.as_record().unwrap();
        assert_eq!(record.id(), Some("5"));
        assert_eq!(record.source().unwrap().kind, DescriptorKind::Single);
        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].sql.query_text.contains("ARRAY_CONTAINS(@ids, c.id)"));
    }

    #[tokio::test]
    async fn test_many_ours_with_filter_compiles_id_filter() {
        let schema = schema();
        let store = rows(vec![]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let info = FieldInfo::new("Dummy", "friends");
        let args = FieldArgs::new().filter(json!({"name_eq": "x"}));

        let resolved = scope
            .resolve(
                &described(json!({"id": "1", "friendIds": ["2", "3"]})),
                &args,
                &info,
            )
            .await
            .unwrap();

        assert_eq!(resolved.as_records().unwrap().len(), 0);
        let call = &store.calls()[0];
        assert_eq!(
            call.sql.query_text,
            "SELECT c.id FROM c WHERE ARRAY_CONTAINS(@p1, c.id) AND c.name = @p2 ORDER BY c.id"
        );
        assert_eq!(call.sql.parameter("@p1"), Some(&json!(["2", "3"])));
    }

    #[tokio::test]
    async fn test_missing_ours_key_resolves_empty() {
        let schema = schema();
        let store = rows(vec![]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let source = Record::Materialized(json!({"id": "1", "relatedId": null}));

        let one = scope
            .resolve(&source, &FieldArgs::new(), &FieldInfo::new("Dummy", "related"))
            .await
            .unwrap();
        assert!(one.is_null());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_ours_key_with_filter_skips_store() {
        let schema = schema();
        let store = rows(vec![]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let source = Record::Materialized(json!({"id": "1", "friendIds": null}));

        let resolved = scope
            .resolve(
                &source,
                &FieldArgs::new().filter(json!({"name_eq": "x"})),
                &FieldInfo::new("Dummy", "friends"),
            )
            .await
            .unwrap();
        assert_eq!(resolved.as_records().map(<[Record]>::len), Some(0));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ours_key_fetched_for_single_descriptor() {
        let schema = schema();
        let store = Arc::new(RecordingStore::new(|call| {
            let ids = call.sql.parameter("@ids").cloned().unwrap_or_default();
            let items = [json!({"id": "1", "relatedId": "5"}), json!({"id": "5"})]
                .into_iter()
                .filter(|row| ids.as_array().is_some_and(|ids| ids.contains(&row["id"])))
                .collect();
            Ok(StorePage::new(items))
        }));
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let source = Record::from_row(json!({"id": "1"}), DescriptorKind::Single, "Dummy", "db", "Dummies");

        let resolved = scope
            .resolve(&source, &FieldArgs::new(), &FieldInfo::new("Dummy", "related"))
            .await
            .unwrap();

        assert_eq!(resolved.as_record().unwrap().id(), Some("5"));
        let queries: Vec<String> = store.calls().into_iter().map(|c| c.sql.query_text).collect();
        assert_eq!(
            queries,
            vec![
                "SELECT c.id, c.relatedId FROM c WHERE ARRAY_CONTAINS(@ids, c.id)",
                "SELECT c.id FROM c WHERE ARRAY_CONTAINS(@ids, c.id)",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_ours_key() {
        let schema = schema();
        let scope = schema.scope(rows(vec![]), RequestContext::new("req"));
        let err = scope
            .resolve(
                &Record::Materialized(json!({"id": "1", "relatedId": 5})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "related"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), ResolveError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn test_one_theirs_filters_on_parent_id() {
        let schema = schema();
        let store = rows(vec![json!({"id": "o1", "dummyId": "1"})]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));

        let resolved = scope
            .resolve(
                &described(json!({"id": "1"})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "owner"),
            )
            .await
            .unwrap();

        assert_eq!(resolved.as_record().unwrap().id(), Some("o1"));
        let call = &store.calls()[0];
        assert_eq!(call.container, "Owners");
        assert_eq!(call.limit, Some(2));
        assert_eq!(
            call.sql.query_text,
            "SELECT c.id FROM c WHERE c.dummyId = @p1 ORDER BY c.id"
        );
    }

    #[tokio::test]
    async fn test_one_theirs_rejects_two_rows() {
        let schema = schema();
        let store = rows(vec![json!({"id": "o1"}), json!({"id": "o2"})]);
        let scope = schema.scope(store, RequestContext::new("req"));

        let err = scope
            .resolve(
                &described(json!({"id": "1"})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "owner"),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "during theirs at Dummy(1).owner: field `Dummy.owner` returns one record but the store returned 2"
        );
    }

    #[tokio::test]
    async fn test_many_theirs_with_list_key_uses_membership() {
        let schema = schema();
        let store = rows(vec![]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));

        scope
            .resolve(
                &described(json!({"id": "1"})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "fans"),
            )
            .await
            .unwrap();

        assert_eq!(
            store.calls()[0].sql.query_text,
            "SELECT c.id FROM c WHERE ARRAY_CONTAINS(c.likedIds, @p1) ORDER BY c.id"
        );
    }

    #[tokio::test]
    async fn test_theirs_requires_parent_id() {
        let schema = schema();
        let scope = schema.scope(rows(vec![]), RequestContext::new("req"));
        let err = scope
            .resolve(
                &Record::Materialized(json!({})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "owner"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), ResolveError::MissingKey { column, .. } if column == "id"));
    }

    #[tokio::test]
    async fn test_column_present_needs_no_store() {
        let schema = schema();
        let store = rows(vec![]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let resolved = scope
            .resolve(
                &described(json!({"id": "1", "name": "Alice"})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "name"),
            )
            .await
            .unwrap();
        assert_eq!(resolved.as_value(), Some(&json!("Alice")));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_column_fetched_through_loader() {
        let schema = schema();
        let store = rows(vec![json!({"id": "1", "name": "Fetched"})]);
        let scope = schema.scope(store.clone(), RequestContext::new("req"));
        let resolved = scope
            .resolve(
                &described(json!({"id": "1"})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "name"),
            )
            .await
            .unwrap();
        assert_eq!(resolved.as_value(), Some(&json!("Fetched")));
        assert_eq!(
            store.calls()[0].sql.query_text,
            "SELECT c.id, c.name FROM c WHERE ARRAY_CONTAINS(@ids, c.id)"
        );
    }

    #[tokio::test]
    async fn test_embedded_object_is_materialized() {
        let schema = schema();
        let scope = schema.scope(rows(vec![]), RequestContext::new("req"));
        let resolved = scope
            .resolve(
                &described(json!({"id": "1", "address": {"city": "Oslo"}})),
                &FieldArgs::new(),
                &FieldInfo::new("Dummy", "address"),
            )
            .await
            .unwrap();
        let address = resolved.as_record().unwrap();
        assert!(address.source().is_none());

        let city = scope
            .resolve(address, &FieldArgs::new(), &FieldInfo::new("Address", "city"))
            .await
            .unwrap();
        assert_eq!(city.as_value(), Some(&json!("Oslo")));
    }

    #[tokio::test]
    async fn test_bad_where_is_traced() {
        let schema = schema();
        let scope = schema.scope(rows(vec![]), RequestContext::new("req"));
        let err = scope
            .resolve(
                &Record::Materialized(json!({})),
                &FieldArgs::new().filter(json!({"name_like": "x"})),
                &FieldInfo::new("Query", "dummies"),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("during root at Query(?).dummies: "));
        assert!(matches!(
            err.root_cause(),
            ResolveError::Query(QueryError::UnknownOperator { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let schema = schema();
        let store = Arc::new(RecordingStore::new(|call| {
            Err(StoreError::new(&call.database, &call.container, "down"))
        }));
        let scope = schema.scope(store, RequestContext::new("req"));
        let err = scope
            .resolve(
                &Record::Materialized(json!({})),
                &FieldArgs::new(),
                &FieldInfo::new("Query", "dummies"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), ResolveError::Store(_)));
    }

    #[test]
    fn test_selected_columns() {
        let schema = schema();
        let selection = Selection::new()
            .field("name")
            .field("related")
            .field("owner")
            .field("__typename");
        assert_eq!(
            selected_columns(schema.index(), "Dummy", Some(&selection)),
            vec!["name".to_string(), "relatedId".to_string()]
        );
        assert!(selected_columns(schema.index(), "Dummy", None).is_empty());
    }

    #[test]
    fn test_key_list() {
        assert_eq!(key_list("k", json!(null)).unwrap(), Vec::<String>::new());
        assert_eq!(key_list("k", json!("a")).unwrap(), vec!["a"]);
        assert_eq!(key_list("k", json!(["a", null, "b"])).unwrap(), vec!["a", "b"]);
        assert!(key_list("k", json!([1])).is_err());
    }
}
