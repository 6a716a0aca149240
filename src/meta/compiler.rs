/// Annotation records → meta schema compiler.
///
/// Normalizes annotations into a [`MetaSchema`]: types and fields sorted by
/// name, relation kinds classified, store locations inherited and pagination
/// defaults applied. Any failure carries a `Type: … / Field: …` breadcrumb.
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::annotations::{FieldAnnotation, TypeAnnotation};
use super::errors::MetaError;
use super::types::{FilterOp, MetaField, MetaSchema, MetaType, RelationKind};

const TOP_LEVEL_CONTEXT: &str = "Error while generating meta schema";

/// Knobs that affect compilation but are not part of the annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// Database assumed when a container is annotated without one.
    pub default_database: Option<String>,
}

/// Compile annotation records with default options.
pub fn compile(annotations: &[TypeAnnotation]) -> Result<MetaSchema, MetaError> {
    compile_with(annotations, &CompileOptions::default())
}

pub fn compile_with(
    annotations: &[TypeAnnotation],
    options: &CompileOptions,
) -> Result<MetaSchema, MetaError> {
    let schema = build(annotations, options).map_err(|e| e.within(TOP_LEVEL_CONTEXT))?;
    debug!(
        types = schema.types.len(),
        fields = schema.types.iter().map(|t| t.fields.len()).sum::<usize>(),
        "compiled meta schema"
    );
    Ok(schema)
}

fn build(annotations: &[TypeAnnotation], options: &CompileOptions) -> Result<MetaSchema, MetaError> {
    let mut sorted: Vec<&TypeAnnotation> = annotations.iter().collect();
    sorted.sort_by(|a, b| a.typename.cmp(&b.typename));
    if let Some(dup) = sorted.windows(2).find(|w| w[0].typename == w[1].typename) {
        return Err(MetaError::DuplicateType(dup[0].typename.clone()));
    }

    let mut types = Vec::with_capacity(sorted.len());
    for annotation in sorted {
        let meta_type =
            compile_type(annotation).map_err(|e| e.within(format!("Type: {}", annotation.typename)))?;
        types.push(meta_type);
    }

    let mut schema = MetaSchema { types };
    check_return_types(&schema)?;
    inherit_type_locations(&mut schema, options)?;
    resolve_field_locations(&mut schema);
    apply_pagination_defaults(&mut schema, annotations);
    Ok(schema)
}

fn compile_type(annotation: &TypeAnnotation) -> Result<MetaType, MetaError> {
    let mut fields: Vec<&FieldAnnotation> = annotation.fields.iter().collect();
    fields.sort_by(|a, b| a.fieldname.cmp(&b.fieldname));
    if let Some(dup) = fields.windows(2).find(|w| w[0].fieldname == w[1].fieldname) {
        return Err(MetaError::DuplicateField(dup[0].fieldname.clone()));
    }

    let fields = fields
        .into_iter()
        .map(|f| compile_field(f).map_err(|e| e.within(format!("Field: {}", f.fieldname))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MetaType {
        typename: annotation.typename.clone(),
        database: annotation.database.clone(),
        container: annotation.container.clone(),
        external: annotation.external,
        fields,
    })
}

fn compile_field(annotation: &FieldAnnotation) -> Result<MetaField, MetaError> {
    let kind = RelationKind::classify(
        annotation.container.is_some(),
        annotation.ours.is_some(),
        annotation.theirs.is_some(),
        annotation.return_many,
    )?;

    let filter_ops = annotation
        .filter_ops
        .as_ref()
        .map(|ops| {
            ops.iter()
                .map(|name| {
                    name.parse::<FilterOp>()
                        .map_err(MetaError::UnknownFilterOp)
                })
                .collect::<Result<BTreeSet<_>, _>>()
        })
        .transpose()?;

    let pagination = annotation
        .pagination
        .as_deref()
        .map(parse_pagination)
        .transpose()?;

    Ok(MetaField {
        fieldname: annotation.fieldname.clone(),
        return_typename: annotation.return_typename.clone(),
        return_many: annotation.return_many,
        database: annotation.database.clone(),
        container: annotation.container.clone(),
        ours: annotation.ours.clone(),
        theirs: annotation.theirs.clone(),
        filter_ops,
        filter_alias: annotation.filter_alias.clone(),
        sortable: annotation.sortable,
        sort_alias: annotation.sort_alias.clone(),
        pagination,
        kind,
    })
}

fn parse_pagination(value: &str) -> Result<bool, MetaError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        _ => Err(MetaError::InvalidPagination(value.to_string())),
    }
}

/// Every relation must point at a type the schema knows about.
fn check_return_types(schema: &MetaSchema) -> Result<(), MetaError> {
    for meta_type in &schema.types {
        for field in &meta_type.fields {
            if field.kind != RelationKind::Embedded
                && schema.find_type(&field.return_typename).is_none()
            {
                return Err(MetaError::UnknownReturnType(field.return_typename.clone())
                    .within(format!("Field: {}", field.fieldname))
                    .within(format!("Type: {}", meta_type.typename)));
            }
        }
    }
    Ok(())
}

/// Types without a location take it from a field that declares a container
/// and returns them.
fn inherit_type_locations(
    schema: &mut MetaSchema,
    options: &CompileOptions,
) -> Result<(), MetaError> {
    let mut inherited: BTreeMap<String, (Option<String>, String)> = BTreeMap::new();
    for meta_type in &schema.types {
        for field in &meta_type.fields {
            let Some(container) = &field.container else {
                continue;
            };
            let location = (field.database.clone(), container.clone());
            match inherited.get(&field.return_typename) {
                Some(existing) if *existing != location => {
                    return Err(MetaError::ConflictingLocation {
                        typename: field.return_typename.clone(),
                        first: describe_location(existing),
                        second: describe_location(&location),
                    }
                    .within(format!("Field: {}", field.fieldname))
                    .within(format!("Type: {}", meta_type.typename)));
                }
                Some(_) => {}
                None => {
                    inherited.insert(field.return_typename.clone(), location);
                }
            }
        }
    }

    for meta_type in &mut schema.types {
        if meta_type.container.is_none() {
            if let Some((database, container)) = inherited.remove(&meta_type.typename) {
                meta_type.container = Some(container);
                if meta_type.database.is_none() {
                    meta_type.database = database;
                }
            }
        }
        if meta_type.container.is_some() && meta_type.database.is_none() {
            meta_type.database = options.default_database.clone();
        }
    }
    Ok(())
}

fn describe_location((database, container): &(Option<String>, String)) -> String {
    match database {
        Some(db) => format!("{db}/{container}"),
        None => container.clone(),
    }
}

/// Relation fields fall back to their return type's location.
fn resolve_field_locations(schema: &mut MetaSchema) {
    let locations: BTreeMap<String, (Option<String>, Option<String>)> = schema
        .types
        .iter()
        .map(|t| (t.typename.clone(), (t.database.clone(), t.container.clone())))
        .collect();

    for meta_type in &mut schema.types {
        for field in &mut meta_type.fields {
            if field.kind == RelationKind::Embedded {
                continue;
            }
            if let Some((database, container)) = locations.get(&field.return_typename) {
                if field.container.is_none() {
                    field.container = container.clone();
                }
                if field.database.is_none() {
                    field.database = database.clone();
                }
            }
        }
    }
}

/// Explicit `on`/`off` wins; otherwise a list with a container and no local
/// key is paginated.
fn apply_pagination_defaults(schema: &mut MetaSchema, annotations: &[TypeAnnotation]) {
    let explicit: BTreeSet<(&str, &str)> = annotations
        .iter()
        .flat_map(|t| {
            t.fields
                .iter()
                .filter(|f| f.pagination.is_some())
                .map(move |f| (t.typename.as_str(), f.fieldname.as_str()))
        })
        .collect();

    for meta_type in &mut schema.types {
        for field in &mut meta_type.fields {
            if explicit.contains(&(meta_type.typename.as_str(), field.fieldname.as_str())) {
                continue;
            }
            field.pagination =
                Some(field.return_many && field.container.is_some() && field.ours.is_none());
        }
    }
}
