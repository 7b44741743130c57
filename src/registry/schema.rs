//! `$ref` resolution: JSON Pointer references resolved against
//! `components.{schemas,parameters,requestBodies}`, with a visited-set
//! to break cycles (e.g. recursive rule trees) at a depth cap. On a
//! cycle, resolution emits the `Recursive` sentinel and stops rather
//! than stack-overflowing or hanging — the descriptor remains
//! well-formed.
//!
//! A ref may also cross a file boundary (`"../common/errors.yaml#/components/schemas/Error"`),
//! routine in a multi-spec corpus that factors shared components into
//! their own files. [`DocumentSet`] holds every spec file loaded from
//! the tree so a ref can be resolved against whichever document it
//! actually names, not just the one currently being walked.

use super::model::{ParamLocation, ParameterDescriptor, RequestBodyDescriptor, SchemaShape};
use openapiv3::{OpenAPI, Parameter, ReferenceOr, RequestBody, Schema, SchemaKind, Type};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Depth cap for `$ref` chains; beyond this a cycle is assumed.
const MAX_REF_DEPTH: usize = 32;

/// Every spec file discovered under the registry root, keyed by
/// canonicalized path, so a `$ref` naming another file resolves
/// against the document that file actually parsed to.
#[derive(Default)]
pub struct DocumentSet {
    documents: HashMap<PathBuf, OpenAPI>,
}

impl DocumentSet {
    #[must_use]
    pub fn new(documents: HashMap<PathBuf, OpenAPI>) -> Self {
        Self { documents }
    }

    pub(crate) fn get(&self, path: &Path) -> Option<&OpenAPI> {
        self.documents.get(path)
    }
}

struct ResolveCtx<'a> {
    docs: &'a DocumentSet,
    spec: &'a OpenAPI,
    file: PathBuf,
    visited: HashSet<String>,
}

/// A `$ref` resolved to the document it targets, the canonical path of
/// that document (for further relative resolution inside it), and the
/// bare component name (the pointer's final segment).
struct ResolvedRef<'a> {
    spec: &'a OpenAPI,
    file: PathBuf,
    name: String,
}

/// Splits a reference into its optional file part and pointer
/// fragment, resolves the file part (if any) relative to `ctx.file`'s
/// directory, and looks up the resulting document in `ctx.docs`. A
/// ref with no file part (`"#/components/schemas/X"`) resolves against
/// the document currently being walked.
fn resolve_ref_target<'a>(ctx: &ResolveCtx<'a>, reference: &str) -> Option<ResolvedRef<'a>> {
    let (file_part, fragment) = match reference.split_once('#') {
        Some((file_part, fragment)) => (file_part, fragment),
        None => ("", reference),
    };
    let name = fragment.rsplit('/').next()?.to_string();
    if name.is_empty() {
        return None;
    }

    if file_part.is_empty() {
        return Some(ResolvedRef { spec: ctx.spec, file: ctx.file.clone(), name });
    }

    let target_path = ctx.file.parent()?.join(file_part);
    let canonical = target_path.canonicalize().unwrap_or(target_path);
    let spec = ctx.docs.get(&canonical)?;
    Some(ResolvedRef { spec, file: canonical, name })
}

pub fn resolve_schema(docs: &DocumentSet, file: &Path, spec: &OpenAPI, schema_ref: &ReferenceOr<Schema>) -> SchemaShape {
    let mut ctx = ResolveCtx { docs, spec, file: file.to_path_buf(), visited: HashSet::new() };
    resolve_schema_inner(&mut ctx, schema_ref, 0)
}

fn resolve_schema_inner(ctx: &mut ResolveCtx, schema_ref: &ReferenceOr<Schema>, depth: usize) -> SchemaShape {
    if depth >= MAX_REF_DEPTH {
        return SchemaShape::Recursive;
    }

    match schema_ref {
        ReferenceOr::Reference { reference } => {
            if !ctx.visited.insert(reference.clone()) {
                return SchemaShape::Recursive;
            }
            let shape = resolve_schema_ref(ctx, reference, depth);
            ctx.visited.remove(reference);
            shape
        }
        ReferenceOr::Item(schema) => schema_to_shape(ctx, schema, depth),
    }
}

fn resolve_schema_ref(ctx: &mut ResolveCtx, reference: &str, depth: usize) -> SchemaShape {
    let Some(resolved) = resolve_ref_target(ctx, reference) else {
        return SchemaShape::Unknown;
    };
    let Some(components) = resolved.spec.components.as_ref() else {
        return SchemaShape::Unknown;
    };
    let Some(target) = components.schemas.get(&resolved.name) else {
        return SchemaShape::Unknown;
    };

    let prev_spec = ctx.spec;
    let prev_file = std::mem::replace(&mut ctx.file, resolved.file);
    ctx.spec = resolved.spec;
    let shape = resolve_schema_inner(ctx, target, depth + 1);
    ctx.spec = prev_spec;
    ctx.file = prev_file;
    shape
}

fn schema_to_shape(ctx: &mut ResolveCtx, schema: &Schema, depth: usize) -> SchemaShape {
    match &schema.schema_kind {
        SchemaKind::Type(Type::String(s)) => {
            if s.enumeration.is_empty() {
                SchemaShape::Scalar { ty: "string".into() }
            } else {
                SchemaShape::Enum {
                    ty: "string".into(),
                    values: s.enumeration.iter().filter_map(|v| v.clone()).collect(),
                }
            }
        }
        SchemaKind::Type(Type::Number(_)) => SchemaShape::Scalar { ty: "number".into() },
        SchemaKind::Type(Type::Integer(_)) => SchemaShape::Scalar { ty: "integer".into() },
        SchemaKind::Type(Type::Boolean {}) => SchemaShape::Scalar { ty: "boolean".into() },
        SchemaKind::Type(Type::Array(arr)) => {
            let items = arr
                .items
                .as_ref()
                .map(|boxed| resolve_schema_inner(ctx, &boxed.clone().unbox(), depth + 1))
                .unwrap_or(SchemaShape::Unknown);
            SchemaShape::Array { items: Box::new(items) }
        }
        SchemaKind::Type(Type::Object(obj)) => {
            let properties = obj
                .properties
                .iter()
                .map(|(name, boxed)| {
                    (name.clone(), resolve_schema_inner(ctx, &boxed.clone().unbox(), depth + 1))
                })
                .collect();
            SchemaShape::Object { properties }
        }
        _ => SchemaShape::Unknown,
    }
}

/// Resolves a parameter reference (either inline, or a `$ref` into
/// `components.parameters` in this file or another) into a fully
/// inlined descriptor.
pub fn resolve_parameter(
    docs: &DocumentSet,
    file: &Path,
    spec: &OpenAPI,
    param_ref: &ReferenceOr<Parameter>,
) -> Option<ParameterDescriptor> {
    let mut ctx = ResolveCtx { docs, spec, file: file.to_path_buf(), visited: HashSet::new() };
    resolve_parameter_inner(&mut ctx, param_ref, 0)
}

fn resolve_parameter_inner(ctx: &mut ResolveCtx, param_ref: &ReferenceOr<Parameter>, depth: usize) -> Option<ParameterDescriptor> {
    if depth >= MAX_REF_DEPTH {
        return None;
    }
    match param_ref {
        ReferenceOr::Reference { reference } => {
            if !ctx.visited.insert(reference.clone()) {
                return None;
            }
            let resolved = resolve_ref_target(ctx, reference);
            let descriptor = resolved.and_then(|resolved| {
                let components = resolved.spec.components.as_ref()?;
                let target = components.parameters.get(&resolved.name)?;
                let prev_spec = ctx.spec;
                let prev_file = std::mem::replace(&mut ctx.file, resolved.file);
                ctx.spec = resolved.spec;
                let descriptor = resolve_parameter_inner(ctx, target, depth + 1);
                ctx.spec = prev_spec;
                ctx.file = prev_file;
                descriptor
            });
            ctx.visited.remove(reference);
            descriptor
        }
        ReferenceOr::Item(param) => Some(parameter_to_descriptor(ctx, param)),
    }
}

fn parameter_to_descriptor(ctx: &mut ResolveCtx, param: &Parameter) -> ParameterDescriptor {
    let (data, location) = match param {
        Parameter::Path { parameter_data, .. } => (parameter_data, ParamLocation::Path),
        Parameter::Query { parameter_data, .. } => (parameter_data, ParamLocation::Query),
        Parameter::Header { parameter_data, .. } => (parameter_data, ParamLocation::Header),
        Parameter::Cookie { parameter_data, .. } => (parameter_data, ParamLocation::Header),
    };

    let shape = match &data.format {
        openapiv3::ParameterSchemaOrContent::Schema(schema_ref) => resolve_schema_inner(ctx, schema_ref, 0),
        openapiv3::ParameterSchemaOrContent::Content(_) => SchemaShape::Unknown,
    };

    let enum_values = match &shape {
        SchemaShape::Enum { values, .. } => Some(values.clone()),
        _ => None,
    };

    ParameterDescriptor {
        name: data.name.clone(),
        location,
        required: data.required,
        schema: shape,
        description: data.description.clone(),
        enum_values,
        default: None,
    }
}

pub fn resolve_request_body(
    docs: &DocumentSet,
    file: &Path,
    spec: &OpenAPI,
    body_ref: &ReferenceOr<RequestBody>,
) -> Option<RequestBodyDescriptor> {
    let mut ctx = ResolveCtx { docs, spec, file: file.to_path_buf(), visited: HashSet::new() };
    resolve_request_body_inner(&mut ctx, body_ref, 0)
}

fn resolve_request_body_inner(ctx: &mut ResolveCtx, body_ref: &ReferenceOr<RequestBody>, depth: usize) -> Option<RequestBodyDescriptor> {
    if depth >= MAX_REF_DEPTH {
        return None;
    }
    match body_ref {
        ReferenceOr::Reference { reference } => {
            if !ctx.visited.insert(reference.clone()) {
                return None;
            }
            let resolved = resolve_ref_target(ctx, reference);
            let descriptor = resolved.and_then(|resolved| {
                let components = resolved.spec.components.as_ref()?;
                let target = components.request_bodies.get(&resolved.name)?;
                let prev_spec = ctx.spec;
                let prev_file = std::mem::replace(&mut ctx.file, resolved.file);
                ctx.spec = resolved.spec;
                let descriptor = resolve_request_body_inner(ctx, target, depth + 1);
                ctx.spec = prev_spec;
                ctx.file = prev_file;
                descriptor
            });
            ctx.visited.remove(reference);
            descriptor
        }
        ReferenceOr::Item(body) => {
            let (content_type, media) = body.content.iter().next()?;
            let schema = media.schema.as_ref().map_or(SchemaShape::Unknown, |s| resolve_schema_inner(ctx, s, 0));
            Some(RequestBodyDescriptor { required: body.required, content_type: content_type.clone(), schema })
        }
    }
}
