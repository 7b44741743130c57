//! Spec discovery and ingestion: walks a root directory for OpenAPI
//! documents, resolves each into fully-inlined `Operation`s, and
//! reports per-file failures without aborting the whole load.

use super::model::{HttpMethod, Operation, ParamLocation, ParameterDescriptor};
use super::naming::{base_tool_name, make_unique};
use super::pagination;
use super::schema::{resolve_parameter, resolve_request_body, DocumentSet};
use crate::error::Error;
use openapiv3::{OpenAPI, Operation as OaOperation, PathItem, ReferenceOr};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One successfully or unsuccessfully parsed spec file.
pub struct LoadOutcome {
    pub operations: Vec<Operation>,
    /// `(file path, reason)` for spec files skipped due to parse failure.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Recursively collects candidate spec files (`.json`, `.yaml`, `.yml`)
/// under `root`, in a stable, sorted order so loads are deterministic.
fn discover_spec_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "json" | "yaml" | "yml"))
            {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Derives the `product` tag from a spec file's immediate parent
/// directory name.
fn product_tag(_root: &Path, file: &Path) -> String {
    file.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn parse_spec_file(path: &Path) -> Result<OpenAPI, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let is_yaml = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e != "json");
    if is_yaml {
        serde_yaml::from_str(&contents).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    }
}

/// Canonicalizes a path, falling back to the path itself when the file
/// cannot be stat'd (e.g. already removed between discovery and read).
fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Loads every Operation from every spec file found under `root`.
/// Returns `Error::Config` only if **zero** operations were ingested
/// across the whole tree; individual malformed files are collected
/// into `LoadOutcome::skipped` instead of aborting the load.
///
/// Parsing happens in two passes: every file is parsed into a
/// [`DocumentSet`] first, so a `$ref` in one file that targets a
/// component defined in another file already-loaded-or-not-yet-walked
/// resolves correctly regardless of discovery order.
pub fn load(root: &Path) -> Result<LoadOutcome, Error> {
    let files = discover_spec_files(root);
    let mut parsed: HashMap<PathBuf, OpenAPI> = HashMap::new();
    let mut skipped = Vec::new();

    for file in &files {
        match parse_spec_file(file) {
            Ok(spec) => {
                parsed.insert(canonical_or_self(file), spec);
            }
            Err(reason) => skipped.push((file.clone(), reason)),
        }
    }

    let docs = DocumentSet::new(parsed);
    let mut operations = Vec::new();
    let mut used_names: HashSet<String> = HashSet::new();

    for file in &files {
        let canonical = canonical_or_self(file);
        let Some(spec) = docs.get(&canonical) else {
            continue;
        };
        let product = product_tag(root, file);
        let version = spec.info.version.clone();
        for_each_operation(&docs, &canonical, spec, &product, &version, &mut used_names, &mut operations);
    }

    if operations.is_empty() {
        return Err(Error::config("registry", "zero operations ingested from spec root"));
    }

    Ok(LoadOutcome { operations, skipped })
}

fn for_each_operation(
    docs: &DocumentSet,
    file: &Path,
    spec: &OpenAPI,
    product: &str,
    version: &str,
    used_names: &mut HashSet<String>,
    out: &mut Vec<Operation>,
) {
    for (path_template, path_item_ref) in &spec.paths.paths {
        let ReferenceOr::Item(path_item) = path_item_ref else {
            continue;
        };
        for (method, op) in methods(path_item) {
            let Some(operation_id) = op.operation_id.clone() else {
                continue;
            };

            let mut parameters = resolve_params(docs, file, spec, &path_item.parameters);
            merge_operation_params(&mut parameters, resolve_params(docs, file, spec, &op.parameters));

            let request_body = op.request_body.as_ref().and_then(|b| resolve_request_body(docs, file, spec, b));

            let response_status_classes = op
                .responses
                .responses
                .keys()
                .map(|code| status_class(code))
                .collect::<Vec<_>>();

            let security_schemes = op
                .security
                .as_ref()
                .into_iter()
                .flatten()
                .flat_map(|req| req.keys().cloned())
                .collect();

            let servers = spec.servers.iter().map(|s| s.url.clone()).collect();

            let base_name = base_tool_name(product, &operation_id);
            let tool_name = make_unique(base_name, used_names);

            let has_link_header = pagination::declares_link_header(&op.responses);
            let pagination_kind = pagination::detect(method, &parameters, has_link_header);
            let supports_pagination = pagination::supports_pagination(method, &parameters, has_link_header);

            out.push(Operation {
                operation_id,
                tool_name,
                method,
                path: path_template.clone(),
                product: product.to_string(),
                version: version.to_string(),
                parameters,
                request_body,
                response_status_classes,
                tags: op.tags.clone(),
                security_schemes,
                servers,
                supports_pagination,
                pagination_kind,
            });
        }
    }
}

fn methods(item: &PathItem) -> Vec<(HttpMethod, &OaOperation)> {
    let mut out = Vec::new();
    if let Some(o) = &item.get {
        out.push((HttpMethod::Get, o));
    }
    if let Some(o) = &item.put {
        out.push((HttpMethod::Put, o));
    }
    if let Some(o) = &item.post {
        out.push((HttpMethod::Post, o));
    }
    if let Some(o) = &item.delete {
        out.push((HttpMethod::Delete, o));
    }
    if let Some(o) = &item.patch {
        out.push((HttpMethod::Patch, o));
    }
    if let Some(o) = &item.head {
        out.push((HttpMethod::Head, o));
    }
    if let Some(o) = &item.options {
        out.push((HttpMethod::Options, o));
    }
    out
}

fn resolve_params(
    docs: &DocumentSet,
    file: &Path,
    spec: &OpenAPI,
    refs: &[ReferenceOr<openapiv3::Parameter>],
) -> Vec<ParameterDescriptor> {
    refs.iter().filter_map(|r| resolve_parameter(docs, file, spec, r)).collect()
}

/// Merges operation-level parameters over path-level ones: a parameter
/// with the same `(name, location)` shadows the inherited one.
fn merge_operation_params(base: &mut Vec<ParameterDescriptor>, overrides: Vec<ParameterDescriptor>) {
    for over in overrides {
        if let Some(existing) = base.iter_mut().find(|p| p.name == over.name && p.location == over.location) {
            *existing = over;
        } else {
            base.push(over);
        }
    }
}

fn status_class(code: &openapiv3::StatusCode) -> String {
    match code {
        openapiv3::StatusCode::Code(n) => format!("{}xx", n / 100),
        openapiv3::StatusCode::Range(r) => r.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_spec_json() -> &'static str {
        r#"{
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/properties/{propertyId}": {
                    "parameters": [
                        {"name": "propertyId", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "get": {
                        "operationId": "getProperty",
                        "responses": {"200": {"description": "ok"}}
                    }
                },
                "/properties": {
                    "get": {
                        "operationId": "listProperties",
                        "parameters": [
                            {"name": "limit", "in": "query", "required": false, "schema": {"type": "integer"}}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }"#
    }

    #[test]
    fn loads_operations_from_nested_product_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let product_dir = dir.path().join("papi");
        std::fs::create_dir_all(&product_dir).unwrap();
        let mut f = std::fs::File::create(product_dir.join("papi.json")).unwrap();
        f.write_all(sample_spec_json().as_bytes()).unwrap();

        let outcome = load(dir.path()).unwrap();
        assert_eq!(outcome.operations.len(), 2);
        assert!(outcome.operations.iter().all(|o| o.product == "papi"));
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn malformed_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let product_dir = dir.path().join("papi");
        std::fs::create_dir_all(&product_dir).unwrap();
        std::fs::File::create(product_dir.join("broken.json"))
            .unwrap()
            .write_all(b"{ not json")
            .unwrap();
        std::fs::File::create(product_dir.join("good.json"))
            .unwrap()
            .write_all(sample_spec_json().as_bytes())
            .unwrap();

        let outcome = load(dir.path()).unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.operations.len(), 2);
    }

    #[test]
    fn zero_operations_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn path_level_params_inherited_unless_shadowed() {
        let dir = tempfile::tempdir().unwrap();
        let product_dir = dir.path().join("papi");
        std::fs::create_dir_all(&product_dir).unwrap();
        std::fs::File::create(product_dir.join("papi.json"))
            .unwrap()
            .write_all(sample_spec_json().as_bytes())
            .unwrap();

        let outcome = load(dir.path()).unwrap();
        let get_prop = outcome.operations.iter().find(|o| o.operation_id == "getProperty").unwrap();
        assert_eq!(get_prop.path_params().count(), 1);
    }
}
