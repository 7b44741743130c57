//! Tool catalog and `tools/call` dispatch: the three always-exposed
//! meta-tools (`raw_request`, `list_operations`, `registry_stats`) plus
//! one thin generated handler per registry operation, each wrapping its
//! result in the `{content:[...], isError?}` envelope per the protocol's
//! wrapping rule — the JSON-RPC `error` object is reserved for
//! protocol-level faults, never used for a failed tool call.

use crate::constants;
use crate::error::Error;
use crate::executor::ExecutionRequest;
use crate::registry::{HttpMethod, Operation, Registry, SchemaShape, SearchFilter};
use crate::server::Server;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    pub(crate) fn ok(value: &Value) -> Self {
        let text = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        Self { content: vec![ContentBlock { kind: "text", text }], is_error: None }
    }

    pub(crate) fn err(error: &Error) -> Self {
        let text = serde_json::to_string(&error.to_json()).unwrap_or_else(|_| "null".to_string());
        Self { content: vec![ContentBlock { kind: "text", text }], is_error: Some(true) }
    }
}

#[derive(Debug, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn shape_to_schema(shape: &SchemaShape) -> Value {
    match shape {
        SchemaShape::Scalar { ty } => json!({"type": ty}),
        SchemaShape::Enum { ty, values } => json!({"type": ty, "enum": values}),
        SchemaShape::Array { items } => json!({"type": "array", "items": shape_to_schema(items)}),
        SchemaShape::Object { properties } => {
            let props: Map<String, Value> =
                properties.iter().map(|(k, v)| (k.clone(), shape_to_schema(v))).collect();
            json!({"type": "object", "properties": Value::Object(props)})
        }
        SchemaShape::Unknown | SchemaShape::Recursive => json!({}),
    }
}

/// Builds the JSON-schema-shaped `inputSchema` for one generated tool
/// from its operation's parameters and optional request body.
#[must_use]
pub fn input_schema_for(op: &Operation) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for p in &op.parameters {
        let mut schema = shape_to_schema(&p.schema);
        if let Some(desc) = &p.description {
            schema["description"] = json!(desc);
        }
        properties.insert(p.name.clone(), schema);
        if p.required {
            required.push(Value::String(p.name.clone()));
        }
    }

    if let Some(body) = &op.request_body {
        properties.insert("body".to_string(), shape_to_schema(&body.schema));
        if body.required {
            required.push(Value::String("body".to_string()));
        }
    }

    json!({ "type": "object", "properties": Value::Object(properties), "required": required })
}

fn raw_request_def() -> ToolDef {
    ToolDef {
        name: constants::TOOL_RAW_REQUEST.to_string(),
        description: "Invoke any registry operation by its tool name.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "pathParams": {"type": "object"},
                "queryParams": {"type": "object"},
                "headers": {"type": "object"},
                "body": {},
                "paginate": {"type": "boolean"},
                "maxPages": {"type": "integer"},
            },
            "required": ["name"],
        }),
    }
}

fn list_operations_def() -> ToolDef {
    ToolDef {
        name: constants::TOOL_LIST_OPERATIONS.to_string(),
        description: "Search the operation registry.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product": {"type": "string"},
                "method": {"type": "string"},
                "query": {"type": "string"},
                "paginatedOnly": {"type": "boolean"},
            },
        }),
    }
}

fn registry_stats_def() -> ToolDef {
    ToolDef {
        name: constants::TOOL_REGISTRY_STATS.to_string(),
        description: "Report operation counts by product and method.".to_string(),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

/// Lists the full tool catalog: the three meta-tools plus one generated
/// handler per registry operation.
#[must_use]
pub fn list_tools(registry: &Registry) -> Vec<ToolDef> {
    let mut tools = vec![raw_request_def(), list_operations_def(), registry_stats_def()];
    for op in registry.search(&SearchFilter::default()) {
        tools.push(ToolDef {
            name: op.tool_name.clone(),
            description: format!("{} {} ({})", op.method.as_str(), op.path, op.product),
            input_schema: input_schema_for(op),
        });
    }
    tools
}

fn object_field(arguments: &Value, key: &str) -> HashMap<String, Value> {
    arguments.get(key).and_then(Value::as_object).map(|m| m.clone().into_iter().collect()).unwrap_or_default()
}

fn string_map_field(arguments: &Value, key: &str) -> HashMap<String, String> {
    arguments
        .get(key)
        .and_then(Value::as_object)
        .map(|m| m.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
        .unwrap_or_default()
}

fn execution_request_from_args(arguments: &Value) -> ExecutionRequest {
    ExecutionRequest {
        path_params: object_field(arguments, "pathParams"),
        query_params: object_field(arguments, "queryParams"),
        headers: string_map_field(arguments, "headers"),
        body: arguments.get("body").cloned(),
        paginate: arguments.get("paginate").and_then(Value::as_bool).unwrap_or(false),
        max_pages: arguments
            .get("maxPages")
            .and_then(Value::as_u64)
            .map_or(constants::DEFAULT_MAX_PAGES, |v| v as u32),
    }
}

fn parse_method(s: &str) -> Option<HttpMethod> {
    match s.to_uppercase().as_str() {
        "GET" => Some(HttpMethod::Get),
        "PUT" => Some(HttpMethod::Put),
        "POST" => Some(HttpMethod::Post),
        "DELETE" => Some(HttpMethod::Delete),
        "PATCH" => Some(HttpMethod::Patch),
        "HEAD" => Some(HttpMethod::Head),
        "OPTIONS" => Some(HttpMethod::Options),
        _ => None,
    }
}

async fn invoke_operation(
    server: &Server,
    op: &Operation,
    arguments: &Value,
    cancel: &CancellationToken,
) -> Result<Value, Error> {
    let request = execution_request_from_args(arguments);
    let start = std::time::Instant::now();
    server.metrics.record_tool_call_start(&op.tool_name);

    let result = server.executor.execute(op, request, cancel).await;
    server.metrics.record_tool_call(&op.tool_name, result.is_err(), start.elapsed().as_secs_f64());

    let result = result?;
    Ok(serde_json::to_value(result)?)
}

async fn raw_request(server: &Server, arguments: &Value, cancel: &CancellationToken) -> Result<Value, Error> {
    let name = arguments
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_argument("raw_request requires a 'name' field"))?;
    let op = server.registry.get(name).ok_or_else(|| Error::invalid_argument(format!("unknown operation '{name}'")))?;
    invoke_operation(server, op, arguments, cancel).await
}

fn list_operations(server: &Server, arguments: &Value) -> Result<Value, Error> {
    let product = arguments.get("product").and_then(Value::as_str);
    let method = arguments.get("method").and_then(Value::as_str).and_then(parse_method);
    let query = arguments.get("query").and_then(Value::as_str);
    let paginated_only = arguments.get("paginatedOnly").and_then(Value::as_bool).unwrap_or(false);

    let filter = SearchFilter { product, method, query, paginated_only };
    let operations: Vec<Value> = server
        .registry
        .search(&filter)
        .into_iter()
        .map(|op| {
            json!({
                "name": op.tool_name,
                "operationId": op.operation_id,
                "method": op.method.as_str(),
                "path": op.path,
                "product": op.product,
                "paginated": op.supports_pagination,
            })
        })
        .collect();

    Ok(json!({ "operations": operations }))
}

fn registry_stats(server: &Server) -> Result<Value, Error> {
    Ok(serde_json::to_value(server.registry.stats())?)
}

async fn dispatch(server: &Server, name: &str, arguments: &Value, cancel: &CancellationToken) -> Result<Value, Error> {
    match name {
        constants::TOOL_RAW_REQUEST => raw_request(server, arguments, cancel).await,
        constants::TOOL_LIST_OPERATIONS => list_operations(server, arguments),
        constants::TOOL_REGISTRY_STATS => registry_stats(server),
        other => {
            let op = server
                .registry
                .get(other)
                .ok_or_else(|| Error::invalid_argument(format!("unknown tool '{other}'")))?;
            invoke_operation(server, op, arguments, cancel).await
        }
    }
}

/// Invokes one tool call end to end and wraps the outcome in the
/// content envelope. Never returns `Err`: a failed tool call is a
/// successful dispatch whose envelope carries `isError: true`.
pub async fn call_tool(server: &Server, name: &str, arguments: &Value, cancel: &CancellationToken) -> ToolCallResult {
    match dispatch(server, name, arguments, cancel).await {
        Ok(value) => ToolCallResult::ok(&value),
        Err(e) => ToolCallResult::err(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ParamLocation, ParameterDescriptor, PaginationKind};

    fn sample_op() -> Operation {
        Operation {
            operation_id: "listProperties".into(),
            tool_name: "akamai_papi_listProperties".into(),
            method: HttpMethod::Get,
            path: "/papi/v1/properties/{propertyId}".into(),
            product: "papi".into(),
            version: "v1".into(),
            parameters: vec![ParameterDescriptor {
                name: "propertyId".into(),
                location: ParamLocation::Path,
                required: true,
                schema: SchemaShape::Scalar { ty: "string".into() },
                description: Some("the property id".into()),
                enum_values: None,
                default: None,
            }],
            request_body: None,
            response_status_classes: vec!["2xx".into()],
            tags: vec![],
            security_schemes: vec![],
            servers: vec![],
            supports_pagination: true,
            pagination_kind: PaginationKind::OffsetLimit,
        }
    }

    #[test]
    fn input_schema_marks_required_params() {
        let schema = input_schema_for(&sample_op());
        assert_eq!(schema["required"], json!(["propertyId"]));
        assert_eq!(schema["properties"]["propertyId"]["type"], "string");
    }

    #[test]
    fn parse_method_is_case_insensitive() {
        assert_eq!(parse_method("get"), Some(HttpMethod::Get));
        assert_eq!(parse_method("bogus"), None);
    }

    #[test]
    fn execution_request_from_args_defaults_max_pages() {
        let args = json!({});
        let req = execution_request_from_args(&args);
        assert_eq!(req.max_pages, constants::DEFAULT_MAX_PAGES);
        assert!(!req.paginate);
    }

    #[test]
    fn tool_call_result_ok_has_no_is_error_field() {
        let result = ToolCallResult::ok(&json!({"status": 200}));
        let rendered = serde_json::to_string(&result).unwrap();
        assert!(!rendered.contains("isError"));
    }

    #[test]
    fn tool_call_result_err_sets_is_error_true() {
        let result = ToolCallResult::err(&Error::invalid_argument("bad"));
        assert_eq!(result.is_error, Some(true));
    }
}
