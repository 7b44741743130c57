//! Tool catalog and `tools/call` dispatch, exercised against a registry
//! built from real (temp-written) OpenAPI fixtures rather than hand-rolled
//! `Operation` values.

use akamai_mcp_gateway::config::{Credentials, Settings};
use akamai_mcp_gateway::dispatcher::tools;
use akamai_mcp_gateway::server::Server;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn credentials() -> Credentials {
    Credentials {
        host: "akab-test1234567.luna.akamaiapis.net".to_string(),
        client_token: "ct".to_string(),
        client_secret: "cs".to_string(),
        access_token: "at".to_string(),
        account_key: None,
    }
}

fn papi_spec() -> &'static str {
    r#"{
        "openapi": "3.0.0",
        "info": {"title": "papi", "version": "1"},
        "paths": {
            "/papi/v1/properties": {
                "get": {
                    "operationId": "listProperties",
                    "parameters": [
                        {"name": "contractId", "in": "query", "required": true, "schema": {"type": "string"}},
                        {"name": "cursor", "in": "query", "required": false, "schema": {"type": "string"}}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }
            },
            "/papi/v1/properties/{propertyId}": {
                "get": {
                    "operationId": "getProperty",
                    "parameters": [
                        {"name": "propertyId", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }
    }"#
}

fn build_server() -> Server {
    let dir = tempfile::tempdir().unwrap();
    let product_dir = dir.path().join("papi");
    std::fs::create_dir_all(&product_dir).unwrap();
    std::fs::write(product_dir.join("papi.json"), papi_spec()).unwrap();

    Server::new(dir.path(), credentials(), &Settings::default(), 5).unwrap()
}

#[test]
fn catalog_includes_meta_tools_and_generated_operations() {
    let server = build_server();
    let catalog = tools::list_tools(&server.registry);

    let names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"raw_request"));
    assert!(names.contains(&"list_operations"));
    assert!(names.contains(&"registry_stats"));
    assert!(names.iter().any(|n| n.contains("listproperties")));
    assert!(names.iter().any(|n| n.contains("getproperty")));
    assert_eq!(catalog.len(), 5);
}

#[test]
fn generated_tool_schema_marks_required_params() {
    let server = build_server();
    let catalog = tools::list_tools(&server.registry);
    let list_properties = catalog.iter().find(|t| t.name.contains("listproperties")).unwrap();
    assert_eq!(list_properties.input_schema["required"], json!(["contractId"]));
    assert_eq!(list_properties.input_schema["properties"]["cursor"]["type"], "string");
}

#[tokio::test]
async fn registry_stats_tool_reports_totals() {
    let server = build_server();
    let cancel = CancellationToken::new();
    let result = tools::call_tool(&server, "registry_stats", &json!({}), &cancel).await;

    assert_eq!(result.is_error, None);
    let body: serde_json::Value = serde_json::from_str(&result.content[0].text).unwrap();
    assert_eq!(body["total"], json!(2));
}

#[tokio::test]
async fn list_operations_tool_filters_by_product_and_query() {
    let server = build_server();
    let cancel = CancellationToken::new();
    let args = json!({"product": "papi", "query": "getProperty"});
    let result = tools::call_tool(&server, "list_operations", &args, &cancel).await;

    let body: serde_json::Value = serde_json::from_str(&result.content[0].text).unwrap();
    let operations = body["operations"].as_array().unwrap();
    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0]["operationId"], "getProperty");
}

#[tokio::test]
async fn calling_an_unknown_tool_name_yields_an_error_envelope_not_a_panic() {
    let server = build_server();
    let cancel = CancellationToken::new();
    let result = tools::call_tool(&server, "no_such_tool", &json!({}), &cancel).await;

    assert_eq!(result.is_error, Some(true));
    assert!(result.content[0].text.contains("InvalidArgument"));
}

#[tokio::test]
async fn raw_request_without_a_name_field_is_an_invalid_argument_not_a_panic() {
    let server = build_server();
    let cancel = CancellationToken::new();
    let result = tools::call_tool(&server, "raw_request", &json!({}), &cancel).await;

    assert_eq!(result.is_error, Some(true));
}
