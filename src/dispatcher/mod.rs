//! Tool-Call Dispatcher: line-delimited JSON-RPC 2.0 over stdin/stdout.
//! Every inbound message is dispatched by `method`; `tools/call`
//! requests each run on their own task so the executor stays reentrant
//! and one slow call never blocks an unrelated one. Response ordering is
//! by completion, not arrival — `id` correlates.

pub mod protocol;
pub mod shutdown;
pub mod tools;

use crate::constants;
use crate::server::Server;
use protocol::{parse_line, RpcRequest, RpcResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinSet;

fn initialize_result() -> Value {
    json!({
        "serverInfo": { "name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION") },
        "capabilities": { "tools": {} },
    })
}

fn tools_list_result(server: &Server) -> Value {
    json!({ "tools": tools::list_tools(&server.registry) })
}

async fn tools_call_response(server: &Server, id: Value, params: &Value) -> RpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return RpcResponse::fault(id, constants::JSONRPC_INVALID_PARAMS, "tools/call requires a 'name' param");
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let guard = match server.shutdown.enter_call() {
        Ok(guard) => guard,
        Err(e) => return RpcResponse::success(id, serde_json::to_value(tools::ToolCallResult::err(&e)).unwrap_or(Value::Null)),
    };

    let cancel = server.shutdown.cancellation_token();
    let result = tools::call_tool(server, name, &arguments, &cancel).await;
    drop(guard);

    RpcResponse::success(id, serde_json::to_value(result).unwrap_or(Value::Null))
}

async fn handle_request(server: &Server, request: RpcRequest) -> RpcResponse {
    let id = request.id;
    match request.method.as_str() {
        "initialize" => RpcResponse::success(id, initialize_result()),
        "tools/list" => RpcResponse::success(id, tools_list_result(server)),
        "tools/call" => tools_call_response(server, id, &request.params).await,
        other => RpcResponse::fault(id, constants::JSONRPC_METHOD_NOT_FOUND, format!("method not found: {other}")),
    }
}

async fn write_response(stdout: &AsyncMutex<tokio::io::Stdout>, response: &RpcResponse) {
    let Ok(mut line) = serde_json::to_string(response) else {
        return;
    };
    line.push('\n');
    let mut out = stdout.lock().await;
    let _ = out.write_all(line.as_bytes()).await;
    let _ = out.flush().await;
}

/// Drives the dispatcher loop to completion: reads one JSON-RPC request
/// per line from stdin until EOF, an explicit `shutdown` request, or the
/// shutdown coordinator's cancellation token fires (signal handler).
/// Returns the process exit code from the drain sequence.
pub async fn run(server: Arc<Server>) -> i32 {
    let stdout = Arc::new(AsyncMutex::new(tokio::io::stdout()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    loop {
        let next = tokio::select! {
            biased;
            () = server.shutdown.cancellation_token().cancelled() => None,
            line = lines.next_line() => line.unwrap_or(None),
        };

        let Some(line) = next else { break };
        if line.trim().is_empty() {
            continue;
        }

        let request = match parse_line(&line) {
            Ok(r) => r,
            Err(fault) => {
                write_response(&stdout, &fault).await;
                continue;
            }
        };

        if request.method == "shutdown" {
            write_response(&stdout, &RpcResponse::success(request.id, json!({}))).await;
            break;
        }

        let server = server.clone();
        let stdout = stdout.clone();
        tasks.spawn(async move {
            let response = handle_request(&server, request).await;
            write_response(&stdout, &response).await;
        });
    }

    // `shutdown()` owns the drain timeout itself (it waits on the
    // coordinator's own in-flight count, not on this JoinSet). Only
    // after it returns — cleanly or forced — do we abort whatever
    // per-call tasks are still running and drain the JoinSet so none
    // are left dangling.
    let exit_code = server.shutdown.shutdown().await;
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}

    exit_code
}
