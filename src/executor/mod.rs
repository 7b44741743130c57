//! Universal Executor: the pure-function pipeline (§4.I) that turns an
//! `ExecutionRequest` against a registry `Operation` into a signed,
//! retried, cached HTTP call and a merged `ExecutionResult`.

pub mod fingerprint;
pub mod headers;
pub mod paginate;
pub mod pathbuild;
pub mod querybuild;
pub mod validate;

use crate::constants::{DEFAULT_MAX_PAGES, HARD_MAX_PAGES};
use crate::error::Error;
use crate::registry::{Operation, PaginationKind};
use crate::transport::{OutboundRequest, Transport};
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// One invocation against a registry operation, already unmarshalled
/// from the dispatcher's loose argument map.
#[derive(Debug, Default, Clone)]
pub struct ExecutionRequest {
    pub path_params: HashMap<String, serde_json::Value>,
    pub query_params: HashMap<String, serde_json::Value>,
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub paginate: bool,
    pub max_pages: u32,
}

impl ExecutionRequest {
    #[must_use]
    pub fn new() -> Self {
        Self { max_pages: DEFAULT_MAX_PAGES, ..Self::default() }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionResult {
    pub status: u16,
    pub body: serde_json::Value,
    pub paginated: bool,
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    pub elapsed_ms: u64,
}

pub struct Executor {
    transport: Transport,
    account_key: Option<String>,
}

impl Executor {
    #[must_use]
    pub fn new(transport: Transport, account_key: Option<String>) -> Self {
        Self { transport, account_key }
    }

    /// Runs the full pipeline for one call against `op`.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` on validation failure, or any
    /// error surfaced by the transport (`UpstreamClientError`,
    /// `UpstreamUnavailable`, `CircuitOpen`, `Cancelled`,
    /// `PayloadTooLarge`).
    pub async fn execute(&self, op: &Operation, req: ExecutionRequest, cancel: &CancellationToken) -> Result<ExecutionResult, Error> {
        let start = Instant::now();

        let assembled_headers = headers::assemble(&req.headers, req.body.is_some());
        validate::validate(op, &req.path_params, &req.query_params, &req.headers)?;

        let path = pathbuild::build(&op.path, &req.path_params)?;
        let is_get = op.method == crate::registry::HttpMethod::Get;

        let should_paginate = req.paginate && op.supports_pagination && is_get;
        let max_pages = req.max_pages.clamp(1, HARD_MAX_PAGES);

        if should_paginate {
            self.execute_paginated(op, req, &path, &assembled_headers, max_pages, cancel, start).await
        } else {
            self.execute_single(op, &req, &path, &assembled_headers, is_get, cancel, start).await
        }
    }

    async fn execute_single(
        &self,
        op: &Operation,
        req: &ExecutionRequest,
        path: &str,
        assembled_headers: &[(String, String)],
        is_get: bool,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<ExecutionResult, Error> {
        let query_pairs = querybuild::build(&req.query_params);
        let path_and_query = format!("{path}{}", querybuild::to_query_string(&query_pairs));

        let cache_key = is_get.then(|| {
            fingerprint::compute(op.method.as_str(), path, &query_pairs, assembled_headers, req.body.as_ref(), self.account_key.as_deref())
        });

        let body_bytes = req.body.as_ref().map(|b| b.to_string().into_bytes());

        let outbound = OutboundRequest {
            method: op.method.as_str(),
            path_and_query: &path_and_query,
            headers: assembled_headers.to_vec(),
            body: body_bytes,
            cache_key,
        };

        let response = self.transport.execute(outbound, cancel).await?;

        Ok(ExecutionResult {
            status: response.status,
            body: response.body,
            paginated: false,
            page_count: 1,
            total_items: None,
            elapsed_ms: elapsed_ms(start),
        })
    }

    async fn execute_paginated(
        &self,
        op: &Operation,
        mut req: ExecutionRequest,
        path: &str,
        assembled_headers: &[(String, String)],
        max_pages: u32,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<ExecutionResult, Error> {
        if op.pagination_kind == PaginationKind::LinkHeader {
            return self.execute_paginated_by_link(op, &req, path, assembled_headers, max_pages, cancel, start).await;
        }

        let Some(cursor_param) = paginate::cursor_param_name(op).map(str::to_string) else {
            return self.execute_single(op, &req, path, assembled_headers, true, cancel, start).await;
        };

        let mut pages = Vec::new();
        let mut last_status = 200;

        for _ in 0..max_pages {
            let query_pairs = querybuild::build(&req.query_params);
            let path_and_query = format!("{path}{}", querybuild::to_query_string(&query_pairs));
            let cache_key = fingerprint::compute(
                op.method.as_str(),
                path,
                &query_pairs,
                assembled_headers,
                req.body.as_ref(),
                self.account_key.as_deref(),
            );

            let outbound = OutboundRequest {
                method: op.method.as_str(),
                path_and_query: &path_and_query,
                headers: assembled_headers.to_vec(),
                body: None,
                cache_key: Some(cache_key),
            };

            let response = self.transport.execute(outbound, cancel).await?;
            last_status = response.status;
            let continuation = paginate::extract_continuation(&response.body);
            pages.push(response.body);

            match continuation {
                Some(token) => {
                    req.query_params.insert(cursor_param.clone(), serde_json::Value::String(token));
                }
                None => break,
            }
        }

        let total_items = paginate::first_total_items(&pages);
        let page_count = pages.len() as u32;
        let body = paginate::merge_pages(&pages);

        Ok(ExecutionResult {
            status: last_status,
            body,
            paginated: true,
            page_count,
            total_items,
            elapsed_ms: elapsed_ms(start),
        })
    }

    /// Pagination driver for operations whose continuation is carried in
    /// an HTTP `Link` response header rather than a body field: each
    /// page's `rel="next"` URL supplies the request target for the next
    /// round-trip instead of a query parameter the caller controls.
    async fn execute_paginated_by_link(
        &self,
        op: &Operation,
        req: &ExecutionRequest,
        path: &str,
        assembled_headers: &[(String, String)],
        max_pages: u32,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<ExecutionResult, Error> {
        let query_pairs = querybuild::build(&req.query_params);
        let mut path_and_query = format!("{path}{}", querybuild::to_query_string(&query_pairs));

        let mut pages = Vec::new();
        let mut last_status = 200;

        for _ in 0..max_pages {
            let cache_key =
                fingerprint::compute(op.method.as_str(), &path_and_query, &[], assembled_headers, None, self.account_key.as_deref());

            let outbound = OutboundRequest {
                method: op.method.as_str(),
                path_and_query: &path_and_query,
                headers: assembled_headers.to_vec(),
                body: None,
                cache_key: Some(cache_key),
            };

            let response = self.transport.execute(outbound, cancel).await?;
            last_status = response.status;
            let next = response.link_header.as_deref().and_then(paginate::parse_link_next);
            pages.push(response.body);

            match next.as_deref().and_then(paginate::path_and_query_from_link) {
                Some(next_path_and_query) => path_and_query = next_path_and_query,
                None => break,
            }
        }

        let total_items = paginate::first_total_items(&pages);
        let page_count = pages.len() as u32;
        let body = paginate::merge_pages(&pages);

        Ok(ExecutionResult {
            status: last_status,
            body,
            paginated: true,
            page_count,
            total_items,
            elapsed_ms: elapsed_ms(start),
        })
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
