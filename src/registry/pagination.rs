//! Pagination idiom detection: a `GET` operation whose query parameters
//! include one of the recognized pagination parameter names is marked
//! `supports_pagination`, tagged with the `PaginationKind` its
//! parameter set implies. Detection is purely structural — it never
//! inspects response bodies, since the registry is built from the spec
//! alone. A declared `Link` response header is the one exception that
//! still counts as structural: it's read from the OpenAPI document's
//! response object, not from an actual HTTP response.

use super::model::{HttpMethod, ParameterDescriptor, PaginationKind};
use crate::constants::PAGINATION_PARAM_NAMES;
use openapiv3::{ReferenceOr, Responses, StatusCode};

/// True if any 2xx response in the operation's `responses` map declares
/// a `Link` header, the RFC 5988 continuation idiom used by vendors that
/// don't expose a cursor/page query parameter at all.
#[must_use]
pub fn declares_link_header(responses: &Responses) -> bool {
    responses.responses.iter().any(|(code, resp)| {
        let is_2xx = match code {
            StatusCode::Code(n) => *n / 100 == 2,
            StatusCode::Range(r) => r.starts_with('2'),
        };
        is_2xx && matches!(resp, ReferenceOr::Item(r) if r.headers.keys().any(|h| h.eq_ignore_ascii_case("link")))
    })
}

/// Classifies the pagination idiom implied by an operation's query
/// parameters and declared response headers. Only `GET` operations are
/// eligible; everything else is `PaginationKind::None`. A declared
/// `Link` header takes priority over query-parameter guessing: it's an
/// explicit continuation mechanism, not a name-based inference.
#[must_use]
pub fn detect(method: HttpMethod, params: &[ParameterDescriptor], has_link_header: bool) -> PaginationKind {
    if method != HttpMethod::Get {
        return PaginationKind::None;
    }

    if has_link_header {
        return PaginationKind::LinkHeader;
    }

    let names: Vec<String> = params
        .iter()
        .filter(|p| p.location == super::model::ParamLocation::Query)
        .map(|p| p.name.to_lowercase())
        .collect();

    let has = |want: &str| names.iter().any(|n| n == want);

    if has("cursor") || has("continuationtoken") {
        PaginationKind::Cursor
    } else if has("page") {
        PaginationKind::PageNumber
    } else if has("offset") && has("limit") {
        PaginationKind::OffsetLimit
    } else if has("limit") || has("pagesize") {
        PaginationKind::OffsetLimit
    } else {
        PaginationKind::None
    }
}

/// Whether any recognized pagination parameter name appears at all, or a
/// `Link` header was declared, independent of which kind it resolves to.
#[must_use]
pub fn supports_pagination(method: HttpMethod, params: &[ParameterDescriptor], has_link_header: bool) -> bool {
    if method != HttpMethod::Get {
        return false;
    }
    has_link_header
        || params.iter().any(|p| {
            p.location == super::model::ParamLocation::Query
                && PAGINATION_PARAM_NAMES.iter().any(|want| want.eq_ignore_ascii_case(&p.name))
        })
}
