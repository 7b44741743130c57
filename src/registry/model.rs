//! Registry data model: `Operation`, parameter descriptors, and the
//! opaque schema-shape representation used instead of reflecting
//! arbitrary JSON Schema in the type system.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

impl ParamLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        }
    }
}

/// Opaque representation of a JSON Schema fragment. Dynamic schema
/// handling is interpretive, not generative: validation walks this
/// shape rather than attempting to reflect arbitrary JSON Schema in the
/// Rust type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SchemaShape {
    Scalar { ty: String },
    Object { properties: Vec<(String, SchemaShape)> },
    Array { items: Box<SchemaShape> },
    Enum { ty: String, values: Vec<String> },
    Unknown,
    /// A `$ref` cycle was detected and resolution stopped at the depth
    /// cap; the descriptor is well-formed but truncated.
    Recursive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub schema: SchemaShape,
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBodyDescriptor {
    pub required: bool,
    pub content_type: String,
    pub schema: SchemaShape,
}

/// Pagination idiom detected for an operation. Detection populates one
/// variant; the pagination driver dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationKind {
    OffsetLimit,
    PageNumber,
    Cursor,
    LinkHeader,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: String,
    pub tool_name: String,
    pub method: HttpMethod,
    pub path: String,
    pub product: String,
    pub version: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub request_body: Option<RequestBodyDescriptor>,
    pub response_status_classes: Vec<String>,
    pub tags: Vec<String>,
    pub security_schemes: Vec<String>,
    pub servers: Vec<String>,
    pub supports_pagination: bool,
    pub pagination_kind: PaginationKind,
}

impl Operation {
    #[must_use]
    pub fn path_params(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.location == ParamLocation::Path)
    }

    #[must_use]
    pub fn query_params(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.location == ParamLocation::Query)
    }

    #[must_use]
    pub fn header_params(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.location == ParamLocation::Header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_method_round_trips_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
    }

    #[test]
    fn operation_partitions_params_by_location() {
        let op = Operation {
            operation_id: "listThings".into(),
            tool_name: "akamai_papi_listthings".into(),
            method: HttpMethod::Get,
            path: "/things/{thingId}".into(),
            product: "papi".into(),
            version: "v1".into(),
            parameters: vec![
                ParameterDescriptor {
                    name: "thingId".into(),
                    location: ParamLocation::Path,
                    required: true,
                    schema: SchemaShape::Scalar { ty: "string".into() },
                    description: None,
                    enum_values: None,
                    default: None,
                },
                ParameterDescriptor {
                    name: "limit".into(),
                    location: ParamLocation::Query,
                    required: false,
                    schema: SchemaShape::Scalar { ty: "integer".into() },
                    description: None,
                    enum_values: None,
                    default: None,
                },
            ],
            request_body: None,
            response_status_classes: vec!["2xx".into()],
            tags: vec![],
            security_schemes: vec![],
            servers: vec![],
            supports_pagination: true,
            pagination_kind: PaginationKind::OffsetLimit,
        };
        assert_eq!(op.path_params().count(), 1);
        assert_eq!(op.query_params().count(), 1);
        assert_eq!(op.header_params().count(), 0);
    }
}
