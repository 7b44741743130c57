//! Parameter validation: presence of required parameters and
//! membership of enum-constrained values. Fails on the first
//! missing/invalid field, in declaration order.

use crate::error::Error;
use crate::registry::{Operation, ParamLocation};
use std::collections::HashMap;

/// Looks up a parameter's supplied value by location.
fn lookup<'a>(
    location: ParamLocation,
    name: &str,
    path_params: &'a HashMap<String, serde_json::Value>,
    query_params: &'a HashMap<String, serde_json::Value>,
    headers: &'a HashMap<String, String>,
) -> Option<serde_json::Value> {
    match location {
        ParamLocation::Path => path_params.get(name).cloned(),
        ParamLocation::Query => query_params.get(name).cloned(),
        ParamLocation::Header => headers.get(name).cloned().map(serde_json::Value::String),
    }
}

/// Validates every parameter of `op` against the supplied call
/// arguments.
///
/// # Errors
/// Returns `Error::InvalidArgument` naming the first missing required
/// parameter, or the first enum-constrained parameter whose value is
/// not among the declared enum values.
pub fn validate(
    op: &Operation,
    path_params: &HashMap<String, serde_json::Value>,
    query_params: &HashMap<String, serde_json::Value>,
    headers: &HashMap<String, String>,
) -> Result<(), Error> {
    for param in &op.parameters {
        let value = lookup(param.location, &param.name, path_params, query_params, headers);

        match &value {
            None if param.required => {
                return Err(Error::invalid_argument(format!("missing required parameter '{}'", param.name)));
            }
            None => continue,
            Some(v) => {
                if let Some(allowed) = &param.enum_values {
                    let as_str = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    if !allowed.iter().any(|a| a == &as_str) {
                        return Err(Error::invalid_argument(format!(
                            "parameter '{}' must be one of {:?}, got '{as_str}'",
                            param.name, allowed
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}
