//! Three-way index over a loaded operation set: by tool name (O(1)
//! lookup), by product, by method. Built once at load time and never
//! mutated afterward — reads require no synchronization.

use super::model::{HttpMethod, Operation};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct SearchFilter<'a> {
    pub product: Option<&'a str>,
    pub method: Option<HttpMethod>,
    pub query: Option<&'a str>,
    pub paginated_only: bool,
}

pub struct Index {
    by_name: HashMap<String, usize>,
    by_product: HashMap<String, Vec<usize>>,
    by_method: HashMap<HttpMethod, Vec<usize>>,
    operations: Vec<Operation>,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub by_product: Vec<(String, usize)>,
    pub by_method: Vec<(String, usize)>,
}

impl Index {
    #[must_use]
    pub fn build(operations: Vec<Operation>) -> Self {
        let mut by_name = HashMap::with_capacity(operations.len());
        let mut by_product: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_method: HashMap<HttpMethod, Vec<usize>> = HashMap::new();

        for (idx, op) in operations.iter().enumerate() {
            by_name.insert(op.tool_name.clone(), idx);
            by_product.entry(op.product.clone()).or_default().push(idx);
            by_method.entry(op.method).or_default().push(idx);
        }

        Self { by_name, by_product, by_method, operations }
    }

    #[must_use]
    pub fn get(&self, tool_name: &str) -> Option<&Operation> {
        self.by_name.get(tool_name).map(|&idx| &self.operations[idx])
    }

    #[must_use]
    pub fn search(&self, filter: &SearchFilter<'_>) -> Vec<&Operation> {
        self.operations
            .iter()
            .filter(|op| filter.product.is_none_or(|p| op.product.eq_ignore_ascii_case(p)))
            .filter(|op| filter.method.is_none_or(|m| op.method == m))
            .filter(|op| !filter.paginated_only || op.supports_pagination)
            .filter(|op| {
                filter.query.is_none_or(|q| {
                    let q = q.to_lowercase();
                    op.tool_name.to_lowercase().contains(&q)
                        || op.operation_id.to_lowercase().contains(&q)
                        || op.path.to_lowercase().contains(&q)
                })
            })
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut by_product: Vec<(String, usize)> =
            self.by_product.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        by_product.sort();
        let mut by_method: Vec<(String, usize)> =
            self.by_method.iter().map(|(k, v)| (k.as_str().to_string(), v.len())).collect();
        by_method.sort();
        RegistryStats { total: self.operations.len(), by_product, by_method }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::model::{PaginationKind};

    fn op(name: &str, product: &str, method: HttpMethod, paginated: bool) -> Operation {
        Operation {
            operation_id: name.to_string(),
            tool_name: format!("akamai_{product}_{name}"),
            method,
            path: format!("/{name}"),
            product: product.to_string(),
            version: "v1".to_string(),
            parameters: vec![],
            request_body: None,
            response_status_classes: vec!["2xx".into()],
            tags: vec![],
            security_schemes: vec![],
            servers: vec![],
            supports_pagination: paginated,
            pagination_kind: if paginated { PaginationKind::OffsetLimit } else { PaginationKind::None },
        }
    }

    #[test]
    fn get_returns_exact_tool_name() {
        let idx = Index::build(vec![op("listProperties", "papi", HttpMethod::Get, true)]);
        assert!(idx.get("akamai_papi_listProperties").is_some());
        assert!(idx.get("missing").is_none());
    }

    #[test]
    fn search_filters_by_product_and_pagination() {
        let idx = Index::build(vec![
            op("listProperties", "papi", HttpMethod::Get, true),
            op("getProperty", "papi", HttpMethod::Get, false),
            op("listZones", "dns", HttpMethod::Get, true),
        ]);
        let filter = SearchFilter { product: Some("papi"), paginated_only: true, ..Default::default() };
        let results = idx.search(&filter);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].operation_id, "listProperties");
    }

    #[test]
    fn stats_counts_by_product_and_method() {
        let idx = Index::build(vec![
            op("a", "papi", HttpMethod::Get, false),
            op("b", "papi", HttpMethod::Post, false),
            op("c", "dns", HttpMethod::Get, false),
        ]);
        let stats = idx.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_product, vec![("dns".to_string(), 1), ("papi".to_string(), 2)]);
    }
}
