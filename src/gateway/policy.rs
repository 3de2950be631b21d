use std::collections::HashSet;

use serde_json::Value;

use crate::resources::{DeletionPolicy, ResourceDescriptor};
use crate::types::{Caller, Row};

/// Row-visibility policy enforced on the backend side of a gateway:
/// soft-deleted rows of the listed tables are hidden from callers without
/// admin rights. Mirrors the managed backend's row-level security rules.
#[derive(Debug, Clone, Default)]
pub struct RowPolicy {
    soft_delete_tables: HashSet<String>,
}

impl RowPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resources(resources: &[&ResourceDescriptor]) -> Self {
        resources
            .iter()
            .filter(|r| r.deletion == DeletionPolicy::Soft)
            .fold(Self::new(), |policy, r| policy.soft_delete(r.table))
    }

    pub fn soft_delete(mut self, table: impl Into<String>) -> Self {
        self.soft_delete_tables.insert(table.into());
        self
    }

    /// Whether soft-deleted rows of `table` must be filtered out for `caller`
    pub fn hides_deleted(&self, table: &str, caller: &Caller) -> bool {
        !caller.is_privileged() && self.soft_delete_tables.contains(table)
    }

    pub fn is_visible(&self, table: &str, caller: &Caller, row: &Row) -> bool {
        if !self.hides_deleted(table, caller) {
            return true;
        }
        row.get("deleted_at").map_or(true, Value::is_null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::catalog;
    use serde_json::json;

    #[test]
    fn built_from_soft_delete_resources() {
        let policy = RowPolicy::from_resources(catalog::ALL);
        let visitor = Caller::anonymous();
        assert!(policy.hides_deleted("clients", &visitor));
        assert!(policy.hides_deleted("partners", &visitor));
        assert!(policy.hides_deleted("loans", &visitor));
        assert!(!policy.hides_deleted("transactions", &visitor));
        assert!(!policy.hides_deleted("follow_ups", &visitor));
        assert!(!policy.hides_deleted("clients", &Caller::admin()));
    }

    #[test]
    fn deleted_rows_invisible_to_visitors() {
        let policy = RowPolicy::new().soft_delete("clients");
        let deleted = json!({"deleted_at": "2024-05-01T10:00:00Z"}).as_object().cloned().unwrap();
        let active = json!({"deleted_at": null}).as_object().cloned().unwrap();
        assert!(!policy.is_visible("clients", &Caller::anonymous(), &deleted));
        assert!(policy.is_visible("clients", &Caller::anonymous(), &active));
        assert!(policy.is_visible("clients", &Caller::admin(), &deleted));
    }
}
