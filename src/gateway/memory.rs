use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DataGateway, GatewayError, RowPolicy};
use crate::filter::{validate_identifier, Filter, FilterError};
use crate::resources::ResourceDescriptor;
use crate::types::{Caller, Row};

#[derive(Debug, Clone)]
struct CodeSequence {
    column: String,
    prefix: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Row>>,
    counters: HashMap<String, u64>,
}

/// In-process backend emulating what the managed database does on its side:
/// id and timestamp assignment, generated codes, a monotonically advancing
/// `updated_at`, and the soft-delete visibility policy.
pub struct MemoryGateway {
    state: RwLock<MemoryState>,
    sequences: HashMap<String, CodeSequence>,
    policy: RowPolicy,
    report_deleted_rows: bool,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new(RowPolicy::default())
    }
}

impl MemoryGateway {
    pub fn new(policy: RowPolicy) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            sequences: HashMap::new(),
            policy,
            report_deleted_rows: true,
        }
    }

    /// Gateway preconfigured with the policy and code sequences of `resources`
    pub fn for_resources(resources: &[&ResourceDescriptor]) -> Self {
        resources.iter().fold(
            Self::new(RowPolicy::from_resources(resources)),
            |gateway, r| match r.generated_code {
                Some(code) => gateway.with_code_sequence(r.table, code.column, code.prefix),
                None => gateway,
            },
        )
    }

    /// Generate `<prefix><000001>` codes into `column` on every insert
    pub fn with_code_sequence(mut self, table: &str, column: &str, prefix: &str) -> Self {
        self.sequences.insert(
            table.to_string(),
            CodeSequence {
                column: column.to_string(),
                prefix: prefix.to_string(),
            },
        );
        self
    }

    /// Mimic backends that answer a successful DELETE with an empty body
    pub fn without_delete_representation(mut self) -> Self {
        self.report_deleted_rows = false;
        self
    }

    /// Every stored row of `table`, ignoring visibility
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let state = self.state.read().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }
}

fn check_table(table: &str) -> Result<(), GatewayError> {
    validate_identifier(table).map_err(|e| GatewayError::Query(FilterError::InvalidTableName(e)))
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Current time, nudged forward when the clock has not moved past `previous`
fn next_timestamp(previous: Option<&Value>) -> Value {
    let now = Utc::now();
    let previous = previous
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    match previous {
        Some(prev) if now <= prev => timestamp(prev + Duration::microseconds(1)),
        _ => timestamp(now),
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError> {
        check_table(table)?;
        let state = self.state.read().await;
        let rows = state
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| self.policy.is_visible(table, caller, row) && filter.matches(row))
                    .map(|row| filter.project(row))
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, _caller: &Caller, table: &str, mut record: Row) -> Result<Vec<Row>, GatewayError> {
        check_table(table)?;
        let mut state = self.state.write().await;

        let now = timestamp(Utc::now());
        if !matches!(record.get("id"), Some(Value::String(_))) {
            record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        record.insert("created_at".to_string(), now.clone());
        record.insert("updated_at".to_string(), now);

        if let Some(sequence) = self.sequences.get(table) {
            let counter = state.counters.entry(table.to_string()).or_insert(0);
            *counter += 1;
            record.insert(
                sequence.column.clone(),
                Value::String(format!("{}{:06}", sequence.prefix, counter)),
            );
        }

        state.tables.entry(table.to_string()).or_default().push(record.clone());
        Ok(vec![record])
    }

    async fn update(
        &self,
        caller: &Caller,
        table: &str,
        filter: &Filter,
        partial: Row,
    ) -> Result<Vec<Row>, GatewayError> {
        check_table(table)?;
        let mut state = self.state.write().await;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(vec![]);
        };

        let mut updated = vec![];
        for row in rows.iter_mut() {
            if !self.policy.is_visible(table, caller, row) || !filter.matches(row) {
                continue;
            }
            for (key, value) in &partial {
                if key != "id" {
                    row.insert(key.clone(), value.clone());
                }
            }
            let touched = next_timestamp(row.get("updated_at"));
            row.insert("updated_at".to_string(), touched);
            updated.push(filter.project(row));
        }
        Ok(updated)
    }

    async fn delete(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError> {
        check_table(table)?;
        let mut state = self.state.write().await;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(vec![]);
        };

        let (removed, kept): (Vec<Row>, Vec<Row>) = rows
            .drain(..)
            .partition(|row| self.policy.is_visible(table, caller, row) && filter.matches(row));
        *rows = kept;

        if self.report_deleted_rows {
            Ok(removed)
        } else {
            Ok(vec![])
        }
    }
}
