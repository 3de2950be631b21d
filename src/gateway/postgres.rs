use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row as _};
use tracing::info;

use super::{DataGateway, GatewayError, RowPolicy};
use crate::config::GatewayConfig;
use crate::filter::filter_where::FilterWhere;
use crate::filter::{validate_identifier, Filter, FilterError, FilterWhereOptions, SqlResult};
use crate::types::{Caller, Row};

/// Direct Postgres backend for self-hosted deployments.
///
/// Rows come back through `row_to_json` and writes go through
/// `json_populate_record`, so column types are taken from the table itself
/// and the gateway stays schema-agnostic. Every write also touches
/// `updated_at`.
pub struct PostgresGateway {
    pool: PgPool,
    policy: RowPolicy,
}

impl PostgresGateway {
    pub async fn connect(config: &GatewayConfig, policy: RowPolicy) -> Result<Self, GatewayError> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.request_timeout_secs))
            .connect(database_url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self::from_pool(pool, policy))
    }

    pub fn from_pool(pool: PgPool, policy: RowPolicy) -> Self {
        Self { pool, policy }
    }

    fn where_sql(&self, caller: &Caller, table: &str, filter: &Filter, starting_param_index: usize) -> SqlResult {
        let options = FilterWhereOptions {
            include_deleted: !self.policy.hides_deleted(table, caller),
        };
        FilterWhere::generate(filter, starting_param_index, &options)
    }

    async fn fetch_rows(&self, sql: &str, record: Option<Value>, params: Vec<String>) -> Result<Vec<Row>, GatewayError> {
        let mut query = sqlx::query(sql);
        if let Some(record) = record {
            query = query.bind(record);
        }
        for param in params {
            query = query.bind(param);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(map),
                other => Err(GatewayError::Decode(format!("expected JSON object row, got {}", other))),
            })
            .collect()
    }
}

fn quote_table(table: &str) -> Result<String, GatewayError> {
    validate_identifier(table).map_err(|e| GatewayError::Query(FilterError::InvalidTableName(e)))?;
    Ok(format!("\"{}\"", table))
}

fn quoted_columns(record: &Row) -> Result<Vec<String>, GatewayError> {
    record
        .keys()
        .map(|key| {
            validate_identifier(key).map_err(|e| GatewayError::Query(FilterError::InvalidColumn(e)))?;
            Ok(format!("\"{}\"", key))
        })
        .collect()
}

fn select_list(filter: &Filter) -> String {
    if filter.selects_all() {
        "*".to_string()
    } else {
        filter
            .columns()
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl DataGateway for PostgresGateway {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn select(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError> {
        let table_sql = quote_table(table)?;
        let where_sql = self.where_sql(caller, table, filter, 0);
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT {} FROM {} WHERE {}) t",
            select_list(filter),
            table_sql,
            where_sql.query
        );
        self.fetch_rows(&sql, None, where_sql.params).await
    }

    async fn insert(&self, _caller: &Caller, table: &str, record: Row) -> Result<Vec<Row>, GatewayError> {
        let table_sql = quote_table(table)?;
        let columns = quoted_columns(&record)?;

        if columns.is_empty() {
            let sql = format!(
                "WITH r AS (INSERT INTO {} DEFAULT VALUES RETURNING *) SELECT row_to_json(r) AS row FROM r",
                table_sql
            );
            return self.fetch_rows(&sql, None, vec![]).await;
        }

        let column_list = columns.join(", ");
        let sql = format!(
            "WITH r AS (INSERT INTO {table} ({cols}) SELECT {cols} FROM json_populate_record(NULL::{table}, $1::json) RETURNING *) \
             SELECT row_to_json(r) AS row FROM r",
            table = table_sql,
            cols = column_list
        );
        self.fetch_rows(&sql, Some(Value::Object(record)), vec![]).await
    }

    async fn update(
        &self,
        caller: &Caller,
        table: &str,
        filter: &Filter,
        mut partial: Row,
    ) -> Result<Vec<Row>, GatewayError> {
        let table_sql = quote_table(table)?;
        partial.remove("updated_at");
        let columns = quoted_columns(&partial)?;

        let mut assignments: Vec<String> = columns
            .iter()
            .map(|col| {
                format!(
                    "{col} = (SELECT {col} FROM json_populate_record(NULL::{table}, $1::json))",
                    col = col,
                    table = table_sql
                )
            })
            .collect();
        assignments.push("\"updated_at\" = now()".to_string());

        let where_sql = self.where_sql(caller, table, filter, 1);
        let sql = format!(
            "WITH r AS (UPDATE {} SET {} WHERE {} RETURNING *) SELECT row_to_json(r) AS row FROM r",
            table_sql,
            assignments.join(", "),
            where_sql.query
        );
        self.fetch_rows(&sql, Some(Value::Object(partial)), where_sql.params).await
    }

    async fn delete(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError> {
        let table_sql = quote_table(table)?;
        let where_sql = self.where_sql(caller, table, filter, 0);
        let sql = format!(
            "WITH r AS (DELETE FROM {} WHERE {} RETURNING *) SELECT row_to_json(r) AS row FROM r",
            table_sql, where_sql.query
        );
        self.fetch_rows(&sql, None, where_sql.params).await
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quotes_valid_table_names_only() {
        assert_eq!(quote_table("follow_ups").unwrap(), "\"follow_ups\"");
        assert!(quote_table("follow_ups\"; --").is_err());
    }

    #[test]
    fn record_columns_are_validated() {
        let record = json!({"first_name": "Ana", "last_name": "Diaz"}).as_object().cloned().unwrap();
        let mut columns = quoted_columns(&record).unwrap();
        columns.sort();
        assert_eq!(columns, vec!["\"first_name\"", "\"last_name\""]);

        let record = json!({"bad column": 1}).as_object().cloned().unwrap();
        assert!(quoted_columns(&record).is_err());
    }

    #[test]
    fn select_list_defaults_to_star() {
        assert_eq!(select_list(&Filter::new()), "*");
        let filter = Filter::new().select(["id", "deleted_at"]).unwrap();
        assert_eq!(select_list(&filter), "\"id\", \"deleted_at\"");
    }
}
