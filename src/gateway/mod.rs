//! Data gateway: the narrow table-level contract the resource controllers
//! depend on, plus the backends that implement it.

pub mod memory;
pub mod policy;
pub mod postgres;
pub mod postgrest;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{GatewayBackend, GatewayConfig};
use crate::filter::{Filter, FilterError};
use crate::resources::ResourceDescriptor;
use crate::types::{Caller, Row};

pub use memory::MemoryGateway;
pub use policy::RowPolicy;
pub use postgres::PostgresGateway;
pub use postgrest::PostgrestGateway;

/// Errors raised by any gateway backend
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Query error: {0}")]
    Query(#[from] FilterError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend rejected request ({status}): {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected backend response: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Table-level operations against the persistence backend.
///
/// Every call returns the affected rows. Row visibility for non-privileged
/// callers is the backend's business: implementations either forward the
/// caller's credentials (managed backend) or apply a [`RowPolicy`].
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    async fn select(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError>;

    async fn insert(&self, caller: &Caller, table: &str, record: Row) -> Result<Vec<Row>, GatewayError>;

    async fn update(
        &self,
        caller: &Caller,
        table: &str,
        filter: &Filter,
        partial: Row,
    ) -> Result<Vec<Row>, GatewayError>;

    async fn delete(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError>;

    /// Cheap connectivity probe
    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Shared handle constructed once at startup and cloned into every controller
pub type SharedGateway = Arc<dyn DataGateway>;

/// Build the configured gateway backend
pub async fn connect(
    config: &GatewayConfig,
    resources: &[&'static ResourceDescriptor],
) -> Result<SharedGateway, GatewayError> {
    let gateway: SharedGateway = match config.backend {
        GatewayBackend::Postgrest => Arc::new(PostgrestGateway::new(config)?),
        GatewayBackend::Postgres => {
            Arc::new(PostgresGateway::connect(config, RowPolicy::from_resources(resources)).await?)
        }
        GatewayBackend::Memory => Arc::new(MemoryGateway::for_resources(resources)),
    };
    tracing::info!("Data gateway ready: {}", gateway.name());
    Ok(gateway)
}
