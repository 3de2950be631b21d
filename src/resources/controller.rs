use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::schema::{self, Mode, ValidationErrors};
use super::{DeletionPolicy, ResourceDescriptor};
use crate::filter::Filter;
use crate::gateway::{GatewayError, SharedGateway};
use crate::types::{Caller, Row};

/// Failure taxonomy of a resource operation
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The resource does not expose this operation at all
    #[error("{0}")]
    Unsupported(String),

    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: GatewayError,
    },

    /// The backend reported success but returned no row
    #[error("{0}")]
    EmptyResult(String),
}

/// Generic CRUD contract over one table, parameterised by a descriptor
pub struct ResourceController {
    descriptor: &'static ResourceDescriptor,
    gateway: SharedGateway,
}

impl ResourceController {
    pub fn new(descriptor: &'static ResourceDescriptor, gateway: SharedGateway) -> Self {
        Self { descriptor, gateway }
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    fn table(&self) -> &'static str {
        self.descriptor.table
    }

    fn backend(&self, action: &str) -> impl FnOnce(GatewayError) -> ResourceError {
        let context = format!("Failed to {} {}", action, self.descriptor.label.to_lowercase());
        move |source| ResourceError::Backend { context, source }
    }

    fn not_found(&self) -> ResourceError {
        ResourceError::NotFound(format!("{} not found", self.descriptor.label))
    }

    fn require_admin(&self, caller: &Caller, action: &str) -> Result<(), ResourceError> {
        if self.descriptor.admin_gated && !caller.is_admin {
            return Err(ResourceError::Forbidden(format!(
                "Admin rights are required to {} {}",
                action, self.descriptor.name
            )));
        }
        Ok(())
    }

    fn check_admin_only_fields(&self, caller: &Caller, payload: &Value, mode: Mode) -> Result<(), ResourceError> {
        if caller.is_admin {
            return Ok(());
        }
        let recognized = schema::recognized_fields(self.descriptor.fields, payload, mode);
        if let Some(field) = self
            .descriptor
            .admin_only_fields()
            .find(|f| recognized.contains(&f.name))
        {
            return Err(ResourceError::Forbidden(format!(
                "Admin rights are required to change '{}'",
                field.name
            )));
        }
        Ok(())
    }

    /// Every row visible to `caller`, optionally narrowed by a search term.
    ///
    /// Soft-deleted rows are not filtered here; the gateway's row policy
    /// hides them from callers without admin rights.
    pub async fn list(&self, caller: &Caller, search: Option<&str>) -> Result<Vec<Row>, ResourceError> {
        let mut filter = Filter::new();
        if let Some(term) = search {
            filter = filter
                .search(self.descriptor.search_fields, term)
                .map_err(|e| self.backend("list")(e.into()))?;
        }
        debug!("Listing {} (search: {:?})", self.table(), search);

        self.gateway
            .select(caller, self.table(), &filter)
            .await
            .map_err(self.backend("list"))
    }

    /// Single row by id, soft-deleted or not
    pub async fn get_by_id(&self, id: Uuid) -> Result<Row, ResourceError> {
        let rows = self
            .gateway
            .select(&Caller::service(), self.table(), &Filter::by_id(id))
            .await
            .map_err(self.backend("fetch"))?;
        rows.into_iter().next().ok_or_else(|| self.not_found())
    }

    pub async fn create(&self, caller: &Caller, payload: &Value) -> Result<Row, ResourceError> {
        if !self.descriptor.creatable {
            return Err(ResourceError::Unsupported(format!(
                "{} cannot be created through this API",
                self.descriptor.name
            )));
        }
        self.require_admin(caller, "create")?;
        self.check_admin_only_fields(caller, payload, Mode::Create)?;

        let record = schema::validate(self.descriptor.fields, payload, Mode::Create)?;
        let rows = self
            .gateway
            .insert(caller, self.table(), record)
            .await
            .map_err(self.backend("create"))?;

        rows.into_iter().next().ok_or_else(|| {
            ResourceError::EmptyResult(format!(
                "Failed to create {}: no data returned",
                self.descriptor.label.to_lowercase()
            ))
        })
    }

    /// Partial update: only the fields present in `payload` are written
    pub async fn update(&self, caller: &Caller, id: Uuid, payload: &Value) -> Result<Row, ResourceError> {
        self.require_admin(caller, "update")?;
        self.check_admin_only_fields(caller, payload, Mode::Update)?;

        if schema::recognized_fields(self.descriptor.fields, payload, Mode::Update).is_empty() {
            return Err(ResourceError::BadRequest("No data provided for update".to_string()));
        }
        let partial = schema::validate(self.descriptor.fields, payload, Mode::Update)?;

        let rows = self
            .gateway
            .update(caller, self.table(), &Filter::by_id(id), partial)
            .await
            .map_err(self.backend("update"))?;
        rows.into_iter().next().ok_or_else(|| self.not_found())
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), ResourceError> {
        if !self.descriptor.supports_delete() {
            return Err(ResourceError::Unsupported(format!(
                "{} cannot be deleted through this API",
                self.descriptor.name
            )));
        }
        self.require_admin(caller, "delete")?;

        match self.descriptor.deletion {
            DeletionPolicy::Soft => self.soft_delete(caller, id).await,
            _ => self.hard_delete(caller, id).await,
        }
    }

    async fn soft_delete(&self, caller: &Caller, id: Uuid) -> Result<(), ResourceError> {
        let mut partial = Row::new();
        partial.insert(
            "deleted_at".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let rows = self
            .gateway
            .update(caller, self.table(), &Filter::by_id(id), partial)
            .await
            .map_err(self.backend("delete"))?;
        if rows.is_empty() {
            return Err(self.not_found());
        }
        Ok(())
    }

    async fn hard_delete(&self, caller: &Caller, id: Uuid) -> Result<(), ResourceError> {
        let filter = Filter::by_id(id);
        let rows = self
            .gateway
            .delete(caller, self.table(), &filter)
            .await
            .map_err(self.backend("delete"))?;
        if !rows.is_empty() {
            return Ok(());
        }

        // Some backends answer a successful delete with no rows; look the id up to tell
        // "already gone" apart from "deleted just now".
        let lookup = filter.select(["id"]).map_err(|e| self.backend("delete")(e.into()))?;
        let remaining = self
            .gateway
            .select(&Caller::service(), self.table(), &lookup)
            .await
            .map_err(self.backend("delete"))?;
        if remaining.is_empty() {
            return Err(self.not_found());
        }
        Ok(())
    }
}
