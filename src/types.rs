/// Shared types used across the codebase

use serde_json::{Map, Value};
use uuid::Uuid;

/// A backend row as returned by the data gateway
pub type Row = Map<String, Value>;

/// Identity of whoever is issuing the current request.
///
/// Resolved once per request by the access policy and handed to the data
/// gateway, which uses it to decide row visibility and (for the managed
/// backend) which bearer token to forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub is_admin: bool,
    pub user_id: Option<Uuid>,
    pub access_token: Option<String>,
}

impl Caller {
    /// Caller holding admin rights, acting with the gateway's own credential
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            ..Default::default()
        }
    }

    /// Unauthenticated caller without elevated privileges
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Internal reads that must see every row regardless of who asked
    /// (single-row reads, delete existence checks).
    pub fn service() -> Self {
        Self::admin()
    }

    /// Whether row-visibility policies should be bypassed for this caller
    pub fn is_privileged(&self) -> bool {
        self.is_admin
    }
}
