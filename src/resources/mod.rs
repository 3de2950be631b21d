//! Resource descriptors and the generic controller they drive.
//!
//! Each back-office entity is described once, statically, by a
//! [`ResourceDescriptor`]: its table, writable fields, search columns and
//! lifecycle rules. [`ResourceController`] turns any descriptor into the
//! same list / get / create / update / delete contract.

pub mod catalog;
pub mod controller;
pub mod schema;

pub use controller::{ResourceController, ResourceError};
pub use schema::{FieldKind, FieldSpec, Mode, ValidationErrors};

/// How a resource leaves the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// `deleted_at` is stamped; the row is kept
    Soft,
    /// The row is physically removed
    Hard,
    /// No delete operation
    None,
}

/// Unique code assigned by the backend on insert (`CLI-000001`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedCode {
    pub column: &'static str,
    pub prefix: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    /// Route segment under `/api/backend`
    pub name: &'static str,
    pub table: &'static str,
    /// Human-readable singular, used in messages
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
    /// Text columns matched by the `search` query parameter
    pub search_fields: &'static [&'static str],
    pub deletion: DeletionPolicy,
    pub creatable: bool,
    /// Create, update and delete require admin rights
    pub admin_gated: bool,
    pub generated_code: Option<GeneratedCode>,
}

impl ResourceDescriptor {
    pub fn supports_soft_delete(&self) -> bool {
        self.deletion == DeletionPolicy::Soft
    }

    pub fn supports_delete(&self) -> bool {
        self.deletion != DeletionPolicy::None
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields only admins may set
    pub fn admin_only_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.admin_only)
    }
}
