use super::schema::{FieldKind, FieldSpec};
use super::{DeletionPolicy, GeneratedCode, ResourceDescriptor};

pub const PROFILES: ResourceDescriptor = ResourceDescriptor {
    name: "users",
    table: "profiles",
    label: "Profile",
    fields: &[
        FieldSpec::update_only("username", FieldKind::Text),
        FieldSpec::update_only("full_name", FieldKind::Text),
        FieldSpec::update_only("avatar_url", FieldKind::Text),
        FieldSpec::update_only("website", FieldKind::Text),
        FieldSpec::update_only("is_admin", FieldKind::Bool).admin_only(),
    ],
    search_fields: &["username", "full_name"],
    deletion: DeletionPolicy::None,
    creatable: false,
    admin_gated: false,
    generated_code: None,
};

pub const CLIENTS: ResourceDescriptor = ResourceDescriptor {
    name: "clients",
    table: "clients",
    label: "Client",
    fields: &[
        FieldSpec::required("last_name", FieldKind::Text),
        FieldSpec::required("first_name", FieldKind::Text),
        FieldSpec::optional("dni", FieldKind::Text),
        FieldSpec::optional("address", FieldKind::Text),
        FieldSpec::optional("phone", FieldKind::Text),
        FieldSpec::optional("email", FieldKind::Text),
        FieldSpec::optional("referred_by", FieldKind::Text),
        FieldSpec::optional("status", FieldKind::Text),
        FieldSpec::optional("observations", FieldKind::Text),
        FieldSpec::optional("dni_photo_url", FieldKind::Text),
        FieldSpec::update_only("deleted_at", FieldKind::Timestamp).non_null(),
    ],
    search_fields: &["last_name", "first_name", "dni"],
    deletion: DeletionPolicy::Soft,
    creatable: true,
    admin_gated: true,
    generated_code: Some(GeneratedCode {
        column: "client_code",
        prefix: "CLI-",
    }),
};

pub const PARTNERS: ResourceDescriptor = ResourceDescriptor {
    name: "partners",
    table: "partners",
    label: "Partner",
    fields: &[
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("capital", FieldKind::Number).positive(),
        FieldSpec::update_only("withdrawals", FieldKind::Number).non_negative(),
        FieldSpec::update_only("generated_interest", FieldKind::Number).non_negative(),
        FieldSpec::update_only("deleted_at", FieldKind::Timestamp).non_null(),
    ],
    search_fields: &[],
    deletion: DeletionPolicy::Soft,
    creatable: true,
    admin_gated: true,
    generated_code: None,
};

pub const LOANS: ResourceDescriptor = ResourceDescriptor {
    name: "loans",
    table: "loans",
    label: "Loan",
    fields: &[
        FieldSpec::required("client_id", FieldKind::Uuid),
        FieldSpec::required("amount", FieldKind::Number).positive(),
        FieldSpec::required("installments", FieldKind::Integer).positive(),
        FieldSpec::optional("loan_type", FieldKind::Text),
        FieldSpec::optional("interest_rate", FieldKind::Number).non_negative(),
        FieldSpec::optional("start_date", FieldKind::Date),
        FieldSpec::optional("end_date", FieldKind::Date),
        FieldSpec::optional("status", FieldKind::Text),
        FieldSpec::update_only("deleted_at", FieldKind::Timestamp).non_null(),
    ],
    search_fields: &["loan_code", "client_id"],
    deletion: DeletionPolicy::Soft,
    creatable: true,
    admin_gated: true,
    generated_code: Some(GeneratedCode {
        column: "loan_code",
        prefix: "PRE-",
    }),
};

pub const TRANSACTIONS: ResourceDescriptor = ResourceDescriptor {
    name: "transactions",
    table: "transactions",
    label: "Transaction",
    fields: &[
        FieldSpec::required("type", FieldKind::OneOf(&["income", "expense"])),
        FieldSpec::required("amount", FieldKind::Number).positive(),
        FieldSpec::optional("description", FieldKind::Text),
        FieldSpec::optional("partner_id", FieldKind::Uuid),
    ],
    search_fields: &[],
    deletion: DeletionPolicy::Hard,
    creatable: true,
    admin_gated: true,
    generated_code: None,
};

pub const FOLLOW_UPS: ResourceDescriptor = ResourceDescriptor {
    name: "followups",
    table: "follow_ups",
    label: "Follow-up",
    fields: &[
        FieldSpec::required("client_id", FieldKind::Uuid),
        FieldSpec::required("date", FieldKind::Date),
        FieldSpec::optional("notes", FieldKind::Text),
        FieldSpec::optional("reminder_date", FieldKind::Date),
    ],
    search_fields: &[],
    deletion: DeletionPolicy::Hard,
    creatable: true,
    admin_gated: true,
    generated_code: None,
};

/// Every resource mounted under `/api/backend`
pub const ALL: &[&ResourceDescriptor] = &[&PROFILES, &CLIENTS, &PARTNERS, &LOANS, &TRANSACTIONS, &FOLLOW_UPS];
