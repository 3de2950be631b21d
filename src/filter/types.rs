/// A single predicate of a gateway filter
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`, compared in text form
    Eq { column: String, value: String },

    /// Case-insensitive substring match of `term` against any of `columns`
    AnyContains { columns: Vec<String>, term: String },
}

#[derive(Debug, Clone)]
pub struct FilterWhereOptions {
    /// When false, rows with a non-null `deleted_at` are excluded
    pub include_deleted: bool,
}

impl Default for FilterWhereOptions {
    fn default() -> Self {
        Self {
            include_deleted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<String>,
}
