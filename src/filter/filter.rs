use serde_json::Value;
use uuid::Uuid;

use super::error::FilterError;
use super::types::Condition;
use crate::types::Row;

/// Backend-neutral description of which rows (and which columns) a gateway
/// operation targets. Gateways render it to SQL, PostgREST query parameters
/// or evaluate it directly against in-memory rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    select_columns: Vec<String>,
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching the row with the given primary key
    pub fn by_id(id: Uuid) -> Self {
        Self {
            select_columns: vec![],
            conditions: vec![Condition::Eq {
                column: "id".to_string(),
                value: id.to_string(),
            }],
        }
    }

    pub fn select<I, S>(mut self, columns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for column in &columns {
            if column != "*" {
                validate_identifier(column).map_err(FilterError::InvalidColumn)?;
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    /// OR-combined, case-insensitive substring search. An empty term or an
    /// empty column list leaves the filter unchanged.
    pub fn search(mut self, columns: &[&str], term: &str) -> Result<Self, FilterError> {
        if term.is_empty() || columns.is_empty() {
            return Ok(self);
        }
        for column in columns {
            validate_identifier(column).map_err(FilterError::InvalidColumn)?;
        }
        self.conditions.push(Condition::AnyContains {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            term: term.to_string(),
        });
        Ok(self)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Selected columns; empty means every column
    pub fn columns(&self) -> &[String] {
        &self.select_columns
    }

    pub fn selects_all(&self) -> bool {
        self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*")
    }

    /// Evaluate the filter against an in-memory row
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq { column, value } => {
                row.get(column).and_then(value_text).map_or(false, |text| &text == value)
            }
            Condition::AnyContains { columns, term } => {
                let needle = term.to_lowercase();
                columns.iter().any(|column| {
                    row.get(column)
                        .and_then(value_text)
                        .map_or(false, |text| text.to_lowercase().contains(&needle))
                })
            }
        })
    }

    /// Restrict a row to the selected columns
    pub fn project(&self, row: &Row) -> Row {
        if self.selects_all() {
            return row.clone();
        }
        self.select_columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }
}

/// Text form of a scalar JSON value, as a database would compare it after a
/// cast to text. Null, arrays and objects have none.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Escape LIKE wildcards (and the escape character) so a search term only
/// ever matches literally
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Identifiers are interpolated into SQL and PostgREST paths, so only
/// `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err("identifier cannot be empty".to_string()),
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
            Err(format!("invalid identifier format: {}", name))
        }
        Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Err(format!("invalid identifier format: {}", name))
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(validate_identifier("last_name").is_ok());
        assert!(validate_identifier("_hidden").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1col").is_err());
        assert!(validate_identifier("name; DROP TABLE clients").is_err());
        assert!(Filter::new().search(&["bad-name"], "x").is_err());
        assert!(Filter::new().select(["id; --"]).is_err());
    }

    #[test]
    fn search_matches_any_column_case_insensitively() {
        let filter = Filter::new()
            .search(&["last_name", "first_name", "dni"], "345")
            .unwrap();
        assert!(filter.matches(&row(json!({"last_name": "Diaz", "dni": "12345678"}))));
        assert!(!filter.matches(&row(json!({"last_name": "Diaz", "dni": "999"}))));

        let filter = Filter::new().search(&["last_name"], "DÍAZ").unwrap();
        assert!(filter.matches(&row(json!({"last_name": "díaz"}))));
    }

    #[test]
    fn empty_search_term_is_ignored() {
        let filter = Filter::new().search(&["last_name"], "").unwrap();
        assert!(filter.conditions().is_empty());
    }

    #[test]
    fn eq_compares_text_forms() {
        let id = Uuid::new_v4();
        let filter = Filter::by_id(id);
        assert!(filter.matches(&row(json!({"id": id.to_string()}))));
        assert!(!filter.matches(&row(json!({"id": Uuid::new_v4().to_string()}))));
        assert!(!filter.matches(&row(json!({"name": "x"}))));
    }

    #[test]
    fn escape_like_neutralises_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("Diaz"), "Diaz");
    }

    #[test]
    fn projects_selected_columns() {
        let filter = Filter::new().select(["id"]).unwrap();
        let projected = filter.project(&row(json!({"id": "a", "name": "b"})));
        assert_eq!(Value::Object(projected), json!({"id": "a"}));
    }
}
