use super::filter::{escape_like, Filter};
use super::types::Condition;

/// Render a [`Filter`] as PostgREST query parameters
/// (`select=…`, `col=eq.…`, `or=(a.ilike."*x*",b.ilike."*x*")`).
pub fn to_query_pairs(filter: &Filter) -> Vec<(String, String)> {
    let select = if filter.selects_all() {
        "*".to_string()
    } else {
        filter.columns().join(",")
    };
    let mut pairs = vec![("select".to_string(), select)];

    for condition in filter.conditions() {
        pairs.push(match condition {
            Condition::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
            Condition::AnyContains { columns, term } => {
                // PostgREST turns every `*` into `%`, so a literal asterisk
                // can only be approximated by a single-character wildcard
                let literal = escape_like(term).replace('*', "_");
                let pattern = quote(&format!("*{}*", literal));
                let parts: Vec<String> = columns
                    .iter()
                    .map(|column| format!("{}.ilike.{}", column, pattern))
                    .collect();
                ("or".to_string(), format!("({})", parts.join(",")))
            }
        });
    }

    pairs
}

/// Double-quote a value inside a PostgREST logic tree so commas and
/// parentheses in user input stay literal.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
