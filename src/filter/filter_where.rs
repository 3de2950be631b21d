use super::filter::{escape_like, Filter};
use super::types::{Condition, FilterWhereOptions, SqlResult};

/// Renders a [`Filter`] into a parameterised SQL `WHERE` body.
///
/// Columns are compared after a cast to text and every parameter is bound as
/// text, so the same filter works for uuid, numeric and date columns alike.
pub struct FilterWhere {
    param_values: Vec<String>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(filter: &Filter, starting_param_index: usize, options: &FilterWhereOptions) -> SqlResult {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(filter, options)
    }

    fn build(&mut self, filter: &Filter, options: &FilterWhereOptions) -> SqlResult {
        let mut sql_conditions = vec![];
        if !options.include_deleted {
            sql_conditions.push("\"deleted_at\" IS NULL".to_string());
        }
        for condition in filter.conditions() {
            sql_conditions.push(self.build_sql_condition(condition));
        }

        let query = if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        SqlResult {
            query,
            params: std::mem::take(&mut self.param_values),
        }
    }

    fn build_sql_condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq { column, value } => format!("\"{}\"::text = {}", column, self.param(value.clone())),
            Condition::AnyContains { columns, term } => {
                let pattern = format!("%{}%", escape_like(term));
                let parts: Vec<String> = columns
                    .iter()
                    .map(|column| format!("\"{}\"::text ILIKE {}", column, self.param(pattern.clone())))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }

    fn param(&mut self, value: String) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
