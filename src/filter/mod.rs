pub mod types;
pub mod filter;
pub mod filter_where;
pub mod postgrest;
pub mod error;

pub use types::*;
pub use filter::{validate_identifier, Filter};
pub use error::FilterError;
