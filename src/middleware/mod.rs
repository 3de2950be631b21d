pub mod auth;
pub mod response;

pub use auth::resolve_caller;
pub use response::{ApiResponse, ApiResult};
