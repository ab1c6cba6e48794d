pub mod auth;
pub mod response;

pub use auth::{authenticate, enforce, extract_bearer};
pub use response::{ApiResponse, ApiResult};
