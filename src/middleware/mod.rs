pub mod auth;
pub mod response;

pub use auth::{admin_auth_middleware, student_auth_middleware, CurrentAdmin, CurrentStudent};
pub use response::{ApiResponse, ApiResult};
