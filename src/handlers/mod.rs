pub mod admin_auth;
pub mod student_auth;
pub mod student_papers;
