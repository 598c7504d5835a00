pub mod account_service;
pub mod auth_service;
pub mod oauth_service;
pub mod session_service;
pub mod user_service;
