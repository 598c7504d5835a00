pub mod errors;
pub mod middleware;
pub mod token;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use token::TokenService;
pub use types::*;
