pub mod document;
pub mod error;

pub use document::null_as_default;
pub use error::AppError;
