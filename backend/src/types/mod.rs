mod environment;
mod error;
mod extractors;

pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError, ErrorBody};
pub use extractors::FilterJson;
