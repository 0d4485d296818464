pub mod error;
pub mod logger;

pub use error::ApiError;
pub use logger::init_logger;
