pub mod error;
pub mod validated_json;

pub use error::{validation_field_errors, ApiError, ErrorResponse, FieldError};
pub use validated_json::{JsonBody, ValidatedJson};
