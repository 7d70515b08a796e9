pub mod context;
pub mod error;
pub mod outcome;

pub use context::{CompletionOptions, LlmContext, OutputFormat};
pub use error::{ErrorKind, JsonProcessError, Result};
pub use outcome::{
    ParseOutcome, Processed, SanitizeOutcome, Validated, ValidationFailure, ValidationOutcome,
};
