use thiserror::Error;

use crate::backend::BackendError;
use crate::forms::ValidationErrors;

/// Errors surfaced by the intake services.
#[derive(Error, Debug)]
pub enum CareError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] BackendError),

    #[error("Identity already exists for {0}")]
    DuplicateIdentity(String),

    #[error("{0} not found")]
    NotFound(String),
}
