use crate::recipe::StepId;
use crate::session::SessionId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    #[error("invalid position {position} (current step index is {current_step_index})")]
    InvalidPosition {
        position: u32,
        current_step_index: u32,
    },

    #[error("step is not pending: {0}")]
    StepNotPending(StepId),

    #[error("no binding for placeholder '{placeholder_key}' on step {step_id}")]
    BindingNotFound {
        step_id: StepId,
        placeholder_key: String,
    },

    #[error("duplicate placeholder key '{0}' on inserted step")]
    DuplicatePlaceholderKey(String),

    #[error("operation {op_index} failed validation: {source}")]
    ValidationFailed {
        op_index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("session is locked: {0}")]
    SessionLocked(SessionId),

    #[error("recipe has no steps")]
    EmptyRecipe,

    #[error("pax multiplier must be positive and finite, got {0}")]
    InvalidPaxMultiplier(f64),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session is not active: {0}")]
    SessionNotActive(SessionId),

    #[error("batch has no operations")]
    EmptyBatch,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an error as the validation failure of the operation at `op_index`.
    pub fn validation(op_index: usize, source: Error) -> Self {
        Error::ValidationFailed {
            op_index,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
