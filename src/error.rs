use thiserror::Error;

/// Failures raised by the cleaning and reporting stages.
///
/// Filesystem-facing code wraps these in `anyhow::Error`; callers that need to
/// tell an invalid top-N argument from a bad row can `downcast_ref` back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("row {row_id}: cannot coerce {field} value {value:?} to an integer")]
    Coercion {
        row_id: u64,
        field: &'static str,
        value: String,
    },

    #[error("row {row_id}: required field {field} is null after cleaning")]
    MissingField { row_id: u64, field: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown view: {0}")]
    UnknownView(String),

    #[error("cleaned table violates uniqueness: duplicate record at position {0}")]
    DuplicateRecord(usize),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Row id of the raw record this error was raised for, if any.
    pub fn row_id(&self) -> Option<u64> {
        match self {
            PipelineError::Coercion { row_id, .. } | PipelineError::MissingField { row_id, .. } => {
                Some(*row_id)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
