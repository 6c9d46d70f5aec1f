use thiserror::Error;

/// Errors raised while decoding or replaying an edit script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid edit script: {reason}")]
    Validation { reason: String },

    #[error(
        "patch does not match document at op {index} (offset {offset}): expected {expected:?}, found {found:?}"
    )]
    Mismatch {
        index: usize,
        offset: usize,
        expected: String,
        found: String,
    },

    #[error(
        "incomplete edit script: covers {consumed} of {total} characters, the remaining tail is unaccounted for"
    )]
    Incomplete { consumed: usize, total: usize },
}
