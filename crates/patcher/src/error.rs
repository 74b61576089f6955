//! Patcher error types.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for a magic-ID type contract violation.
pub const EXIT_CONTRACT_VIOLATION: i32 = 3;

/// Exit status for every other failure (I/O, configuration).
pub const EXIT_FAILURE: i32 = 1;

/// Errors that abort a patch invocation.
///
/// A missing input file is not represented here: it is reported as
/// [`PatchStatus::Missing`](crate::PatchStatus::Missing). Lines that only
/// resemble a recognized pattern are passed through and never become errors.
#[derive(Debug, Error)]
pub enum PatchError {
    /// A magic identity declaration whose argument and return types differ.
    ///
    /// Raised before anything is written, so the file on disk is untouched.
    #[error(
        "argument and return types of magic ID `{name}` must match (returns `{return_type}`, takes `{argument_type}`)"
    )]
    TypeContractViolation {
        name: String,
        return_type: String,
        argument_type: String,
    },

    /// Reading, writing or replacing the target file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration file or override argument.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status the `irpatch` binary uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PatchError::TypeContractViolation { .. } => EXIT_CONTRACT_VIOLATION,
            PatchError::Io { .. } | PatchError::Config(_) => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_names_symbol() {
        let err = PatchError::TypeContractViolation {
            name: "magic_foo_id".to_string(),
            return_type: "i32".to_string(),
            argument_type: "i64".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("magic_foo_id"), "got: {}", msg);
        assert!(msg.contains("i64"));
        assert_eq!(err.exit_code(), EXIT_CONTRACT_VIOLATION);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let io = PatchError::io(
            "k.nvvm",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.exit_code(), EXIT_FAILURE);
        assert_eq!(PatchError::Config("bad".into()).exit_code(), EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_CONTRACT_VIOLATION);
    }
}
