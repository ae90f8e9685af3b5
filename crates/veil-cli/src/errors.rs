//! CLI error types for structured error handling.
//!
//! Handlers return `anyhow::Result`; at the boundary the error is turned
//! into a `CliError`, which carries the exit code and an optional hint.

use std::fmt;

use veil_core::VeilError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Secret not found in the store
    NotFound { message: String, hint: String },

    /// Invalid user input or configuration
    InvalidInput(String),

    /// No usable system clipboard
    ClipboardUnavailable { message: String, hint: String },

    /// Store directory missing or unreadable
    StoreAccess { message: String, hint: String },

    /// Anything else
    Failed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint }
            | CliError::ClipboardUnavailable { message, hint }
            | CliError::StoreAccess { message, hint } => write!(f, "{}\n{}", message, hint),
            CliError::InvalidInput(message) | CliError::Failed(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::ClipboardUnavailable { .. } => exit_codes::CLIPBOARD_UNAVAILABLE,
            CliError::StoreAccess { .. } => exit_codes::STORE_ACCESS,
            CliError::Failed(_) => exit_codes::FAILURE,
        }
    }

    /// Recover the most specific error from an `anyhow` chain.
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<CliError>() {
            Ok(cli) => return cli,
            Err(err) => err,
        };
        match err.downcast::<VeilError>() {
            Ok(veil) => CliError::from(veil),
            Err(other) => CliError::Failed(format!("{:#}", other)),
        }
    }
}

impl From<VeilError> for CliError {
    fn from(err: VeilError) -> Self {
        let message = err.to_string();
        match err {
            VeilError::SourceNotFound(_) => CliError::NotFound {
                message,
                hint: "Hint: Run `veil list` to see stored secrets.".to_string(),
            },
            VeilError::InvalidInput(_) => CliError::InvalidInput(message),
            VeilError::ClipboardUnavailable(_) => CliError::ClipboardUnavailable {
                message,
                hint: "Hint: Install wl-clipboard or xclip, or set [clipboard] command in the config."
                    .to_string(),
            },
            VeilError::StoreAccess(_) => CliError::StoreAccess {
                message,
                hint: "Hint: Pass --store or set PASSWORD_STORE_DIR.".to_string(),
            },
            VeilError::HistorySnapshot(_) | VeilError::Crypto(_) | VeilError::Other(_) => {
                CliError::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_kind() {
        let cases = [
            (VeilError::SourceNotFound("x".into()), exit_codes::NOT_FOUND),
            (VeilError::InvalidInput("x".into()), exit_codes::INVALID_INPUT),
            (
                VeilError::ClipboardUnavailable("x".into()),
                exit_codes::CLIPBOARD_UNAVAILABLE,
            ),
            (VeilError::StoreAccess("x".into()), exit_codes::STORE_ACCESS),
            (VeilError::Crypto("x".into()), exit_codes::FAILURE),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_classify_finds_core_error_inside_anyhow() {
        let err = anyhow::Error::from(VeilError::SourceNotFound("web/github".into()));
        let cli = CliError::classify(err);
        assert_eq!(cli.exit_code(), exit_codes::NOT_FOUND);
        assert!(cli.to_string().contains("web/github"));
        assert!(cli.to_string().contains("veil list"));
    }

    #[test]
    fn test_classify_keeps_cli_error() {
        let err = anyhow::Error::from(CliError::invalid_input("bad glyph"));
        assert_eq!(CliError::classify(err).exit_code(), exit_codes::INVALID_INPUT);
    }

    #[test]
    fn test_classify_plain_anyhow_is_failure() {
        let cli = CliError::classify(anyhow::anyhow!("boom"));
        assert_eq!(cli.exit_code(), exit_codes::FAILURE);
    }
}
