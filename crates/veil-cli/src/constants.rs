//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Generic failure.
    pub const FAILURE: i32 = 1;

    /// Secret or store entry not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input, arguments or configuration.
    pub const INVALID_INPUT: i32 = 4;

    /// No usable system clipboard.
    pub const CLIPBOARD_UNAVAILABLE: i32 = 5;

    /// The store directory cannot be read.
    pub const STORE_ACCESS: i32 = 6;
}

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "VEIL_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "VEIL_LOG";

/// Log filter used when `VEIL_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Store directory under `$HOME` when nothing else is configured.
pub const DEFAULT_STORE_DIR: &str = ".password-store";
