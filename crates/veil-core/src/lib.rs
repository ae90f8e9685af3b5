//! # Veil Core
//!
//! Core library for Veil - a clipboard and editing helper for a GPG-encrypted
//! password store.
//!
//! The hard part of such a tool is secret lifetime: a decrypted secret must
//! reach the clipboard or an editable view and then disappear from every
//! place it could leak, without trampling the user's unrelated state.
//!
//! ## Architecture
//!
//! - **secret**: `SecretValue` and the shared compare/scrub helpers
//! - **clipboard**: clipboard handoff with timed, value-guarded erasure
//! - **timer**: cancellable one-shot timers for a single-threaded loop
//! - **mask**: masking state machine for the first line of an editable secret
//! - **buffer**: an editable text buffer that hosts the masking session
//! - **store**: the `SecretStore` trait and the GPG directory store
//! - **fs**: atomic file replacement

pub mod buffer;
pub mod clipboard;
pub mod error;
pub mod fs;
pub mod mask;
pub mod secret;
pub mod store;
pub mod timer;

pub use buffer::EditBuffer;
pub use clipboard::{
    ClipboardSession, EraseReport, HistoryStore, KillRing, PlaceReceipt, SecretSource,
    SystemClipboard,
};
pub use error::{Result, VeilError};
pub use mask::{MaskConfig, MaskHost, MaskState, MaskedEditSession};
pub use secret::SecretValue;
pub use store::{DecryptedSecret, GpgStore, SecretStore};
pub use timer::{DeadlineScheduler, Scheduler, TimerId};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
