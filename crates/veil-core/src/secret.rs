//! Secret values and the comparison/erasure helpers shared by the clipboard
//! and masking subsystems.
//!
//! A [`SecretValue`] is never logged, serialized or written to disk by this
//! crate. Its memory is zeroized when it is dropped or cleared.

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// One decrypted secret (the first line of a secret file).
pub struct SecretValue {
    inner: SecretString,
}

impl SecretValue {
    /// Wrap an owned string. The caller's buffer is moved, not copied.
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Extract exactly the first line of decrypted content.
    ///
    /// The line terminator (`\n` or `\r\n`) is not part of the secret. Content
    /// without a newline is taken whole.
    ///
    /// # Examples
    ///
    /// ```
    /// use veil_core::SecretValue;
    ///
    /// let secret = SecretValue::from_first_line("hunter2\nuser: alice\n");
    /// assert!(secret.matches("hunter2"));
    /// ```
    pub fn from_first_line(content: &str) -> Self {
        Self::new(first_line(content).to_string())
    }

    /// Borrow the plaintext.
    ///
    /// # Security
    ///
    /// Use only for immediate hand-off to the clipboard or a buffer.
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Constant-time equality against arbitrary text.
    pub fn matches(&self, other: &str) -> bool {
        let ours = self.expose().as_bytes();
        let theirs = other.as_bytes();
        ours.len() == theirs.len() && bool::from(ours.ct_eq(theirs))
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    /// Overwrite the value with the empty string, zeroizing the old memory.
    pub fn clear(&mut self) {
        self.inner = SecretString::from(String::new());
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.expose())
    }
}

impl Eq for SecretValue {}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValue")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Return the first line of `content`, without its terminator.
pub fn first_line(content: &str) -> &str {
    let line = content.split('\n').next().unwrap_or("");
    line.strip_suffix('\r').unwrap_or(line)
}

/// Remove every entry equal to `secret`, keeping the order of the rest.
///
/// Removed entries are zeroized before they are dropped. Returns the
/// surviving entries and the number removed.
pub fn scrub_entries(entries: Vec<String>, secret: &SecretValue) -> (Vec<String>, usize) {
    let mut kept = Vec::with_capacity(entries.len());
    let mut removed = 0;
    for mut entry in entries {
        if secret.matches(&entry) {
            entry.zeroize();
            removed += 1;
        } else {
            kept.push(entry);
        }
    }
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_strips_terminators() {
        assert_eq!(first_line("hunter2\nuser: alice"), "hunter2");
        assert_eq!(first_line("hunter2\r\nuser: alice"), "hunter2");
        assert_eq!(first_line("only-line"), "only-line");
        assert_eq!(first_line(""), "");
        assert_eq!(first_line("\nmetadata"), "");
    }

    #[test]
    fn test_matches_is_exact() {
        let secret = SecretValue::new("s3cret".to_string());
        assert!(secret.matches("s3cret"));
        assert!(!secret.matches("s3cret "));
        assert!(!secret.matches("s3cre"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_clear_empties_value() {
        let mut secret = SecretValue::new("s3cret".to_string());
        secret.clear();
        assert!(secret.is_empty());
        assert!(!secret.matches("s3cret"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretValue::new("s3cret".to_string());
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_scrub_entries_preserves_order() {
        let secret = SecretValue::new("pw".to_string());
        let entries = vec![
            "a".to_string(),
            "pw".to_string(),
            "b".to_string(),
            "pw".to_string(),
            "pw!".to_string(),
        ];
        let (kept, removed) = scrub_entries(entries, &secret);
        assert_eq!(removed, 2);
        assert_eq!(kept, vec!["a", "b", "pw!"]);
    }
}
