//! Secret store abstraction and the GPG-backed directory store.
//!
//! A store is a directory tree of individually encrypted files, one secret
//! per file. Identifiers are paths relative to the store root without the
//! `.gpg` extension (`web/github` for `<root>/web/github.gpg`).

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};
use zeroize::Zeroize;

use crate::clipboard::SecretSource;
use crate::error::{Result, VeilError};
use crate::fs::write_atomic;

/// Extension of encrypted secret files.
pub const SECRET_EXTENSION: &str = "gpg";

/// File listing the encryption recipients for a directory subtree.
pub const RECIPIENTS_FILE: &str = ".gpg-id";

/// Storage backend for encrypted secrets.
///
/// Implementations decrypt on read and encrypt on write; callers only ever
/// see plaintext wrapped in secret types.
pub trait SecretStore {
    /// Every secret identifier, sorted.
    ///
    /// # Errors
    ///
    /// Returns `VeilError::StoreAccess` if the store cannot be enumerated.
    /// Partial listings are never returned.
    fn list(&self) -> Result<Vec<String>>;

    /// Decrypt one secret.
    ///
    /// # Errors
    ///
    /// - `VeilError::SourceNotFound` if no such secret exists
    /// - `VeilError::Crypto` if decryption fails
    fn resolve(&self, id: &str) -> Result<DecryptedSecret>;

    /// Encrypt `content` and replace the stored secret.
    fn persist(&self, id: &str, content: &SecretString) -> Result<()>;
}

/// Decrypted content of one secret file.
pub struct DecryptedSecret {
    id: String,
    content: Option<SecretString>,
}

impl DecryptedSecret {
    pub fn new(id: impl Into<String>, content: SecretString) -> Self {
        Self {
            id: id.into(),
            content: Some(content),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.content.is_none()
    }

    /// Borrow the decrypted text, if the source has not been closed.
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.expose_secret())
    }
}

impl SecretSource for DecryptedSecret {
    fn contents(&self) -> Result<SecretString> {
        self.content
            .as_ref()
            .map(|c| SecretString::from(c.expose_secret().to_string()))
            .ok_or_else(|| VeilError::SourceNotFound(format!("{} (already closed)", self.id)))
    }

    fn close(&mut self) {
        self.content = None;
    }
}

impl std::fmt::Debug for DecryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedSecret")
            .field("id", &self.id)
            .field("content", &"[REDACTED]")
            .finish()
    }
}

/// Directory store whose files are encrypted with GnuPG.
#[derive(Debug, Clone)]
pub struct GpgStore {
    root: PathBuf,
    gpg: PathBuf,
}

impl GpgStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gpg: PathBuf::from("gpg"),
        }
    }

    /// Use a specific gpg executable.
    pub fn with_gpg(mut self, gpg: impl Into<PathBuf>) -> Self {
        self.gpg = gpg.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the encrypted file for `id`.
    ///
    /// # Errors
    ///
    /// Returns `VeilError::InvalidInput` for empty identifiers or ones that
    /// would escape the store root.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        let id = id.trim_matches('/');
        if id.is_empty() {
            return Err(VeilError::InvalidInput(
                "Secret identifier cannot be empty".to_string(),
            ));
        }
        let relative = Path::new(id);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(VeilError::InvalidInput(format!(
                "Secret identifier must stay inside the store: {}",
                id
            )));
        }
        Ok(self.root.join(format!("{}.{}", id, SECRET_EXTENSION)))
    }

    /// Recipients from the nearest `.gpg-id`, searching from the secret's
    /// directory up to the store root.
    pub fn recipients_for(&self, secret_path: &Path) -> Result<Vec<String>> {
        let mut dir = secret_path.parent();
        while let Some(current) = dir {
            let candidate = current.join(RECIPIENTS_FILE);
            if candidate.is_file() {
                let contents = fs::read_to_string(&candidate)?;
                let recipients: Vec<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_string)
                    .collect();
                if recipients.is_empty() {
                    return Err(VeilError::Crypto(format!(
                        "{} lists no recipients",
                        candidate.display()
                    )));
                }
                return Ok(recipients);
            }
            if current == self.root {
                break;
            }
            dir = current.parent();
        }
        Err(VeilError::Crypto(format!(
            "No {} found for {}",
            RECIPIENTS_FILE,
            secret_path.display()
        )))
    }

    fn identifier_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let stem = relative.with_extension("");
        let parts: Vec<String> = stem
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn gpg_failure(stderr: &[u8]) -> String {
    let message = String::from_utf8_lossy(stderr).trim().to_string();
    if message.is_empty() {
        "gpg exited with failure".to_string()
    } else {
        message
    }
}

impl SecretStore for GpgStore {
    fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(VeilError::StoreAccess(format!(
                "Store directory does not exist: {}",
                self.root.display()
            )));
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry?;
            let path = entry.path();
            let is_secret = entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(SECRET_EXTENSION);
            if !is_secret {
                continue;
            }
            if let Some(id) = self.identifier_for(path) {
                ids.push(id);
            }
        }
        ids.sort();
        debug!(count = ids.len(), root = %self.root.display(), "enumerated store");
        Ok(ids)
    }

    fn resolve(&self, id: &str) -> Result<DecryptedSecret> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(VeilError::SourceNotFound(id.to_string()));
        }

        let output = Command::new(&self.gpg)
            .args(["--quiet", "--yes", "--decrypt"])
            .arg(&path)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|e| {
                VeilError::Crypto(format!("Failed to run {}: {}", self.gpg.display(), e))
            })?;
        if !output.status.success() {
            return Err(VeilError::Crypto(gpg_failure(&output.stderr)));
        }

        let text = String::from_utf8(output.stdout).map_err(|err| {
            let mut bytes = err.into_bytes();
            bytes.zeroize();
            VeilError::Crypto(format!("{} does not decrypt to UTF-8 text", id))
        })?;
        debug!(id, "decrypted secret");
        Ok(DecryptedSecret::new(id, SecretString::from(text)))
    }

    fn persist(&self, id: &str, content: &SecretString) -> Result<()> {
        let path = self.path_for(id)?;
        let recipients = self.recipients_for(&path)?;

        let mut command = Command::new(&self.gpg);
        command.args(["--quiet", "--yes", "--batch", "--encrypt", "--output", "-"]);
        for recipient in &recipients {
            command.arg("--recipient").arg(recipient);
        }
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                VeilError::Crypto(format!("Failed to run {}: {}", self.gpg.display(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(content.expose_secret().as_bytes())
                .map_err(|e| VeilError::Crypto(format!("Failed to pipe secret to gpg: {}", e)))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| VeilError::Crypto(format!("gpg did not finish: {}", e)))?;
        if !output.status.success() {
            return Err(VeilError::Crypto(gpg_failure(&output.stderr)));
        }

        write_atomic(&path, &output.stdout)?;
        debug!(id, recipients = recipients.len(), "persisted secret");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_sorts_and_skips_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("web")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("web").join("github.gpg"), b"x").unwrap();
        fs::write(root.join("email.gpg"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::write(root.join(".git").join("leak.gpg"), b"x").unwrap();
        fs::write(root.join(RECIPIENTS_FILE), b"ABCDEF\n").unwrap();

        let ids = GpgStore::new(root).list().unwrap();

        assert_eq!(ids, vec!["email", "web/github"]);
    }

    #[test]
    fn test_list_missing_root_is_store_access() {
        let dir = tempdir().unwrap();
        let store = GpgStore::new(dir.path().join("nope"));
        assert!(matches!(store.list(), Err(VeilError::StoreAccess(_))));
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = GpgStore::new(dir.path());
        match store.resolve("missing/entry") {
            Err(VeilError::SourceNotFound(id)) => assert_eq!(id, "missing/entry"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_path_for_rejects_escape() {
        let store = GpgStore::new("/store");
        assert!(matches!(
            store.path_for("../etc/passwd"),
            Err(VeilError::InvalidInput(_))
        ));
        assert!(matches!(store.path_for(""), Err(VeilError::InvalidInput(_))));
        assert_eq!(
            store.path_for("web/github").unwrap(),
            PathBuf::from("/store/web/github.gpg")
        );
    }

    #[test]
    fn test_recipients_from_nearest_gpg_id() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("work").join("vpn")).unwrap();
        fs::write(root.join(RECIPIENTS_FILE), "personal@example.org\n").unwrap();
        fs::write(
            root.join("work").join(RECIPIENTS_FILE),
            "# team keys\nalice@example.org\n\nbob@example.org\n",
        )
        .unwrap();
        let store = GpgStore::new(root);

        let nested = store
            .recipients_for(&store.path_for("work/vpn/office").unwrap())
            .unwrap();
        assert_eq!(nested, vec!["alice@example.org", "bob@example.org"]);

        let top = store
            .recipients_for(&store.path_for("email").unwrap())
            .unwrap();
        assert_eq!(top, vec!["personal@example.org"]);
    }

    #[test]
    fn test_recipients_missing_is_crypto_error() {
        let dir = tempdir().unwrap();
        let store = GpgStore::new(dir.path());
        let path = store.path_for("email").unwrap();
        assert!(matches!(
            store.recipients_for(&path),
            Err(VeilError::Crypto(_))
        ));
    }

    #[test]
    fn test_closed_source_reports_not_found() {
        let mut secret = DecryptedSecret::new("email", SecretString::from("pw".to_string()));
        assert_eq!(secret.text(), Some("pw"));
        secret.close();
        assert!(secret.is_closed());
        assert!(matches!(
            secret.contents(),
            Err(VeilError::SourceNotFound(_))
        ));
    }
}
