//! System clipboard access through the platform's copy/paste tools.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;
use zeroize::Zeroize;

use veil_core::{SystemClipboard, VeilError};

use crate::config::ClipboardSection;

/// Clipboard driven by an external copy command (stdin) and paste command
/// (stdout).
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    copy: Vec<String>,
    paste: Vec<String>,
}

impl CommandClipboard {
    pub fn new(copy: Vec<String>, paste: Vec<String>) -> veil_core::Result<Self> {
        if copy.is_empty() || paste.is_empty() {
            return Err(VeilError::ClipboardUnavailable(
                "clipboard commands must not be empty".to_string(),
            ));
        }
        Ok(Self { copy, paste })
    }

    /// Pick the clipboard tool: configured commands first, then whatever the
    /// session type suggests.
    pub fn detect(config: &ClipboardSection) -> veil_core::Result<Self> {
        if let Some(copy) = &config.command {
            let paste = config.paste_command.clone().ok_or_else(|| {
                VeilError::ClipboardUnavailable(
                    "[clipboard] paste_command is required when command is set".to_string(),
                )
            })?;
            return Self::new(copy.clone(), paste);
        }

        let (copy, paste): (&[&str], &[&str]) = if env_set("WAYLAND_DISPLAY") {
            (&["wl-copy"], &["wl-paste", "--no-newline"])
        } else if env_set("DISPLAY") {
            (
                &["xclip", "-selection", "clipboard"],
                &["xclip", "-selection", "clipboard", "-o"],
            )
        } else if cfg!(target_os = "macos") {
            (&["pbcopy"], &["pbpaste"])
        } else {
            return Err(VeilError::ClipboardUnavailable(
                "no display session found".to_string(),
            ));
        };
        debug!(tool = copy[0], "selected clipboard tool");
        Self::new(to_owned(copy), to_owned(paste))
    }

    fn command(argv: &[String]) -> Command {
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        command
    }
}

impl SystemClipboard for CommandClipboard {
    fn write(&mut self, text: &str) -> veil_core::Result<()> {
        let mut child = Self::command(&self.copy)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(&self.copy, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| unavailable(&self.copy, e))?;
        }
        let status = child.wait().map_err(|e| unavailable(&self.copy, e))?;
        if !status.success() {
            return Err(VeilError::ClipboardUnavailable(format!(
                "{} exited with {}",
                self.copy[0], status
            )));
        }
        Ok(())
    }

    fn read(&mut self) -> veil_core::Result<String> {
        let output = Self::command(&self.paste)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| unavailable(&self.paste, e))?;

        // Paste tools exit non-zero on an empty clipboard.
        if !output.status.success() {
            debug!(tool = %self.paste[0], "paste command failed, treating clipboard as empty");
            return Ok(String::new());
        }
        match String::from_utf8(output.stdout) {
            Ok(text) => Ok(text),
            Err(err) => {
                let mut bytes = err.into_bytes();
                bytes.zeroize();
                Ok(String::new())
            }
        }
    }
}

fn unavailable(argv: &[String], err: std::io::Error) -> VeilError {
    VeilError::ClipboardUnavailable(format!("{}: {}", argv[0], err))
}

fn env_set(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}

fn to_owned(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|s| s.to_string()).collect()
}
