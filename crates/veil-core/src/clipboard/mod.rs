//! Clipboard handoff: put a secret on the clipboard, then make sure it goes
//! away again.
//!
//! The clipboard and the kill ring are shared with everything else the user
//! does, so every mutation here is value-guarded: a resource is only cleared
//! if it still holds the secret this crate placed.

mod session;

use std::cell::RefCell;
use std::rc::Rc;

use secrecy::SecretString;
use zeroize::Zeroize;

use crate::error::{Result, VeilError};

pub use session::{
    ClipboardSession, EraseReport, PlaceReceipt, DEFAULT_CLIPBOARD_TIMEOUT, MAX_CLIPBOARD_TIMEOUT,
};

/// The system clipboard.
pub trait SystemClipboard {
    /// Replace the clipboard contents.
    fn write(&mut self, text: &str) -> Result<()>;

    /// Current clipboard contents.
    fn read(&mut self) -> Result<String>;
}

/// Ordered record of previously killed/copied text (a kill ring).
pub trait HistoryStore {
    fn entries(&self) -> Result<Vec<String>>;
    fn set_entries(&mut self, entries: Vec<String>) -> Result<()>;
}

/// Something a secret can be copied out of: a decrypted file or an open
/// editing view.
pub trait SecretSource {
    /// Full decrypted text of the source.
    fn contents(&self) -> Result<SecretString>;

    /// Release the source so its plaintext is no longer rendered or held.
    fn close(&mut self);
}

/// In-process clipboard. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Rc<RefCell<MemoryClipboardState>>,
}

#[derive(Debug, Default)]
struct MemoryClipboardState {
    contents: String,
    unavailable: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the contents, bypassing availability.
    pub fn contents(&self) -> String {
        self.state.borrow().contents.clone()
    }

    /// Simulate another program writing to the clipboard.
    pub fn set_contents(&self, text: &str) {
        self.state.borrow_mut().contents = text.to_string();
    }

    /// Make every subsequent read and write fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }
}

impl SystemClipboard for MemoryClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.unavailable {
            return Err(VeilError::ClipboardUnavailable(
                "clipboard is not reachable".to_string(),
            ));
        }
        state.contents = text.to_string();
        Ok(())
    }

    fn read(&mut self) -> Result<String> {
        let state = self.state.borrow();
        if state.unavailable {
            return Err(VeilError::ClipboardUnavailable(
                "clipboard is not reachable".to_string(),
            ));
        }
        Ok(state.contents.clone())
    }
}

/// Shared kill ring, newest entry first. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct KillRing {
    entries: Rc<RefCell<Entries>>,
}

/// Kill ring storage. Entries are zeroized when replaced and when the last
/// handle goes away.
#[derive(Debug, Default)]
struct Entries(Vec<String>);

impl Drop for Entries {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl KillRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<String>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(Entries(entries))),
        }
    }

    /// Record a new kill at the front of the ring.
    pub fn push(&self, text: String) {
        if text.is_empty() {
            return;
        }
        self.entries.borrow_mut().0.insert(0, text);
    }

    /// Most recent kill, if any.
    pub fn latest(&self) -> Option<String> {
        self.entries.borrow().0.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.borrow().0.clone()
    }
}

impl HistoryStore for KillRing {
    fn entries(&self) -> Result<Vec<String>> {
        Ok(self.to_vec())
    }

    fn set_entries(&mut self, entries: Vec<String>) -> Result<()> {
        let mut old = std::mem::replace(&mut self.entries.borrow_mut().0, entries);
        old.zeroize();
        Ok(())
    }
}
