//! Full-screen editor for one secret, with the password line masked.
//!
//! The editor owns the buffer, the masking session and (when a clipboard is
//! available) a clipboard session that scrubs the buffer's kill ring. Every
//! text change is reported to the masking session so the first line stays
//! masked while hidden.

mod ui;

use std::io;
use std::ops::Range;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use secrecy::{ExposeSecret, SecretString};

use veil_core::{
    ClipboardSession, EditBuffer, KillRing, MaskConfig, MaskedEditSession, Scheduler,
    SecretStore, SystemClipboard, VeilError,
};

use crate::commands::copy::{erase_summary, whole_seconds};
use crate::ui::terminal::TerminalGuard;

/// Longest wait for input before the status line is refreshed.
const TICK: Duration = Duration::from_millis(250);

/// An action waiting for the same key a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirm {
    Quit,
    CopyAndClose,
}

pub struct Editor<'a, C, S> {
    id: String,
    buffer: EditBuffer,
    mask: MaskedEditSession,
    clipboard: Result<ClipboardSession<C, KillRing, S>, VeilError>,
    store: &'a dyn SecretStore,
    message: Option<String>,
    confirm: Option<Confirm>,
    quit: bool,
    closed_by_copy: bool,
    saved: bool,
    scroll: usize,
}

/// What is left once the editor closes.
pub struct EditorOutcome<C, S> {
    pub clipboard: Option<ClipboardSession<C, KillRing, S>>,
    /// The editor was closed with copy-and-close, so the secret should stay
    /// on the clipboard until its timer fires.
    pub closed_by_copy: bool,
    pub saved: bool,
}

impl<'a, C, S> Editor<'a, C, S>
where
    C: SystemClipboard,
    S: Scheduler,
{
    /// Open `text` for editing. The clipboard session must share the kill
    /// ring given here so erasure scrubs what the user killed.
    pub fn open(
        id: impl Into<String>,
        text: &SecretString,
        kill_ring: KillRing,
        mask_config: MaskConfig,
        store: &'a dyn SecretStore,
        clipboard: Result<ClipboardSession<C, KillRing, S>, VeilError>,
    ) -> Self {
        let mut buffer = EditBuffer::from_text(text.expose_secret(), kill_ring);
        let (mask, warning) = MaskedEditSession::open(&mut buffer, mask_config);
        Self {
            id: id.into(),
            buffer,
            mask,
            clipboard,
            store,
            message: warning.map(|w| w.to_string()),
            confirm: None,
            quit: false,
            closed_by_copy: false,
            saved: false,
            scroll: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn mask(&self) -> &MaskedEditSession {
        &self.mask
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn should_exit(&self) -> bool {
        self.quit
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Seconds until the clipboard is erased, if a secret is on it.
    pub fn countdown(&self) -> Option<u64> {
        let session = self.clipboard.as_ref().ok()?;
        session.remaining().map(whole_seconds)
    }

    /// How long to wait for input before the next timer check.
    pub fn poll_timeout(&self) -> Duration {
        self.clipboard
            .as_ref()
            .ok()
            .and_then(|s| s.remaining())
            .map_or(TICK, |left| left.min(TICK))
    }

    /// Keep the cursor line inside a view of `height` lines.
    pub fn scroll_to_cursor(&mut self, height: usize) {
        let height = height.max(1);
        let (line, _) = self.buffer.cursor_position();
        if line < self.scroll {
            self.scroll = line;
        } else if line >= self.scroll + height {
            self.scroll = line + 1 - height;
        }
    }

    /// Fire a due clipboard timer.
    pub fn tick(&mut self) {
        if let Ok(session) = &mut self.clipboard {
            if let Some(report) = session.poll() {
                self.message = Some(erase_summary(&report).1);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let confirm = self.confirm.take();

        let changed: Option<Range<usize>> = match key.code {
            KeyCode::Char('t') if ctrl => {
                if let Some(warning) = self.mask.toggle(&mut self.buffer) {
                    self.message = Some(warning.to_string());
                }
                None
            }
            KeyCode::Char('o') if ctrl => {
                self.copy(false);
                None
            }
            KeyCode::Char('x') if ctrl => {
                if self.buffer.is_modified() && confirm != Some(Confirm::CopyAndClose) {
                    self.ask(Confirm::CopyAndClose, "Unsaved changes; Ctrl-X again to copy and discard");
                } else {
                    self.copy(true);
                }
                None
            }
            KeyCode::Char('l') if ctrl => {
                self.erase_now();
                None
            }
            KeyCode::Char('s') if ctrl => {
                self.save();
                None
            }
            KeyCode::Char('q') if ctrl => {
                if self.buffer.is_modified() && confirm != Some(Confirm::Quit) {
                    self.ask(Confirm::Quit, "Unsaved changes; Ctrl-Q again to discard");
                } else {
                    self.quit = true;
                }
                None
            }
            KeyCode::Char('k') if ctrl => self.buffer.kill_line(),
            KeyCode::Char('y') if ctrl => self.buffer.yank(),
            KeyCode::Char('z') if ctrl => self.buffer.undo(),
            KeyCode::Char('r') if ctrl => self.buffer.redo(),
            KeyCode::Char('a') if ctrl => {
                self.buffer.move_line_start();
                None
            }
            KeyCode::Char('e') if ctrl => {
                self.buffer.move_line_end();
                None
            }
            KeyCode::Char(_) if ctrl => None,
            KeyCode::Char(c) => Some(self.buffer.insert_char(c)),
            KeyCode::Enter => Some(self.buffer.newline()),
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete_forward(),
            KeyCode::Left => {
                self.buffer.move_left();
                None
            }
            KeyCode::Right => {
                self.buffer.move_right();
                None
            }
            KeyCode::Up => {
                self.buffer.move_up();
                None
            }
            KeyCode::Down => {
                self.buffer.move_down();
                None
            }
            KeyCode::Home => {
                self.buffer.move_line_start();
                None
            }
            KeyCode::End => {
                self.buffer.move_line_end();
                None
            }
            _ => None,
        };

        if let Some(range) = changed {
            if let Some(warning) = self.mask.on_text_changed(&mut self.buffer, range) {
                self.message = Some(warning.to_string());
            }
        }
    }

    /// Close the editor. Any plaintext in the buffer is wiped on drop.
    pub fn finish(self) -> EditorOutcome<C, S> {
        EditorOutcome {
            clipboard: self.clipboard.ok(),
            closed_by_copy: self.closed_by_copy,
            saved: self.saved,
        }
    }

    fn ask(&mut self, confirm: Confirm, message: &str) {
        self.confirm = Some(confirm);
        self.message = Some(message.to_string());
    }

    fn copy(&mut self, close: bool) {
        let session = match &mut self.clipboard {
            Ok(session) => session,
            Err(err) => {
                self.message = Some(err.to_string());
                return;
            }
        };
        match session.place(&mut self.buffer, close) {
            Ok(receipt) => {
                self.message = Some(format!(
                    "Password line copied; clears in {}s",
                    receipt.delay.as_secs()
                ));
                if close {
                    self.closed_by_copy = true;
                    self.quit = true;
                }
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    fn erase_now(&mut self) {
        self.message = Some(match &mut self.clipboard {
            Ok(session) => erase_summary(&session.erase()).1,
            Err(err) => err.to_string(),
        });
    }

    fn save(&mut self) {
        let content = SecretString::from(self.buffer.text().to_string());
        match self.store.persist(&self.id, &content) {
            Ok(()) => {
                self.buffer.mark_saved();
                self.saved = true;
                self.message = Some(format!("Saved {}", self.id));
            }
            Err(err) => self.message = Some(format!("Save failed: {}", err)),
        }
    }
}

/// Run the editor on the terminal until the user closes it.
pub fn run<C, S>(editor: &mut Editor<'_, C, S>) -> anyhow::Result<()>
where
    C: SystemClipboard,
    S: Scheduler,
{
    let _guard = TerminalGuard::fullscreen()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    while !editor.should_exit() {
        let size = terminal.size()?;
        editor.scroll_to_cursor(ui::text_height(size.height));
        terminal.draw(|f| ui::draw(f, editor))?;

        if event::poll(editor.poll_timeout())? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    editor.handle_key(key);
                }
            }
        }
        editor.tick();
    }
    Ok(())
}
