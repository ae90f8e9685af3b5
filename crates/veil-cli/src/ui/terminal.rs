//! Terminal mode guards.
//!
//! Raw mode must be undone on every exit path, including errors and
//! panics unwinding through a handler, or the user's shell is left broken.

use std::io;

use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

/// Raw mode, optionally on the alternate screen, for as long as it lives.
pub struct TerminalGuard {
    alternate: bool,
}

impl TerminalGuard {
    /// Raw mode on the current screen (for inline countdowns).
    pub fn raw() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { alternate: false })
    }

    /// Raw mode on the alternate screen (for full-screen views).
    pub fn fullscreen() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        Ok(Self { alternate: true })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.alternate {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
        }
        let _ = disable_raw_mode();
    }
}
