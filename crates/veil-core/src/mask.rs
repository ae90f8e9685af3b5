//! Display masking for an editable secret.
//!
//! The first line of the buffer is hidden behind a render overlay. Applying
//! or removing the overlay may look like an edit to the host (undo entries,
//! modified flag), so every overlay change is bracketed by a snapshot and a
//! restore of the host's history. To the user nothing happened to the
//! document; only the rendering changed.

use std::ops::Range;

use tracing::warn;

use crate::error::{Result, VeilError};

/// Status text shown when the secret is visible.
pub const STATUS_SHOWN: &str = "password shown";

/// Status text shown when the secret is masked.
pub const STATUS_HIDDEN: &str = "password hidden";

/// Editor capabilities the masking state machine needs.
pub trait MaskHost {
    /// Opaque copy of the undo history and modified flag.
    type Snapshot;

    /// Byte range of the first line, without its terminator.
    fn first_line_range(&self) -> Range<usize>;

    /// Length of the whole text in bytes.
    fn text_len(&self) -> usize;

    /// Render every character in `range` as `glyph`. Characters are not
    /// changed.
    fn apply_mask(&mut self, range: Range<usize>, glyph: char);

    /// Remove mask overlays from `range`.
    fn clear_mask(&mut self, range: Range<usize>);

    fn snapshot_history(&self) -> Result<Self::Snapshot>;

    fn restore_history(&mut self, snapshot: Self::Snapshot) -> Result<()>;

    /// Update the status indicator.
    fn set_status(&mut self, status: &str);

    /// Move point off the first line.
    fn move_cursor_off_first_line(&mut self);
}

/// Whether the first line is currently masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskState {
    Shown,
    Hidden,
}

/// Masking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskConfig {
    /// Glyph rendered in place of each secret character
    pub glyph: char,

    /// Start in `Hidden` when a session opens
    pub initially_hidden: bool,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            glyph: '*',
            initially_hidden: true,
        }
    }
}

/// Masking state for one open buffer.
#[derive(Debug)]
pub struct MaskedEditSession {
    state: MaskState,
    glyph: char,
    change_hook: bool,
}

impl MaskedEditSession {
    /// Start a session over a freshly opened buffer.
    ///
    /// With `initially_hidden` the first line is masked and the cursor moved
    /// to the next line. The returned warning is set when the host's history
    /// could not be preserved; masking is applied regardless.
    pub fn open<H: MaskHost>(host: &mut H, config: MaskConfig) -> (Self, Option<VeilError>) {
        let mut session = Self {
            state: MaskState::Shown,
            glyph: config.glyph,
            change_hook: false,
        };
        if !config.initially_hidden {
            return (session, None);
        }
        let warning = session.toggle(host);
        host.move_cursor_off_first_line();
        (session, warning)
    }

    pub fn state(&self) -> MaskState {
        self.state
    }

    pub fn is_hidden(&self) -> bool {
        self.state == MaskState::Hidden
    }

    pub fn glyph(&self) -> char {
        self.glyph
    }

    /// Flip between `Shown` and `Hidden` without touching undo history or
    /// the modified flag.
    pub fn toggle<H: MaskHost>(&mut self, host: &mut H) -> Option<VeilError> {
        let glyph = self.glyph;
        let next = match self.state {
            MaskState::Hidden => MaskState::Shown,
            MaskState::Shown => MaskState::Hidden,
        };
        let warning = preserving_history(host, |host| match next {
            MaskState::Shown => {
                let len = host.text_len();
                host.clear_mask(0..len);
                host.set_status(STATUS_SHOWN);
            }
            MaskState::Hidden => {
                mask_first_line_only(host, glyph);
                host.set_status(STATUS_HIDDEN);
            }
        });
        self.change_hook = next == MaskState::Hidden;
        self.state = next;
        warning
    }

    /// Per-edit callback. The host calls this after every text change with
    /// the byte range the change now occupies.
    ///
    /// Only acts while hidden, and only on the part of the range inside the
    /// first line. The whole changed range is re-masked every time. A change
    /// that may have moved the end of the first line (a deletion, or text
    /// reaching its terminator) re-masks the whole first line and unmasks
    /// everything after it, since overlays travel with their characters.
    pub fn on_text_changed<H: MaskHost>(
        &mut self,
        host: &mut H,
        changed: Range<usize>,
    ) -> Option<VeilError> {
        if !self.change_hook || self.state != MaskState::Hidden {
            return None;
        }
        let first = host.first_line_range();
        if changed.start > first.end {
            return None;
        }
        let glyph = self.glyph;
        if changed.is_empty() || changed.end >= first.end {
            return preserving_history(host, |host| mask_first_line_only(host, glyph));
        }
        let start = changed.start.max(first.start);
        preserving_history(host, |host| host.apply_mask(start..changed.end, glyph))
    }
}

/// Mask exactly the first line: overlays past its end are cleared first.
fn mask_first_line_only<H: MaskHost>(host: &mut H, glyph: char) {
    let first = host.first_line_range();
    let len = host.text_len();
    host.clear_mask(first.end..len);
    host.apply_mask(first, glyph);
}

/// Run `mutate` between a history snapshot and its restore. A failure on
/// either side is returned as a warning; the mutation always runs.
fn preserving_history<H, F>(host: &mut H, mutate: F) -> Option<VeilError>
where
    H: MaskHost,
    F: FnOnce(&mut H),
{
    let snapshot = match host.snapshot_history() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(error = %err, "could not snapshot undo history before masking");
            mutate(host);
            return Some(as_snapshot_error(err));
        }
    };
    mutate(host);
    if let Err(err) = host.restore_history(snapshot) {
        warn!(error = %err, "could not restore undo history after masking");
        return Some(as_snapshot_error(err));
    }
    None
}

fn as_snapshot_error(err: VeilError) -> VeilError {
    match err {
        VeilError::HistorySnapshot(_) => err,
        other => VeilError::HistorySnapshot(other.to_string()),
    }
}
