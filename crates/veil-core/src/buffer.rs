//! A small line-oriented text buffer with undo/redo, a modified flag,
//! per-character render overlays and a kill ring.
//!
//! Overlay changes are recorded in undo history and mark the buffer
//! modified, the same way text properties behave in a classic editor. The
//! masking session relies on snapshot/restore to make them invisible.
//!
//! All offsets are byte offsets into the text and always fall on character
//! boundaries.

use std::ops::Range;

use secrecy::SecretString;
use zeroize::Zeroize;

use crate::clipboard::{KillRing, SecretSource};
use crate::error::Result;
use crate::mask::MaskHost;

/// One primitive change, enough to undo or redo it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Insert {
        at: usize,
        text: String,
    },
    Delete {
        at: usize,
        text: String,
    },
    Overlay {
        first_char: usize,
        before: Vec<Option<char>>,
        after: Vec<Option<char>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UndoEntry {
    changes: Vec<Change>,
    modified_before: bool,
}

/// Copy of a buffer's undo history and modified flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
    modified: bool,
}

impl HistorySnapshot {
    /// Number of undoable steps captured.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn modified(&self) -> bool {
        self.modified
    }
}

/// Editable text with history.
pub struct EditBuffer {
    text: String,
    overlays: Vec<Option<char>>,
    cursor: usize,
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
    modified: bool,
    status: String,
    kill_ring: KillRing,
    closed: bool,
}

impl EditBuffer {
    /// Load `text` as the unmodified starting state.
    pub fn from_text(text: &str, kill_ring: KillRing) -> Self {
        Self {
            text: text.to_string(),
            overlays: vec![None; text.chars().count()],
            cursor: 0,
            undo: Vec::new(),
            redo: Vec::new(),
            modified: false,
            status: String::new(),
            kill_ring,
            closed: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Record that the current text has been persisted.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn kill_ring(&self) -> &KillRing {
        &self.kill_ring
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    // --- Cursor ---

    pub fn cursor_offset(&self) -> usize {
        self.cursor
    }

    /// Cursor as (line, column), both zero-based, column in characters.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, self.text[line_start..self.cursor].chars().count())
    }

    pub fn set_cursor(&mut self, offset: usize) {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        self.cursor = offset;
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    pub fn move_up(&mut self) {
        let (line, column) = self.cursor_position();
        if line > 0 {
            self.move_to(line - 1, column);
        }
    }

    pub fn move_down(&mut self) {
        let (line, column) = self.cursor_position();
        if line + 1 < self.line_count() {
            self.move_to(line + 1, column);
        }
    }

    fn move_to(&mut self, line: usize, column: usize) {
        let start = self.line_offset(line);
        let end = self.line_end(start);
        let offset = self.text[start..end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or(end);
        self.cursor = offset;
    }

    // --- Lines ---

    pub fn line_count(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    /// Text of line `index` as stored.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.text.split('\n').nth(index)
    }

    /// Line `index` as it should be drawn, with overlays substituted.
    pub fn rendered_line(&self, index: usize) -> Option<String> {
        if index >= self.line_count() {
            return None;
        }
        let start = self.line_offset(index);
        let end = self.line_end(start);
        let first_char = self.char_index(start);
        Some(
            self.text[start..end]
                .chars()
                .zip(&self.overlays[first_char..])
                .map(|(c, overlay)| overlay.unwrap_or(c))
                .collect(),
        )
    }

    fn line_offset(&self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        self.text
            .match_indices('\n')
            .nth(line - 1)
            .map(|(i, _)| i + 1)
            .unwrap_or(self.text.len())
    }

    fn line_start(&self, offset: usize) -> usize {
        self.text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self, offset: usize) -> usize {
        self.text[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(self.text.len())
    }

    fn char_index(&self, offset: usize) -> usize {
        self.text[..offset].chars().count()
    }

    // --- Editing ---
    //
    // Every text change returns the byte range the change now occupies so
    // the caller can forward it to a change hook. Deletions return an empty
    // range at the deletion point.

    pub fn insert_str(&mut self, text: &str) -> Range<usize> {
        let at = self.cursor;
        self.record(vec![Change::Insert {
            at,
            text: text.to_string(),
        }]);
        self.raw_insert(at, text);
        self.cursor = at + text.len();
        at..self.cursor
    }

    pub fn insert_char(&mut self, c: char) -> Range<usize> {
        let mut buf = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut buf))
    }

    pub fn newline(&mut self) -> Range<usize> {
        self.insert_str("\n")
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) -> Option<Range<usize>> {
        let c = self.text[..self.cursor].chars().next_back()?;
        let at = self.cursor - c.len_utf8();
        Some(self.delete_range(at..self.cursor))
    }

    /// Delete the character under the cursor.
    pub fn delete_forward(&mut self) -> Option<Range<usize>> {
        let c = self.text[self.cursor..].chars().next()?;
        let end = self.cursor + c.len_utf8();
        Some(self.delete_range(self.cursor..end))
    }

    /// Replace `range` with `text` as a single undoable step.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) -> Range<usize> {
        let range = self.clamp(range);
        let removed = self.text[range.clone()].to_string();
        self.record(vec![
            Change::Delete {
                at: range.start,
                text: removed,
            },
            Change::Insert {
                at: range.start,
                text: text.to_string(),
            },
        ]);
        self.raw_delete(range.clone());
        self.raw_insert(range.start, text);
        self.cursor = range.start + text.len();
        range.start..self.cursor
    }

    /// Kill from the cursor to the end of the line, or the newline itself
    /// when already at the end. The killed text goes to the kill ring.
    pub fn kill_line(&mut self) -> Option<Range<usize>> {
        let end = self.line_end(self.cursor);
        let end = if end == self.cursor {
            if end == self.text.len() {
                return None;
            }
            end + 1
        } else {
            end
        };
        self.kill_ring
            .push(self.text[self.cursor..end].to_string());
        Some(self.delete_range(self.cursor..end))
    }

    /// Insert the most recent kill at the cursor.
    pub fn yank(&mut self) -> Option<Range<usize>> {
        let text = self.kill_ring.latest()?;
        Some(self.insert_str(&text))
    }

    /// Undo the most recent step. Returns the affected range.
    pub fn undo(&mut self) -> Option<Range<usize>> {
        let entry = self.undo.pop()?;
        let range = self.apply_inverse(&entry.changes);
        let modified_after = self.modified;
        self.modified = entry.modified_before;
        self.redo.push(UndoEntry {
            changes: entry.changes,
            modified_before: modified_after,
        });
        Some(range)
    }

    /// Redo the most recently undone step. Returns the affected range.
    pub fn redo(&mut self) -> Option<Range<usize>> {
        let entry = self.redo.pop()?;
        let range = self.apply_forward(&entry.changes);
        let modified_after = self.modified;
        self.modified = entry.modified_before;
        self.undo.push(UndoEntry {
            changes: entry.changes,
            modified_before: modified_after,
        });
        Some(range)
    }

    fn delete_range(&mut self, range: Range<usize>) -> Range<usize> {
        let removed = self.text[range.clone()].to_string();
        self.record(vec![Change::Delete {
            at: range.start,
            text: removed,
        }]);
        self.raw_delete(range.clone());
        self.cursor = range.start;
        range.start..range.start
    }

    fn record(&mut self, changes: Vec<Change>) {
        self.undo.push(UndoEntry {
            changes,
            modified_before: self.modified,
        });
        for mut entry in self.redo.drain(..) {
            scrub_entry(&mut entry);
        }
        self.modified = true;
    }

    fn raw_insert(&mut self, at: usize, text: &str) {
        let first_char = self.char_index(at);
        let count = text.chars().count();
        self.text.insert_str(at, text);
        self.overlays
            .splice(first_char..first_char, std::iter::repeat(None).take(count));
    }

    fn raw_delete(&mut self, range: Range<usize>) {
        let first_char = self.char_index(range.start);
        let count = self.text[range.clone()].chars().count();
        self.text.replace_range(range, "");
        self.overlays.drain(first_char..first_char + count);
    }

    fn set_overlays(&mut self, first_char: usize, values: &[Option<char>]) {
        let end = (first_char + values.len()).min(self.overlays.len());
        for (slot, value) in self.overlays[first_char..end].iter_mut().zip(values) {
            *slot = *value;
        }
    }

    fn apply_inverse(&mut self, changes: &[Change]) -> Range<usize> {
        let mut span: Option<Range<usize>> = None;
        for change in changes.iter().rev() {
            let touched = match change {
                Change::Insert { at, text } => {
                    self.raw_delete(*at..*at + text.len());
                    self.cursor = *at;
                    *at..*at
                }
                Change::Delete { at, text } => {
                    self.raw_insert(*at, text);
                    self.cursor = *at + text.len();
                    *at..*at + text.len()
                }
                Change::Overlay {
                    first_char, before, ..
                } => {
                    self.set_overlays(*first_char, before);
                    continue;
                }
            };
            span = Some(union(span, touched));
        }
        span.unwrap_or(self.cursor..self.cursor)
    }

    fn apply_forward(&mut self, changes: &[Change]) -> Range<usize> {
        let mut span: Option<Range<usize>> = None;
        for change in changes {
            let touched = match change {
                Change::Insert { at, text } => {
                    self.raw_insert(*at, text);
                    self.cursor = *at + text.len();
                    *at..*at + text.len()
                }
                Change::Delete { at, text } => {
                    self.raw_delete(*at..*at + text.len());
                    self.cursor = *at;
                    *at..*at
                }
                Change::Overlay {
                    first_char, after, ..
                } => {
                    self.set_overlays(*first_char, after);
                    continue;
                }
            };
            span = Some(union(span, touched));
        }
        span.unwrap_or(self.cursor..self.cursor)
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let mut end = range.end.min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        let mut start = range.start.min(end);
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }
        start..end
    }

    fn set_overlay_range(&mut self, range: Range<usize>, value: Option<char>) {
        let range = self.clamp(range);
        if range.is_empty() {
            return;
        }
        let first_char = self.char_index(range.start);
        let count = self.text[range].chars().count();
        let before = self.overlays[first_char..first_char + count].to_vec();
        let after = vec![value; count];
        if before == after {
            return;
        }
        self.record(vec![Change::Overlay {
            first_char,
            before,
            after: after.clone(),
        }]);
        self.set_overlays(first_char, &after);
    }
}

fn union(span: Option<Range<usize>>, touched: Range<usize>) -> Range<usize> {
    match span {
        Some(span) => span.start.min(touched.start)..span.end.max(touched.end),
        None => touched,
    }
}

fn scrub_entry(entry: &mut UndoEntry) {
    for change in &mut entry.changes {
        match change {
            Change::Insert { text, .. } | Change::Delete { text, .. } => text.zeroize(),
            Change::Overlay { .. } => {}
        }
    }
}

impl MaskHost for EditBuffer {
    type Snapshot = HistorySnapshot;

    fn first_line_range(&self) -> Range<usize> {
        0..self.line_end(0)
    }

    fn text_len(&self) -> usize {
        self.text.len()
    }

    fn apply_mask(&mut self, range: Range<usize>, glyph: char) {
        self.set_overlay_range(range, Some(glyph));
    }

    fn clear_mask(&mut self, range: Range<usize>) {
        self.set_overlay_range(range, None);
    }

    fn snapshot_history(&self) -> Result<HistorySnapshot> {
        Ok(HistorySnapshot {
            undo: self.undo.clone(),
            redo: self.redo.clone(),
            modified: self.modified,
        })
    }

    fn restore_history(&mut self, snapshot: HistorySnapshot) -> Result<()> {
        for mut entry in self.undo.drain(..).chain(self.redo.drain(..)) {
            scrub_entry(&mut entry);
        }
        self.undo = snapshot.undo;
        self.redo = snapshot.redo;
        self.modified = snapshot.modified;
        Ok(())
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    fn move_cursor_off_first_line(&mut self) {
        let end = self.line_end(0);
        self.cursor = if end < self.text.len() { end + 1 } else { end };
    }
}

impl SecretSource for EditBuffer {
    fn contents(&self) -> Result<SecretString> {
        Ok(SecretString::from(self.text.clone()))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl Drop for EditBuffer {
    fn drop(&mut self) {
        self.text.zeroize();
        for entry in self.undo.iter_mut().chain(self.redo.iter_mut()) {
            scrub_entry(entry);
        }
    }
}

impl std::fmt::Debug for EditBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditBuffer")
            .field("text", &"[REDACTED]")
            .field("cursor", &self.cursor)
            .field("modified", &self.modified)
            .field("undo_depth", &self.undo.len())
            .finish()
    }
}
