//! The clipboard session: tracks the last secret placed and erases it.

use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{HistoryStore, SecretSource, SystemClipboard};
use crate::error::{Result, VeilError};
use crate::secret::{scrub_entries, SecretValue};
use crate::timer::{Scheduler, TimerId};

/// How long a placed secret stays on the clipboard unless configured.
pub const DEFAULT_CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest timeout front ends should accept for a placed secret.
pub const MAX_CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of a successful [`ClipboardSession::place`].
#[derive(Debug)]
pub struct PlaceReceipt {
    /// Delay before the secret is erased
    pub delay: Duration,

    /// Timer armed for the erasure
    pub timer: TimerId,

    /// Erasure of the previously tracked secret, if there was one
    pub previous: Option<EraseReport>,
}

/// Outcome of an erasure.
///
/// Clipboard clearing is conditional on the clipboard still holding the
/// secret; history scrubbing always runs. The two are reported separately.
#[derive(Debug, Default)]
pub struct EraseReport {
    /// A secret was being tracked when erasure started
    pub had_secret: bool,

    /// The system clipboard held the secret and was emptied
    pub clipboard_cleared: bool,

    /// Number of kill ring entries removed
    pub history_removed: usize,

    /// Best-effort failures that did not stop the erasure
    pub warnings: Vec<VeilError>,
}

impl EraseReport {
    /// Some step failed and the scrub may be incomplete.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Owned clipboard handoff state.
///
/// At most one secret is tracked and at most one erasure timer is armed.
pub struct ClipboardSession<C, H, S> {
    clipboard: C,
    history: H,
    scheduler: S,
    timeout: Duration,
    tracked: Option<SecretValue>,
    timer: Option<TimerId>,
}

impl<C, H, S> ClipboardSession<C, H, S>
where
    C: SystemClipboard,
    H: HistoryStore,
    S: Scheduler,
{
    pub fn new(clipboard: C, history: H, scheduler: S) -> Self {
        Self {
            clipboard,
            history,
            scheduler,
            timeout: DEFAULT_CLIPBOARD_TIMEOUT,
            tracked: None,
            timer: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Copy the first line of `source` to the clipboard and arm its erasure.
    ///
    /// The source is read before anything shared is touched, so an
    /// unreadable source leaves the clipboard alone. The previous secret is
    /// fully erased before the new one is written. When `also_close_source`
    /// is set the source is released once the secret has been extracted.
    ///
    /// # Errors
    ///
    /// - Whatever the source reports when its contents cannot be read
    ///   (typically `VeilError::SourceNotFound`).
    /// - `VeilError::ClipboardUnavailable` if the write fails. Nothing is
    ///   tracked and no timer is armed in that case.
    pub fn place<Src>(&mut self, source: &mut Src, also_close_source: bool) -> Result<PlaceReceipt>
    where
        Src: SecretSource + ?Sized,
    {
        let secret = {
            let contents = source.contents()?;
            SecretValue::from_first_line(contents.expose_secret())
        };

        let previous = self.tracked.is_some().then(|| self.erase());
        if also_close_source {
            source.close();
        }

        self.clipboard.write(secret.expose()).map_err(|err| match err {
            VeilError::ClipboardUnavailable(_) => err,
            other => VeilError::ClipboardUnavailable(other.to_string()),
        })?;

        self.tracked = Some(secret);
        let timer = self.scheduler.schedule(self.timeout);
        self.timer = Some(timer);
        debug!(delay_secs = self.timeout.as_secs(), "secret placed on clipboard");

        Ok(PlaceReceipt {
            delay: self.timeout,
            timer,
            previous,
        })
    }

    /// Start tracking a secret that is already on the clipboard, without
    /// writing it or arming a timer. Used to erase a secret placed by an
    /// earlier process.
    pub fn track(&mut self, secret: SecretValue) -> Option<EraseReport> {
        let previous = self.tracked.is_some().then(|| self.erase());
        self.tracked = Some(secret);
        previous
    }

    /// Erase the tracked secret from the clipboard and the kill ring.
    ///
    /// Idempotent: with nothing tracked this only cancels a stray timer.
    /// The clipboard is emptied only if it still holds the secret exactly.
    pub fn erase(&mut self) -> EraseReport {
        if let Some(timer) = self.timer.take() {
            self.scheduler.cancel(timer);
        }

        let Some(mut secret) = self.tracked.take() else {
            return EraseReport::default();
        };

        let mut report = EraseReport {
            had_secret: true,
            ..EraseReport::default()
        };

        match self.clipboard.read().map(Zeroizing::new) {
            Ok(current) => {
                if secret.matches(&current) {
                    match self.clipboard.write("") {
                        Ok(()) => report.clipboard_cleared = true,
                        Err(err) => {
                            warn!(error = %err, "could not clear clipboard");
                            report.warnings.push(err);
                        }
                    }
                } else {
                    debug!("clipboard changed since placement, leaving it untouched");
                }
            }
            Err(err) => {
                warn!(error = %err, "could not read clipboard, scrubbing history only");
                report.warnings.push(err);
            }
        }

        match self.history.entries() {
            Ok(entries) => {
                let (kept, removed) = scrub_entries(entries, &secret);
                if removed > 0 {
                    match self.history.set_entries(kept) {
                        Ok(()) => report.history_removed = removed,
                        Err(err) => {
                            warn!(error = %err, "could not rewrite kill ring");
                            report.warnings.push(err);
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "could not read kill ring");
                report.warnings.push(err);
            }
        }

        secret.clear();
        debug!(
            clipboard_cleared = report.clipboard_cleared,
            history_removed = report.history_removed,
            "secret erased"
        );
        report
    }

    /// Dispatch a fired timer. Only the currently armed timer erases; stale
    /// ids are ignored.
    pub fn on_timer(&mut self, id: TimerId) -> Option<EraseReport> {
        if self.timer != Some(id) {
            debug!(?id, "ignoring stale erasure timer");
            return None;
        }
        self.timer = None;
        Some(self.erase())
    }

    /// Fire whatever the scheduler reports as due.
    pub fn poll(&mut self) -> Option<EraseReport> {
        let mut last = None;
        for id in self.scheduler.due() {
            if let Some(report) = self.on_timer(id) {
                last = Some(report);
            }
        }
        last
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }

    /// Time left before the armed erasure fires.
    pub fn remaining(&self) -> Option<Duration> {
        self.timer.and_then(|id| self.scheduler.remaining(id))
    }

    pub fn armed_timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
