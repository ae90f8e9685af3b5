use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor::MoveToColumn,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{Clear, ClearType},
};

use veil_core::{
    ClipboardSession, EraseReport, HistoryStore, KillRing, Scheduler, SecretStore, SystemClipboard,
};

use crate::app::{AppContext, SystemSession};
use crate::cli::CopyArgs;
use crate::ui::prompt::identifier_or_prompt;
use crate::ui::terminal::TerminalGuard;
use crate::ui::theme::CLOCK;
use crate::ui::{badge, kv, Badge, UiContext};

/// Countdown refresh interval.
const TICK: Duration = Duration::from_millis(250);

pub fn handle_copy(app: &AppContext, args: &CopyArgs) -> anyhow::Result<()> {
    let ui = app.ui_context(false);
    app.clipboard_timeout()?;
    let store = app.store()?;
    let id = identifier_or_prompt(&ui, &store, args.id.as_deref(), "Copy")?;

    let mut secret = store.resolve(&id)?;
    let mut session = app.clipboard_session(KillRing::new())?;
    let receipt = session.place(&mut secret, true)?;

    if !app.quiet() {
        println!(
            "{}",
            badge(&ui, Badge::Ok, &format!("Copied {} to clipboard", id))
        );
        println!("{}", kv(&ui, "Clears in", &format!("{}s", receipt.delay.as_secs())));
    }

    wait_for_erase(app, &ui, &mut session)
}

/// Keep the process alive until the tracked secret is erased, either by the
/// timer or by the user asking for it early.
pub fn wait_for_erase(
    app: &AppContext,
    ui: &UiContext,
    session: &mut SystemSession,
) -> anyhow::Result<()> {
    let waited = if ui.is_interactive() {
        countdown(app, ui, session)
    } else {
        Ok(sleep_until_erased(session))
    };
    let (report, failure) = settle(session, waited);
    if report.had_secret || failure.is_none() {
        report_erase(app, ui, &report);
    }
    failure.map_or(Ok(()), Err)
}

/// Finish a wait. If it failed, whatever is still tracked is erased before
/// the failure is handed back.
fn settle<C, H, S>(
    session: &mut ClipboardSession<C, H, S>,
    waited: anyhow::Result<EraseReport>,
) -> (EraseReport, Option<anyhow::Error>)
where
    C: SystemClipboard,
    H: HistoryStore,
    S: Scheduler,
{
    match waited {
        Ok(report) => (report, None),
        Err(err) => (session.erase(), Some(err)),
    }
}

fn sleep_until_erased(session: &mut SystemSession) -> EraseReport {
    loop {
        if let Some(report) = session.poll() {
            return report;
        }
        match session.remaining() {
            Some(left) => thread::sleep(left.min(TICK)),
            None => return session.erase(),
        }
    }
}

fn countdown(
    app: &AppContext,
    ui: &UiContext,
    session: &mut SystemSession,
) -> anyhow::Result<EraseReport> {
    let _guard = TerminalGuard::raw()?;
    let mut stderr = io::stderr();

    let report = loop {
        if let Some(report) = session.poll() {
            break report;
        }
        let Some(left) = session.remaining() else {
            break session.erase();
        };

        if !app.quiet() {
            let line = format!(
                "{} Clearing clipboard in {}s (Enter: clear now, q: quit)",
                CLOCK.get(ui.unicode),
                whole_seconds(left)
            );
            execute!(
                stderr,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(line)
            )?;
        }

        if event::poll(left.min(TICK))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let interrupt = key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c');
                if interrupt
                    || matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q'))
                {
                    break session.erase();
                }
            }
        }
    };

    if !app.quiet() {
        execute!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        stderr.flush()?;
    }
    Ok(report)
}

/// Seconds left, rounded up so the display never shows 0 while waiting.
pub fn whole_seconds(left: Duration) -> u64 {
    let millis = left.as_millis() as u64;
    millis.div_ceil(1000)
}

/// One-line description of an erase for status lines.
pub fn erase_summary(report: &EraseReport) -> (Badge, String) {
    if !report.had_secret {
        return (Badge::Info, "Nothing to clear".to_string());
    }
    let mut message = if report.clipboard_cleared {
        "Clipboard cleared".to_string()
    } else {
        "Clipboard holds something else; left untouched".to_string()
    };
    if report.history_removed > 0 {
        message.push_str(&format!(
            ", {} history entr{} scrubbed",
            report.history_removed,
            if report.history_removed == 1 { "y" } else { "ies" }
        ));
    }
    let kind = if report.is_partial() {
        Badge::Warn
    } else if report.clipboard_cleared {
        Badge::Ok
    } else {
        Badge::Info
    };
    (kind, message)
}

pub fn report_erase(app: &AppContext, ui: &UiContext, report: &EraseReport) {
    for warning in &report.warnings {
        eprintln!("{}", badge(ui, Badge::Warn, &warning.to_string()));
    }
    if app.quiet() {
        return;
    }
    let (kind, message) = erase_summary(report);
    println!("{}", badge(ui, kind, &message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use veil_core::clipboard::MemoryClipboard;
    use veil_core::timer::ManualClock;
    use veil_core::{DeadlineScheduler, DecryptedSecret, VeilError};

    #[test]
    fn test_failed_wait_still_erases_clipboard() {
        let clipboard = MemoryClipboard::new();
        let mut session = ClipboardSession::new(
            clipboard.clone(),
            KillRing::new(),
            DeadlineScheduler::with_clock(ManualClock::new()),
        );
        let mut secret =
            DecryptedSecret::new("web/github", SecretString::from("hunter2".to_string()));
        session.place(&mut secret, true).expect("place");

        let (report, failure) = settle(&mut session, Err(anyhow::anyhow!("stderr closed")));

        assert!(failure.is_some());
        assert!(report.clipboard_cleared);
        assert!(!session.is_tracking());
        assert_eq!(clipboard.contents(), "");
    }

    #[test]
    fn test_finished_wait_keeps_its_report() {
        let mut session = ClipboardSession::new(
            MemoryClipboard::new(),
            KillRing::new(),
            DeadlineScheduler::with_clock(ManualClock::new()),
        );
        let waited = Ok(EraseReport {
            had_secret: true,
            clipboard_cleared: true,
            ..EraseReport::default()
        });

        let (report, failure) = settle(&mut session, waited);

        assert!(failure.is_none());
        assert!(report.clipboard_cleared);
    }

    #[test]
    fn test_whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::from_millis(9_001)), 10);
        assert_eq!(whole_seconds(Duration::from_secs(3)), 3);
        assert_eq!(whole_seconds(Duration::ZERO), 0);
    }

    #[test]
    fn test_summary_for_cleared_clipboard() {
        let report = EraseReport {
            had_secret: true,
            clipboard_cleared: true,
            history_removed: 2,
            warnings: Vec::new(),
        };
        let (kind, message) = erase_summary(&report);
        assert_eq!(kind, Badge::Ok);
        assert_eq!(message, "Clipboard cleared, 2 history entries scrubbed");
    }

    #[test]
    fn test_summary_for_foreign_clipboard() {
        let report = EraseReport {
            had_secret: true,
            ..EraseReport::default()
        };
        let (kind, message) = erase_summary(&report);
        assert_eq!(kind, Badge::Info);
        assert!(message.contains("left untouched"));
    }

    #[test]
    fn test_summary_with_warnings_is_warn() {
        let report = EraseReport {
            had_secret: true,
            clipboard_cleared: true,
            history_removed: 0,
            warnings: vec![VeilError::ClipboardUnavailable("gone".into())],
        };
        assert_eq!(erase_summary(&report).0, Badge::Warn);
    }

    #[test]
    fn test_summary_with_nothing_tracked() {
        assert_eq!(
            erase_summary(&EraseReport::default()).1,
            "Nothing to clear"
        );
    }
}
