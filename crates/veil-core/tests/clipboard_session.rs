use std::time::Duration;

use secrecy::SecretString;

use veil_core::clipboard::{MemoryClipboard, DEFAULT_CLIPBOARD_TIMEOUT};
use veil_core::timer::ManualClock;
use veil_core::{
    ClipboardSession, DeadlineScheduler, DecryptedSecret, KillRing, Scheduler, SecretSource,
};

type Session = ClipboardSession<MemoryClipboard, KillRing, DeadlineScheduler<ManualClock>>;

struct Harness {
    session: Session,
    clipboard: MemoryClipboard,
    ring: KillRing,
    clock: ManualClock,
}

impl Harness {
    fn new() -> Self {
        Self::with_ring(KillRing::new())
    }

    fn with_ring(ring: KillRing) -> Self {
        let clipboard = MemoryClipboard::new();
        let clock = ManualClock::new();
        let session = ClipboardSession::new(
            clipboard.clone(),
            ring.clone(),
            DeadlineScheduler::with_clock(clock.clone()),
        );
        Self {
            session,
            clipboard,
            ring,
            clock,
        }
    }
}

fn source(text: &str) -> DecryptedSecret {
    DecryptedSecret::new("test/entry", SecretString::from(text.to_string()))
}

#[test]
fn test_place_then_timeout_erases_everywhere() {
    let mut h = Harness::new();
    let mut secret = source("correct horse battery staple\nurl: example.org");

    let receipt = h
        .session
        .place(&mut secret, true)
        .expect("place should succeed");

    assert_eq!(h.clipboard.contents(), "correct horse battery staple");
    assert_eq!(receipt.delay, DEFAULT_CLIPBOARD_TIMEOUT);
    assert!(secret.is_closed());

    // The user yanks it somewhere in the meantime.
    h.ring.push("correct horse battery staple".to_string());

    h.clock.advance(Duration::from_secs(9));
    assert!(h.session.poll().is_none());
    assert_eq!(h.clipboard.contents(), "correct horse battery staple");

    h.clock.advance(Duration::from_secs(1));
    let report = h.session.poll().expect("timer should fire");
    assert!(report.clipboard_cleared);
    assert_eq!(report.history_removed, 1);
    assert_eq!(h.clipboard.contents(), "");
    assert!(!h
        .ring
        .to_vec()
        .iter()
        .any(|e| e == "correct horse battery staple"));
}

#[test]
fn test_erase_twice_matches_erase_once() {
    let mut h = Harness::new();
    h.session
        .place(&mut source("pw"), false)
        .expect("place should succeed");
    h.ring.push("pw".to_string());
    h.ring.push("other".to_string());

    let first = h.session.erase();
    let clipboard_after_first = h.clipboard.contents();
    let ring_after_first = h.ring.to_vec();

    let second = h.session.erase();

    assert!(first.clipboard_cleared);
    assert!(!second.clipboard_cleared);
    assert_eq!(second.history_removed, 0);
    assert!(!second.had_secret);
    assert_eq!(h.clipboard.contents(), clipboard_after_first);
    assert_eq!(h.ring.to_vec(), ring_after_first);
}

#[test]
fn test_erase_leaves_unrelated_clipboard_value() {
    let mut h = Harness::new();
    h.session
        .place(&mut source("pw"), false)
        .expect("place should succeed");

    h.clipboard.set_contents("meeting notes");
    let report = h.session.erase();

    assert!(!report.clipboard_cleared);
    assert!(report.had_secret);
    assert_eq!(h.clipboard.contents(), "meeting notes");
}

#[test]
fn test_history_scrub_removes_every_occurrence_in_order() {
    let ring = KillRing::from_entries(
        ["a", "pw", "b", "pw", "c", "pw", "pw2"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    let mut h = Harness::with_ring(ring);
    let n = h.ring.len();
    h.session
        .place(&mut source("pw"), false)
        .expect("place should succeed");

    let report = h.session.erase();

    assert_eq!(report.history_removed, 3);
    assert_eq!(h.ring.len(), n - 3);
    assert_eq!(h.ring.to_vec(), vec!["a", "b", "c", "pw2"]);
}

#[test]
fn test_second_place_erases_first_session() {
    let mut h = Harness::new();
    let first = h
        .session
        .place(&mut source("first-secret"), false)
        .expect("first place should succeed");
    h.ring.push("first-secret".to_string());

    let second = h
        .session
        .place(&mut source("second-secret"), false)
        .expect("second place should succeed");

    let previous = second.previous.expect("previous session should be erased");
    assert!(previous.clipboard_cleared);
    assert_eq!(previous.history_removed, 1);
    assert!(h.ring.is_empty());
    assert_eq!(h.clipboard.contents(), "second-secret");
    assert_eq!(h.session.armed_timer(), Some(second.timer));
    assert_eq!(h.session.scheduler().pending_count(), 1);
    assert!(h.session.scheduler().remaining(first.timer).is_none());
}

#[test]
fn test_manual_erase_cancels_pending_timer() {
    let mut h = Harness::new();
    h.session
        .place(&mut source("pw"), false)
        .expect("place should succeed");

    h.session.erase();

    assert!(h.session.armed_timer().is_none());
    assert_eq!(h.session.scheduler().pending_count(), 0);

    h.clipboard.set_contents("copied later");
    h.clock.advance(DEFAULT_CLIPBOARD_TIMEOUT * 2);
    assert!(h.session.poll().is_none());
    assert_eq!(h.clipboard.contents(), "copied later");
}

#[test]
fn test_unbounded_timeout_still_tracks_and_erases() {
    let h = Harness::new();
    let mut session = ClipboardSession::new(
        h.clipboard.clone(),
        h.ring.clone(),
        DeadlineScheduler::with_clock(h.clock.clone()),
    )
    .with_timeout(Duration::from_secs(u64::MAX));
    let mut secret = source("hunter2");

    session.place(&mut secret, false).expect("place");

    assert!(session.is_tracking());
    assert!(session.remaining().is_some());
    assert!(session.erase().clipboard_cleared);
    assert_eq!(h.clipboard.contents(), "");
}

#[test]
fn test_unavailable_clipboard_aborts_place() {
    let mut h = Harness::new();
    h.clipboard.set_unavailable(true);
    let mut secret = source("pw");

    let err = h.session.place(&mut secret, false).unwrap_err();

    assert!(matches!(
        err,
        veil_core::VeilError::ClipboardUnavailable(_)
    ));
    assert!(!h.session.is_tracking());
    assert_eq!(h.session.scheduler().pending_count(), 0);
    assert!(secret.contents().is_ok());
}
