//! Persistence E2E Tests
//!
//! Saves made during an editing session must load back as the seed of the
//! next one.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test -p lightseg-runtime --test persistence_e2e
//! ```
//!
//! # Invariants
//!
//! 1. **Restart integrity**: the seed read after a restart equals the last save
//! 2. **Last line wins**: earlier saves in the same file are ignored
//! 3. **Fail fast**: corrupt or non-canonical seed files are rejected
//! 4. **Truncation**: a new saver starts a fresh file

#![cfg(test)]

use std::fs;

use lightseg_core::{Action, Interval, IntervalSet};
use lightseg_runtime::{
    DispatchOutcome, Dispatcher, FileSaver, LocalSink, PersistError, RequestThrottle, Session,
    SessionConfig, read_seed,
};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

fn log_jsonl(event: &str, case: &str, passed: bool, details: &str) {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    eprintln!(
        r#"{{"event":"{event}","case":"{case}","passed":{passed},"details":"{details}","timestamp":{timestamp}}}"#
    );
}

fn press(session: &mut Session, dispatcher: &mut Dispatcher, actions: &[Action]) {
    for &action in actions {
        if let Some(out) = session.apply(action) {
            dispatcher.dispatch(out).unwrap();
        }
    }
}

// ============================================================================
// 1. Restart Cycle
// ============================================================================

#[test]
fn saved_session_restores_after_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lights.jsonl");
    let config = SessionConfig::new(0, 50);

    let before = {
        let saver = FileSaver::create(&path).unwrap();
        let sink = LocalSink::new(None, Box::new(saver));
        let mut dispatcher = Dispatcher::new(RequestThrottle::default(), Box::new(sink));
        let mut session = Session::new(config, None).unwrap();

        // Light 0..=2, skip 3..=4, light 5.
        press(
            &mut session,
            &mut dispatcher,
            &[
                Action::CycleMode,
                Action::Up,
                Action::Up,
                Action::Up,
                Action::CycleMode,
                Action::Up,
                Action::Up,
                Action::CycleMode,
                Action::CycleMode,
                Action::CycleMode,
                Action::Up,
            ],
        );
        assert_eq!(session.intervals().to_string(), "0-2, 5");
        assert_eq!(
            dispatcher.dispatch(session.save()).unwrap(),
            DispatchOutcome::Sent
        );
        session.intervals().clone()
    };

    let seed = read_seed(&path).unwrap();
    let passed = seed == before;
    log_jsonl("restart", "saved_session_restores", passed, &seed.to_string());
    assert!(passed);

    let restored = Session::new(config, Some(seed)).unwrap();
    assert!(restored.is_on());
    assert_eq!(restored.status_line(), "0 ON [NAV] 0-2, 5");
}

#[test]
fn last_save_wins() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lights.jsonl");
    let saver = FileSaver::create(&path).unwrap();
    let sink = LocalSink::new(None, Box::new(saver));
    let mut dispatcher = Dispatcher::new(RequestThrottle::default(), Box::new(sink));
    let mut session = Session::new(SessionConfig::new(0, 10), None).unwrap();

    dispatcher.dispatch(session.save()).unwrap();
    press(&mut session, &mut dispatcher, &[Action::CycleMode, Action::Up]);
    dispatcher.dispatch(session.save()).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "[]\n[{\"from\":0,\"to\":0}]\n");
    assert_eq!(read_seed(&path).unwrap().to_string(), "0");
}

// ============================================================================
// 2. Failure Modes
// ============================================================================

#[test]
fn corrupt_seed_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.jsonl");
    fs::write(&path, "[{\"from\":1,\"to\":2}]\nnot json\n").unwrap();

    let err = read_seed(&path).unwrap_err();
    log_jsonl("failure", "corrupt_seed", true, &err.to_string());
    assert!(matches!(err, PersistError::Serialization(_)));
}

#[test]
fn unmerged_seed_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("adjacent.jsonl");
    fs::write(&path, "[{\"from\":1,\"to\":2},{\"from\":3,\"to\":4}]\n").unwrap();

    assert!(matches!(read_seed(&path), Err(PersistError::Seed(_))));
}

#[test]
fn empty_seed_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.jsonl");
    fs::write(&path, "").unwrap();

    assert!(matches!(read_seed(&path), Err(PersistError::NoSeedLine)));
}

#[test]
fn missing_seed_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = read_seed(dir.path().join("absent.jsonl")).unwrap_err();
    assert!(matches!(err, PersistError::Io(_)));
}

// ============================================================================
// 3. Truncation
// ============================================================================

#[test]
fn new_saver_truncates_previous_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lights.jsonl");
    fs::write(&path, "[{\"from\":7,\"to\":9}]\n").unwrap();

    let seed = read_seed(&path).unwrap();
    assert_eq!(seed.intervals(), &[Interval::new(7, 9)]);

    let saver = FileSaver::create(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "");

    use lightseg_runtime::Saver;
    saver.save(seed.intervals()).unwrap();
    assert_eq!(read_seed(&path).unwrap(), seed);
    assert_ne!(seed, IntervalSet::new());
}
