use chrono::NaiveDate;
use linecalc_engine::store::SavedResult;
use linecalc_engine::{Engine, FixedClock, JsonFileStore, Notepad, SessionStore, Settings};

fn clock() -> FixedClock {
    FixedClock::new(
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    )
}

#[test]
fn json_store_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let engine = Engine::new()
            .with_clock(clock())
            .with_store(JsonFileStore::new(&path));
        let mut pad = Notepad::with_engine(engine, Settings::default());
        pad.set_text("price = 20\nprice * 3\nfoo");
    }

    let store = JsonFileStore::new(&path);
    let snapshot = store.restore().unwrap().unwrap();
    assert_eq!(snapshot.buffer_text, "price = 20\nprice * 3\nfoo");
    assert_eq!(snapshot.history, ["price = 20\nprice * 3\nfoo"]);
    assert_eq!(
        snapshot.results[1],
        SavedResult::Value {
            display: "60".into(),
            copy_text: "60".into()
        }
    );
    assert!(matches!(snapshot.results[2], SavedResult::Error { line: 3, .. }));

    let mut pad = Notepad::with_engine(Engine::new().with_clock(clock()), Settings::default());
    assert!(pad.restore_from(&store).unwrap());
    assert_eq!(pad.results()[1].display(), Some("60"));
}

#[test]
fn missing_file_restores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("absent.json"));
    assert!(store.restore().unwrap().is_none());
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(JsonFileStore::new(&path).restore().is_err());
}

#[test]
fn consecutive_runs_accumulate_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    for text in ["1 + 1", "2 * 3", "1 + 1"] {
        let mut engine = Engine::new()
            .with_clock(clock())
            .with_store(JsonFileStore::new(&path));
        engine.resume().unwrap();
        engine.run_pass(text, &Settings::default());
    }

    let snapshot = JsonFileStore::new(&path).restore().unwrap().unwrap();
    assert_eq!(snapshot.buffer_text, "1 + 1");
    assert_eq!(snapshot.history, ["2 * 3", "1 + 1"]);
}

#[test]
fn resumed_notepad_reopens_the_saved_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let open = || {
        let engine = Engine::new()
            .with_clock(clock())
            .with_store(JsonFileStore::new(&path));
        Notepad::resume(engine, Settings::default()).unwrap()
    };

    open().set_text("rent = 1200\nrent / 4");
    let pad = open();
    assert_eq!(pad.document().lines(), ["rent = 1200", "rent / 4"]);
    assert_eq!(pad.results()[1].display(), Some("300"));
}
