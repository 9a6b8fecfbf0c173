use std::sync::Arc;

use super::common::{engine, shown};
use crate::notepad::Notepad;
use crate::settings::Settings;
use crate::store::{MemoryStore, SessionStore};

fn notepad() -> Notepad {
    Notepad::with_engine(engine(), Settings::default())
}

#[test]
fn every_edit_recomputes() {
    let mut pad = notepad();
    assert_eq!(shown(pad.set_text("2+2\nans*2")), ["4", "8"]);
    assert_eq!(shown(pad.edit_line(0, "3+3").unwrap()), ["6", "12"]);
    assert_eq!(shown(pad.insert_line(1, "ans + 1").unwrap()), ["6", "7", "14"]);
    assert_eq!(
        shown(pad.remove_line(0).unwrap()),
        ["error: Undefined symbol ans", "error: Undefined symbol ans"]
    );
    assert!(pad.edit_line(10, "x").is_none());
    assert!(pad.remove_line(10).is_none());
}

#[test]
fn settings_changes_recompute() {
    let mut pad = notepad();
    pad.set_text("1234.5678");
    assert_eq!(pad.results()[0].display(), Some("1,234.5678"));
    let settings = Settings {
        precision: 2,
        thou_sep: false,
        ..Settings::default()
    };
    assert_eq!(pad.set_settings(settings)[0].display(), Some("1234.57"));
}

#[test]
fn copy_all_pairs_lines_with_answers() {
    let mut pad = notepad();
    pad.set_text("1000 + 1000\n\n// note\nfoo\nans * 2");
    assert_eq!(
        pad.copy_all(),
        "1000 + 1000 = 2000\n\n// note\nfoo\nans * 2 = 4000"
    );
}

#[test]
fn restores_buffer_and_history() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut pad =
            Notepad::with_engine(engine().with_store(store.clone()), Settings::default());
        pad.set_text("5\n*2");
    }

    let mut pad = notepad();
    assert!(pad.restore_from(&*store).unwrap());
    assert_eq!(pad.document().lines(), ["5", "*2"]);
    assert_eq!(shown(pad.results()), ["5", "10"]);
    assert_eq!(pad.engine().history(), ["5\n*2"]);

    let empty = MemoryStore::new();
    assert!(!notepad().restore_from(&empty).unwrap());
    assert_eq!(empty.restore().unwrap(), None);
}

#[test]
fn opening_a_store_backed_notepad_keeps_the_saved_session() {
    let store = Arc::new(MemoryStore::new());
    Notepad::with_engine(engine().with_store(store.clone()), Settings::default())
        .set_text("5\n*2");

    let mut pad = Notepad::with_engine(engine().with_store(store.clone()), Settings::default());
    assert_eq!(
        store.restore().unwrap().map(|s| s.buffer_text),
        Some("5\n*2".to_string())
    );
    assert!(pad.restore_from(&*store).unwrap());
    assert_eq!(pad.document().lines(), ["5", "*2"]);
    assert_eq!(shown(pad.results()), ["5", "10"]);
}

#[test]
fn resume_reads_the_engine_store() {
    let store = Arc::new(MemoryStore::new());
    Notepad::with_engine(engine().with_store(store.clone()), Settings::default())
        .set_text("1200\n+ 300");

    let mut pad =
        Notepad::resume(engine().with_store(store.clone()), Settings::default()).unwrap();
    assert_eq!(shown(pad.results()), ["1,200", "1,500"]);
    assert_eq!(pad.engine().history(), ["1200\n+ 300"]);

    pad.set_text("7");
    let saved = store.restore().unwrap().unwrap();
    assert_eq!(saved.history, ["1200\n+ 300", "7"]);

    let fresh = Notepad::resume(engine(), Settings::default()).unwrap();
    assert_eq!(fresh.document().lines(), [""]);
    assert_eq!(fresh.results(), [crate::result::LineResult::Empty]);
}
