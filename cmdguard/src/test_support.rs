//! Test-only helpers for building guards, arguments and config files.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::core::guard::{GuardHandle, GuardResult};
use crate::core::value::ParsedArguments;

/// Guard returning `result` and counting how often it ran.
pub fn counting_guard(result: GuardResult) -> (GuardHandle, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let guard = GuardHandle::from_fn(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(result)
    });
    (guard, counter)
}

/// Shared log that [`recording_guard`] appends labels to.
#[derive(Debug, Clone, Default)]
pub struct GuardLog(Arc<Mutex<Vec<String>>>);

impl GuardLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: &str) {
        self.0
            .lock()
            .expect("guard log lock")
            .push(label.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("guard log lock").clone()
    }
}

/// Guard that records `label` in `log` and returns `result`.
pub fn recording_guard(log: &GuardLog, label: &str, result: GuardResult) -> GuardHandle {
    let log = log.clone();
    let label = label.to_string();
    GuardHandle::from_fn(move |_| {
        log.push(&label);
        Ok(result)
    })
}

/// Parsed arguments holding string values.
pub fn string_args(pairs: &[(&str, &str)]) -> ParsedArguments {
    let mut args = ParsedArguments::new();
    for (name, value) in pairs {
        args.insert(*name, value.to_string())
            .expect("unique argument names");
    }
    args
}

/// Write `contents` to `name` inside a fresh temp dir.
pub fn temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write temp file");
    (dir, path)
}
