#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

use mastermind::shell::CommandRunner;
use session_store::SessionStore;
use tempfile::TempDir;

pub fn temp_store() -> (TempDir, SessionStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = SessionStore::new(dir.path(), Some("ttys001".to_string()));
    (dir, store)
}

/// Records commands instead of running them.
pub struct RunnerSpy {
    commands: Mutex<Vec<String>>,
    exit_code: i32,
}

impl RunnerSpy {
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            exit_code,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        lock_unpoisoned(&self.commands).clone()
    }
}

impl CommandRunner for RunnerSpy {
    fn run(&self, command: &str) -> i32 {
        lock_unpoisoned(&self.commands).push(command.to_string());
        self.exit_code
    }
}

pub fn output_text(out: Vec<u8>) -> String {
    String::from_utf8(out).expect("output should be UTF-8")
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
