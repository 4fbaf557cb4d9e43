//! Durable session storage port.
//!
//! DESIGN
//! ======
//! The session survives restarts under two separate keys, `user` and
//! `token`, mirroring the browser-localStorage pair the API was designed
//! against. Writes are best-effort: a store that cannot persist degrades to
//! an in-memory session (and logs), it never fails an operation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub const KEY_USER: &str = "user";
pub const KEY_TOKEN: &str = "token";

/// Key/value persistence port for the session client.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Volatile store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(self.path(key), value))
        {
            tracing::warn!(error = %e, key, "session store write failed");
        }
    }

    fn remove(&self, key: &str) {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, key, "session store remove failed"),
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
