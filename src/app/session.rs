// src/app/session.rs
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::types::Session;

/// Well-known key the signed-in user is stored under.
pub const SESSION_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session store encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key-value file holding the signed-in session.
///
/// Subscribers get the current `Option<Session>` whenever it changes, whether
/// through this store or another process editing the file (see [`Self::reload`]).
pub struct SessionStore {
    path: PathBuf,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    /// Open the store and read whatever session is already on disk.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_session(&path);
        let (tx, _rx) = watch::channel(current);
        Self { path, tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Re-read from disk without notifying anyone.
    pub fn load(&self) -> Option<Session> {
        read_session(&self.path)
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut entries = read_entries(&self.path);
        entries.insert(SESSION_KEY.to_string(), serde_json::to_value(session)?);
        write_entries(&self.path, &entries)?;
        info!("saved session for {}", session.user.username);
        self.publish(Some(session.clone()));
        Ok(())
    }

    /// Sign out: drop the stored session, keep any other keys.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut entries = read_entries(&self.path);
        if entries.remove(SESSION_KEY).is_some() {
            write_entries(&self.path, &entries)?;
            info!("cleared stored session");
        }
        self.publish(None);
        Ok(())
    }

    /// Pick up a change made behind our back. Returns true if subscribers
    /// were notified.
    pub fn reload(&self) -> bool {
        let on_disk = read_session(&self.path);
        self.publish(on_disk)
    }

    fn publish(&self, next: Option<Session>) -> bool {
        self.tx.send_if_modified(|cur| {
            if *cur == next {
                false
            } else {
                *cur = next;
                true
            }
        })
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, Value> {
    let txt = match fs::read_to_string(path) {
        Ok(txt) => txt,
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                warn!("failed to read session store {}: {err}", path.display());
            }
            return BTreeMap::new();
        }
    };
    match serde_json::from_str::<BTreeMap<String, Value>>(&txt) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("session store {} is corrupt ({err}); ignoring it", path.display());
            BTreeMap::new()
        }
    }
}

fn read_session(path: &Path) -> Option<Session> {
    let entries = read_entries(path);
    let raw = entries.get(SESSION_KEY)?;
    match serde_json::from_value::<Session>(raw.clone()) {
        Ok(session) => Some(session),
        Err(err) => {
            warn!("stored session is unreadable ({err}); treating as signed out");
            None
        }
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, Value>) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let data = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    debug!("wrote session store {}", path.display());
    Ok(())
}
