//! Authentication session shared by every view.
//!
//! The session owns the current bearer token. Writes go through a
//! [`TokenStore`] and are announced on a broadcast channel so open views can
//! react without polling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    /// The backend rejected the token (HTTP 401).
    Invalidated,
}

/// Plain key-value persistence for the session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.slot.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.slot.lock().map_err(poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> io::Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> io::Result<()> {
        (**self).clear()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "token store lock poisoned")
}

/// Stores the token as `{"token": "..."}` in a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) if !stored.token.is_empty() => Ok(Some(stored.token)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string(&StoredSession {
            token: token.to_string(),
        })
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, body)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Application-wide session context. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    token: RwLock<Option<String>>,
    events: broadcast::Sender<AuthEvent>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    /// Creates a session and reads any token already in the store.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        let initial = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored session token: {}", e);
                None
            }
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                token: RwLock::new(initial),
                events,
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    /// Session for a fresh login. Without `remember`, the token lives in
    /// memory only and whatever `store` held from an earlier login is cleared.
    pub fn for_login(store: impl TokenStore + 'static, remember: bool) -> Self {
        if remember {
            return Self::new(store);
        }
        if let Err(e) = store.clear() {
            warn!("Failed to clear stored session token: {}", e);
        }
        Self::in_memory()
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .map(|t| t.is_some())
            .unwrap_or(false)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(e) = self.inner.store.save(&token) {
            warn!("Failed to persist session token: {}", e);
        }
        self.set(Some(token));
        info!("Signed in");
        self.publish(AuthEvent::SignedIn);
    }

    pub fn sign_out(&self) {
        if self.clear() {
            info!("Signed out");
            self.publish(AuthEvent::SignedOut);
        }
    }

    /// Drops the token after the backend answered 401.
    pub fn invalidate(&self) {
        if self.clear() {
            warn!("Session token rejected by server, cleared");
            self.publish(AuthEvent::Invalidated);
        }
    }

    /// Re-reads the store, picking up writes made by another process.
    /// Returns the event published, if the token changed.
    pub fn refresh_from_store(&self) -> Option<AuthEvent> {
        let stored = match self.inner.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to re-read session token: {}", e);
                return None;
            }
        };
        if stored == self.token() {
            return None;
        }
        let event = if stored.is_some() {
            AuthEvent::SignedIn
        } else {
            AuthEvent::SignedOut
        };
        self.set(stored);
        self.publish(event);
        Some(event)
    }

    fn clear(&self) -> bool {
        if let Err(e) = self.inner.store.clear() {
            warn!("Failed to clear stored session token: {}", e);
        }
        let had_token = self.is_authenticated();
        self.set(None);
        had_token
    }

    fn set(&self, token: Option<String>) {
        match self.inner.token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers is fine: nothing is listening yet.
        if self.inner.events.send(event).is_err() {
            debug!("No subscribers for {:?}", event);
        }
    }
}
