use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::Error;

/// Storage keys shared by both scopes.
pub mod keys {
    /// Access credential (short-lived bearer token).
    pub const TOKEN: &str = "token";
    /// Refresh credential (used solely to mint a new access credential).
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// JSON-serialized identity snapshot.
    pub const USER: &str = "user";
    /// "Remember me" flag; authoritative only in the durable scope.
    pub const REMEMBER_ME: &str = "rememberMe";
}

const ALL_KEYS: [&str; 4] = [keys::TOKEN, keys::REFRESH_TOKEN, keys::USER, keys::REMEMBER_ME];

/// One client-side persistence area for session material.
///
/// Writes are best-effort: implementations must not fail from the caller's
/// perspective (a durable backend that cannot write logs and carries on),
/// mirroring web-storage semantics. Logout in particular must never fail.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory scope: survives for the lifetime of the process only.
///
/// The per-run analogue of per-tab browser storage; also useful in tests.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().expect("storage lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.map.lock().expect("storage lock poisoned").remove(key);
    }
}

/// Durable scope backed by a JSON file; survives restarts.
pub struct FileStorage {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) a file-backed scope at `path`.
    ///
    /// A missing or unparseable file yields an empty scope rather than an
    /// error: stale session material is recoverable state, not a fault.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read credential store {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    fn persist(&self, map: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(map) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "credential store serialization failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "credential store write failed");
        }
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().expect("storage lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.map.lock().expect("storage lock poisoned");
        map.insert(key.to_owned(), value.to_owned());
        self.persist(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.map.lock().expect("storage lock poisoned");
        if map.remove(key).is_some() {
            self.persist(&map);
        }
    }
}

/// The two storage scopes holding session material, with the precedence and
/// fallback rules the session restore path relies on.
///
/// Invariant: at most one scope holds live credentials at a time — storing a
/// login clears the other scope first.
#[derive(Clone)]
pub struct StorageScopes {
    durable: Arc<dyn TokenStorage>,
    per_run: Arc<dyn TokenStorage>,
}

impl StorageScopes {
    /// Pair a custom durable scope with a custom per-run scope.
    #[must_use]
    pub fn new(durable: Arc<dyn TokenStorage>, per_run: Arc<dyn TokenStorage>) -> Self {
        Self { durable, per_run }
    }

    /// Both scopes in memory; nothing survives the process. For tests and
    /// embedders that manage persistence themselves.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// File-backed durable scope at `path`, in-memory per-run scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self::new(
            Arc::new(FileStorage::open(path)?),
            Arc::new(MemoryStorage::new()),
        ))
    }

    /// Whether the durable scope claims authority via the "remember me" flag.
    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.durable
            .get(keys::REMEMBER_ME)
            .is_some_and(|v| v == "true")
    }

    /// The scope selected by the "remember me" flag.
    #[must_use]
    pub fn active(&self) -> &dyn TokenStorage {
        if self.remember_me() {
            self.durable.as_ref()
        } else {
            self.per_run.as_ref()
        }
    }

    /// Durable scope, regardless of the flag.
    #[must_use]
    pub fn durable(&self) -> &dyn TokenStorage {
        self.durable.as_ref()
    }

    /// Per-run scope, regardless of the flag.
    #[must_use]
    pub fn per_run(&self) -> &dyn TokenStorage {
        self.per_run.as_ref()
    }

    /// Current access credential: durable scope first, then per-run.
    ///
    /// The two scopes can be populated independently, so the raw value is
    /// taken from wherever it lives even if the flag disagrees.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.durable
            .get(keys::TOKEN)
            .or_else(|| self.per_run.get(keys::TOKEN))
    }

    /// Current refresh credential: durable scope first, then per-run.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.durable
            .get(keys::REFRESH_TOKEN)
            .or_else(|| self.per_run.get(keys::REFRESH_TOKEN))
    }

    /// Read `key` the way restore does: active scope first, then the durable
    /// scope as a last resort for raw values left behind by an older login.
    #[must_use]
    pub fn restore_value(&self, key: &str) -> Option<String> {
        self.active()
            .get(key)
            .or_else(|| self.durable.get(key))
    }

    /// Persist a fresh login into the scope selected by `remember`, clearing
    /// the other scope so no stale duplicate session remains.
    pub fn store_login(
        &self,
        remember: bool,
        token: &str,
        refresh_token: Option<&str>,
        snapshot_json: &str,
    ) {
        let (chosen, other) = if remember {
            (self.durable.as_ref(), self.per_run.as_ref())
        } else {
            (self.per_run.as_ref(), self.durable.as_ref())
        };

        for key in [keys::TOKEN, keys::REFRESH_TOKEN, keys::USER] {
            other.remove(key);
        }

        if remember {
            self.durable.set(keys::REMEMBER_ME, "true");
        } else {
            self.durable.remove(keys::REMEMBER_ME);
            self.per_run.set(keys::REMEMBER_ME, "false");
        }

        chosen.set(keys::TOKEN, token);
        if let Some(rt) = refresh_token {
            chosen.set(keys::REFRESH_TOKEN, rt);
        }
        chosen.set(keys::USER, snapshot_json);
    }

    /// Persist credentials minted by a refresh into the active scope.
    /// A rotated refresh credential replaces the old one; absent rotation
    /// keeps the existing value untouched.
    pub fn store_refreshed(&self, token: &str, refresh_token: Option<&str>) {
        let scope = self.active();
        scope.set(keys::TOKEN, token);
        if let Some(rt) = refresh_token {
            scope.set(keys::REFRESH_TOKEN, rt);
        }
    }

    /// Wipe all session keys from both scopes.
    pub fn clear_all(&self) {
        for key in ALL_KEYS {
            self.durable.remove(key);
            self.per_run.remove(key);
        }
    }
}
