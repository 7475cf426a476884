use crate::cache_key::credential_fingerprint;
use crate::models::Session;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::types::Credentials;
use shared::{Result, ScraperError};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// CACHE ENTRY STRUCTURES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Session,
    /// Epoch milliseconds after which the entry is dead.
    pub expiration: i64,
}

impl CacheEntry {
    fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expiration
    }
}

// ============================================================================
// SESSION CACHE TRAIT
// ============================================================================

/// Lookup/store of authenticated sessions keyed by credentials.
pub trait SessionCache: Send + Sync {
    fn get(&self, credentials: &Credentials) -> Result<Option<Session>>;
    fn set(&self, credentials: &Credentials, session: Session, ttl: Duration) -> Result<CacheEntry>;
}

// ============================================================================
// FILE-BACKED CREDENTIAL CACHE
// ============================================================================

/// Session cache persisted as a flat JSON object `{fingerprint: CacheEntry}`.
///
/// Every mutation rewrites the whole file before returning. Expired entries
/// are dropped lazily, on the first read that finds them.
pub struct CredentialCache {
    path: PathBuf,
    store: Mutex<HashMap<String, CacheEntry>>,
}

impl CredentialCache {
    /// Load the table from `path`. A missing or unreadable file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(table) => {
                    info!("🗄️ Loaded {} cached session(s) from {}", table.len(), path.display());
                    table
                }
                Err(e) => {
                    warn!("Error while loading cache {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => {
                warn!("Error while loading cache {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path,
            store: Mutex::new(store),
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_at(&self, credentials: &Credentials, now_ms: i64) -> Result<Option<Session>> {
        let key = credential_fingerprint(credentials);
        let mut store = self.store.lock();

        match store.get(&key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired_at(now_ms) => return Ok(Some(entry.data.clone())),
            Some(_) => {}
        }

        store.remove(&key);
        debug!("Evicted expired session for {}", credentials.username);
        self.persist(&store)?;
        Ok(None)
    }

    pub fn set_at(
        &self,
        credentials: &Credentials,
        session: Session,
        ttl: Duration,
        now_ms: i64,
    ) -> Result<CacheEntry> {
        let key = credential_fingerprint(credentials);
        let ttl_ms = i64::try_from(ttl.as_millis())
            .map_err(|_| ScraperError::cache(format!("TTL out of range: {:?}", ttl)))?;
        let entry = CacheEntry {
            data: session,
            expiration: now_ms.saturating_add(ttl_ms),
        };

        let mut store = self.store.lock();
        store.insert(key, entry.clone());
        self.persist(&store)?;
        Ok(entry)
    }

    fn persist(&self, store: &HashMap<String, CacheEntry>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(store)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serialized).map_err(|e| {
            ScraperError::cache(format!("Error while saving cache {}: {}", self.path.display(), e))
        })?;
        debug!("💾 Cache table ({} entries) written to {}", store.len(), self.path.display());
        Ok(())
    }
}

impl SessionCache for CredentialCache {
    fn get(&self, credentials: &Credentials) -> Result<Option<Session>> {
        self.get_at(credentials, Utc::now().timestamp_millis())
    }

    fn set(&self, credentials: &Credentials, session: Session, ttl: Duration) -> Result<CacheEntry> {
        self.set_at(credentials, session, ttl, Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("https://www.fieldglass.net", "supplier", "hunter22")
    }

    fn session(expires_at: i64) -> Session {
        Session {
            cookie: "JSESSIONID=abc; ".into(),
            csrf_token: "tok".into(),
            client_id: "cid".into(),
            expires_at,
            root_url: "https://www.fieldglass.net".into(),
            username: "supplier".into(),
            date_format: "MM/DD/YYYY".into(),
        }
    }

    #[test]
    fn returns_session_until_ttl_elapses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CredentialCache::load(dir.path().join("cache.json"));
        let ttl = Duration::from_secs(300);

        let entry = cache.set_at(&creds(), session(300_000), ttl, 0).unwrap();
        assert_eq!(entry.expiration, 300_000);

        assert_eq!(cache.get_at(&creds(), 0).unwrap(), Some(session(300_000)));
        assert!(cache.get_at(&creds(), 299_999).unwrap().is_some());
        // boundary counts as expired
        assert!(cache.get_at(&creds(), 300_000).unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_is_purged_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = CredentialCache::load(&path);
        cache.set_at(&creds(), session(10), Duration::from_millis(10), 0).unwrap();

        assert!(cache.get_at(&creds(), 11).unwrap().is_none());

        let on_disk: HashMap<String, CacheEntry> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }

    #[test]
    fn set_is_written_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let cache = CredentialCache::load(&path);
        let far_future = Utc::now().timestamp_millis() + 3_600_000;
        cache
            .set(&creds(), session(far_future), Duration::from_secs(3600))
            .unwrap();

        let reloaded = CredentialCache::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&creds()).unwrap(), Some(session(far_future)));

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let key = credential_fingerprint(&creds());
        assert_eq!(raw[key.as_str()]["data"]["sgjy"], "tok");
        assert!(raw[key.as_str()]["expiration"].is_i64());
        assert!(!fs::read_to_string(&path).unwrap().contains("hunter22"));
    }

    #[test]
    fn different_credentials_do_not_share_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CredentialCache::load(dir.path().join("cache.json"));
        cache.set_at(&creds(), session(1_000), Duration::from_secs(1), 0).unwrap();

        let other = Credentials::new("https://www.fieldglass.net", "supplier", "changed");
        assert!(cache.get_at(&other, 0).unwrap().is_none());
        assert!(cache.get_at(&creds(), 0).unwrap().is_some());
    }

    #[test]
    fn corrupt_file_loads_as_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = CredentialCache::load(&path);
        assert!(cache.is_empty());

        cache.set_at(&creds(), session(1_000), Duration::from_secs(1), 0).unwrap();
        assert_eq!(CredentialCache::load(&path).len(), 1);
    }
}
