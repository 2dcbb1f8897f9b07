use crate::common::StoredCredentials;
use crate::error::AuthError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Device-local persistence for the four session fields.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<StoredCredentials, AuthError>;
    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// JSON file under the user cache directory, readable by the owner only.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new() -> Result<Self, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("slidenote");
        Self::at(cache_dir.join("credentials.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    AuthError::CredentialStorage(format!(
                        "Failed to create credential directory: {}",
                        e
                    ))
                })?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<StoredCredentials, AuthError> {
        if !self.path.exists() {
            return Ok(StoredCredentials::default());
        }

        let json = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::CredentialStorage(format!("Failed to read credentials: {}", e))
        })?;

        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(credentials)?;

        fs::write(&self.path, json).map_err(|e| {
            AuthError::CredentialStorage(format!("Failed to save credentials: {}", e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)
                .map_err(|e| {
                    AuthError::CredentialStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(|e| {
                AuthError::CredentialStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                AuthError::CredentialStorage(format!("Failed to delete credentials: {}", e))
            })?;
        }
        Ok(())
    }
}

/// Process-local store, used by tests and by callers that never persist.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credentials: StoredCredentials) -> Self {
        Self {
            inner: Mutex::new(credentials),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoredCredentials>, AuthError> {
        self.inner
            .lock()
            .map_err(|_| AuthError::CredentialStorage("credential store poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<StoredCredentials, AuthError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError> {
        *self.lock()? = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.lock()? = StoredCredentials::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("slidenote-test-{}", uuid::Uuid::new_v4()))
            .join("credentials.json")
    }

    fn full() -> StoredCredentials {
        StoredCredentials {
            access_token: Some("a".into()),
            refresh_token: Some("r".into()),
            email: Some("e@x.io".into()),
            user_id: Some("9".into()),
        }
    }

    #[test]
    fn file_store_round_trip_and_clear() {
        let store = FileCredentialStore::at(scratch_path()).unwrap();
        assert!(store.load().unwrap().is_empty());

        store.save(&full()).unwrap();
        assert_eq!(store.load().unwrap(), full());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        // clearing twice is fine
        store.clear().unwrap();

        if let Some(dir) = store.path().parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let store = FileCredentialStore::at(scratch_path()).unwrap();
        store.save(&full()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        if let Some(dir) = store.path().parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn file_store_reads_partial_tuples() {
        let store = FileCredentialStore::at(scratch_path()).unwrap();
        fs::write(store.path(), r#"{"access_token": "a", "email": "e@x.io"}"#).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("a"));
        assert!(loaded.refresh_token.is_none());
        assert!(loaded.into_session().is_none());

        if let Some(dir) = store.path().parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn memory_store_clear() {
        let store = MemoryCredentialStore::with(full());
        assert_eq!(store.load().unwrap(), full());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
