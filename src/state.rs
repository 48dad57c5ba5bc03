use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{Backend, LocalBackend, RemoteBackend};
use crate::error::DeskError;
use crate::types::{BackendKind, Config, Session};

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "LEADDESK_CONFIG";

/// Application state shared by every page command
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn Backend>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Load config from disk and open the configured backend.
    pub fn new() -> Result<Self, DeskError> {
        let config = match load_config() {
            Ok(Some(config)) => config,
            Ok(None) => {
                log::info!("No config file found, using the local backend");
                Config::default()
            }
            Err(e) => return Err(e),
        };
        let sessions = SessionStore::new(session_path()?);
        Self::with_config(config, sessions)
    }

    pub fn with_config(config: Config, sessions: SessionStore) -> Result<Self, DeskError> {
        let backend = open_backend(&config)?;
        Ok(Self {
            config,
            backend,
            sessions,
        })
    }

    /// Build state around an existing backend (tests, embedding).
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>, sessions: SessionStore) -> Self {
        Self {
            config,
            backend,
            sessions,
        }
    }
}

fn open_backend(config: &Config) -> Result<Arc<dyn Backend>, DeskError> {
    match config.backend {
        BackendKind::Remote => {
            let url = config.supabase_url.as_deref().ok_or_else(|| {
                DeskError::ConfigurationError("supabaseUrl is required for the remote backend".into())
            })?;
            let key = config.anon_key.as_deref().ok_or_else(|| {
                DeskError::ConfigurationError("anonKey is required for the remote backend".into())
            })?;
            log::debug!("Using remote backend at {}", url);
            Ok(Arc::new(RemoteBackend::new(
                url,
                key,
                config.request_timeout_secs,
            )?))
        }
        BackendKind::Local => {
            let path = config.local_db_path.as_deref().map(expand_home);
            log::debug!("Using local backend at {:?}", path);
            Ok(Arc::new(LocalBackend::open(path)?))
        }
    }
}

/// Expand a leading `~/` against the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Get the state directory (~/.leaddesk)
fn state_dir() -> Result<PathBuf, DeskError> {
    let home = dirs::home_dir()
        .ok_or_else(|| DeskError::ConfigurationError("Could not find home directory".into()))?;
    Ok(home.join(".leaddesk"))
}

/// Get the canonical config file path (~/.leaddesk/config.json), honouring
/// `LEADDESK_CONFIG`.
pub fn config_path() -> Result<PathBuf, DeskError> {
    if let Ok(custom) = std::env::var(CONFIG_ENV) {
        if !custom.trim().is_empty() {
            return Ok(PathBuf::from(custom));
        }
    }
    Ok(state_dir()?.join("config.json"))
}

/// Get the persisted session path (~/.leaddesk/session.json)
pub fn session_path() -> Result<PathBuf, DeskError> {
    Ok(state_dir()?.join("session.json"))
}

/// Load configuration from the config path. `Ok(None)` when no file exists.
pub fn load_config() -> Result<Option<Config>, DeskError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Option<Config>, DeskError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        DeskError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let config: Config = serde_json::from_str(&content).map_err(|e| {
        DeskError::ConfigurationError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    if config.backend == BackendKind::Remote
        && (config.supabase_url.is_none() || config.anon_key.is_none())
    {
        return Err(DeskError::ConfigurationError(
            "Remote backend needs both supabaseUrl and anonKey".into(),
        ));
    }

    Ok(Some(config))
}

/// The signed-in session, persisted between invocations.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, DeskError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                log::warn!("Discarding unreadable session file: {}", e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), DeskError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
                }
            }
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;

        // Holds live access and refresh tokens.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), DeskError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthUser;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_config_from(&dir.path().join("config.json")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_remote_config_requires_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "backend": "remote", "supabaseUrl": "https://x.supabase.co" }"#)
            .expect("write");
        assert!(matches!(
            load_config_from(&path),
            Err(DeskError::ConfigurationError(_))
        ));

        fs::write(
            &path,
            r#"{ "backend": "remote", "supabaseUrl": "https://x.supabase.co", "anonKey": "k", "requestTimeoutSecs": 5 }"#,
        )
        .expect("write");
        let config = load_config_from(&path).expect("load").expect("present");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_local_backend_opens_configured_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("desk.db");
        let config = Config {
            local_db_path: Some(db_path.to_string_lossy().into_owned()),
            ..Config::default()
        };
        let state = AppState::with_config(config, SessionStore::new(dir.path().join("s.json")))
            .expect("state");
        assert!(db_path.exists());
        assert_eq!(state.config.backend, BackendKind::Local);
    }

    #[test]
    fn test_session_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().expect("load").is_none());

        let session = Session {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at: 1_900_000_000,
            user: AuthUser {
                id: "u1".into(),
                email: Some("amy@company.com".into()),
                email_confirmed_at: None,
            },
        };
        store.save(&session).expect("save");
        assert_eq!(store.load().expect("load"), Some(session));

        store.clear().expect("clear");
        assert!(store.load().expect("load").is_none());
        store.clear().expect("clear twice");
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let state_dir = dir.path().join(".leaddesk");
        let store = SessionStore::new(state_dir.join("session.json"));
        let session = Session {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at: 1_900_000_000,
            user: AuthUser {
                id: "u1".into(),
                email: None,
                email_confirmed_at: None,
            },
        };
        store.save(&session).expect("save");

        let file_mode = fs::metadata(store.path()).expect("file").permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        let dir_mode = fs::metadata(&state_dir).expect("dir").permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_corrupt_session_file_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").expect("write");
        assert!(SessionStore::new(path).load().expect("load").is_none());
    }
}
