use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::guard::DENIED_REDIRECT_DELAY;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const SESSION_FILE: &str = "session.json";
const RETURN_FILE: &str = "return_to.json";

/// Client settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub config_dir: PathBuf,
    pub denied_redirect: Duration,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let denied_redirect = std::env::var("PRESSROOM_DENIED_REDIRECT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DENIED_REDIRECT_DELAY);

        Ok(Self {
            server_url: std::env::var("PRESSROOM_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
            config_dir: get_config_dir()?,
            denied_redirect,
        })
    }

    fn session_file(&self) -> PathBuf {
        self.config_dir.join(SESSION_FILE)
    }

    pub fn load_session(&self) -> anyhow::Result<Option<Session>> {
        let path = self.session_file();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let session = serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(session))
    }

    /// Written owner-only; the file holds a bearer token.
    pub fn save_session(&self, session: &Session) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(session)?;
        write_private(&self.session_file(), &content)
    }

    /// Remove the stored session. Returns whether one existed.
    pub fn clear_session(&self) -> anyhow::Result<bool> {
        let path = self.session_file();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        Ok(true)
    }

    fn return_file(&self) -> PathBuf {
        self.config_dir.join(RETURN_FILE)
    }

    /// Remember the view a signed-out visitor asked for.
    pub fn save_return_to(&self, path: &str) -> anyhow::Result<()> {
        let pending = PendingReturn {
            server_url: self.server_url.clone(),
            path: path.to_string(),
        };
        write_private(&self.return_file(), &serde_json::to_string_pretty(&pending)?)
    }

    /// Consume the remembered view. A view saved against another server is
    /// discarded.
    pub fn take_return_to(&self) -> anyhow::Result<Option<String>> {
        let path = self.return_file();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        let pending: PendingReturn =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok((pending.server_url == self.server_url).then_some(pending.path))
    }

    /// Token for the configured server, if the stored session belongs to it.
    pub fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(self
            .load_session()?
            .filter(|session| session.server_url == self.server_url)
            .map(|session| session.token))
    }
}

/// What `auth login` leaves behind for later commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub server_url: String,
    pub token: String,
    pub email: String,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn new(server_url: String, token: String, email: String) -> Self {
        Self {
            server_url,
            token,
            email,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingReturn {
    server_url: String,
    path: String,
}

fn write_private(path: &Path, content: &str) -> anyhow::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).with_context(|| format!("writing {}", path.display()))?;
    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting {}", path.display()))?;
    }
    file.write_all(content.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PRESSROOM_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("pressroom").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> ClientConfig {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            config_dir: dir.path().to_path_buf(),
            denied_redirect: DENIED_REDIRECT_DELAY,
        }
    }

    #[test]
    fn session_round_trips_through_the_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        assert!(config.load_session().unwrap().is_none());

        let session = Session::new(DEFAULT_SERVER_URL.into(), "tok".into(), "ada@example.com".into());
        config.save_session(&session).unwrap();
        assert_eq!(config.load_session().unwrap(), Some(session));
        assert_eq!(config.token().unwrap().as_deref(), Some("tok"));

        assert!(config.clear_session().unwrap());
        assert!(!config.clear_session().unwrap());
        assert!(config.token().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let path = dir.path().join(SESSION_FILE);
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let session = Session::new(DEFAULT_SERVER_URL.into(), "tok".into(), "ada@example.com".into());
        config.save_session(&session).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(config.load_session().unwrap(), Some(session));
    }

    #[test]
    fn return_to_is_taken_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        assert!(config.take_return_to().unwrap().is_none());

        config.save_return_to("/manage-posts").unwrap();
        assert_eq!(config.take_return_to().unwrap().as_deref(), Some("/manage-posts"));
        assert!(config.take_return_to().unwrap().is_none());
    }

    #[test]
    fn return_to_for_another_server_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = ClientConfig {
            server_url: "http://elsewhere:5000".into(),
            ..config_in(&dir)
        };
        elsewhere.save_return_to("/manage-users").unwrap();

        let config = config_in(&dir);
        assert!(config.take_return_to().unwrap().is_none());
        assert!(!dir.path().join(RETURN_FILE).exists());
    }

    #[test]
    fn tokens_for_another_server_are_not_used() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let session = Session::new("http://elsewhere:5000".into(), "tok".into(), "ada@example.com".into());
        config.save_session(&session).unwrap();
        assert!(config.token().unwrap().is_none());
    }
}
