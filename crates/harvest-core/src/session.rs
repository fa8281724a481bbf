//! Ambient session credential.
//!
//! The progress client asks a `CredentialSource` for a bearer token each time
//! it opens a channel. `SessionFile` persists the token under the XDG state
//! dir (`~/.local/state/harvest/session.toml`); `harvest login` writes it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not encode session: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("could not resolve XDG state dir: {0}")]
    Xdg(String),
}

/// Source of the bearer token used to authenticate push channels.
pub trait CredentialSource: Send + Sync {
    /// Current token, or `None` when the user is not signed in.
    fn bearer_token(&self) -> Option<String>;
}

fn normalize(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Fixed token (tests, or a token passed on the command line).
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(normalize(Some(token.into())))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Token persisted in a small TOML file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/state/harvest/session.toml` (parent dir is created).
    pub fn open_default() -> Result<Self, SessionError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")
            .map_err(|e| SessionError::Xdg(e.to_string()))?;
        let path = xdg_dirs
            .place_state_file("session.toml")
            .map_err(|source| SessionError::Io {
                path: PathBuf::from("session.toml"),
                source,
            })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token; `Ok(None)` when there is no session file or it holds no token.
    pub fn load(&self) -> Result<Option<String>, SessionError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let parsed: SessionData = toml::from_str(&data).map_err(|source| SessionError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(normalize(parsed.token))
    }

    pub fn save(&self, token: &str) -> Result<(), SessionError> {
        let data = SessionData {
            token: normalize(Some(token.to_string())),
        };
        let body = toml::to_string_pretty(&data)?;
        self.write_private(body.as_bytes())
            .map_err(|source| SessionError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Remove the stored token. No-op if there is none.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_private(&self, body: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut opts = fs::OpenOptions::new();
        opts.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(&self.path)?;
        file.write_all(body)?;
        file.flush()
    }
}

impl CredentialSource for SessionFile {
    fn bearer_token(&self) -> Option<String> {
        match self.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "session unreadable; treating as signed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn static_credential_ignores_blank_tokens() {
        assert_eq!(StaticCredential::new("  ").bearer_token(), None);
        assert_eq!(StaticCredential::none().bearer_token(), None);
        assert_eq!(
            StaticCredential::new(" abc ").bearer_token().as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn missing_session_file_means_signed_out() {
        let dir = tempdir().unwrap();
        let session = SessionFile::at(dir.path().join("session.toml"));
        assert_eq!(session.load().unwrap(), None);
        assert_eq!(session.bearer_token(), None);
        session.clear().unwrap();
    }

    #[test]
    fn save_load_clear() {
        let dir = tempdir().unwrap();
        let session = SessionFile::at(dir.path().join("nested").join("session.toml"));
        session.save("tok-123").unwrap();
        assert_eq!(session.load().unwrap().as_deref(), Some("tok-123"));
        assert_eq!(session.bearer_token().as_deref(), Some("tok-123"));
        session.clear().unwrap();
        assert_eq!(session.bearer_token(), None);
    }

    #[test]
    fn corrupt_session_file_is_signed_out_not_a_crash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "token = [").unwrap();
        let session = SessionFile::at(&path);
        assert!(matches!(session.load(), Err(SessionError::Parse { .. })));
        assert_eq!(session.bearer_token(), None);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let session = SessionFile::at(dir.path().join("session.toml"));
        session.save("secret").unwrap();
        let mode = fs::metadata(session.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
