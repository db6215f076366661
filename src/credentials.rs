//! # Credentials Module
//!
//! Loads secrets (bot token, recognition API key) once at startup, either from
//! a file or from an environment variable.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::MissingCredentialError;

/// Where a credential is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A file holding the secret on its first non-blank content
    File(PathBuf),
    /// A process environment variable
    Env(String),
}

impl CredentialSource {
    /// Select the source for credential `name`: `<name>_FILE` wins over `<name>`.
    pub fn from_lookup<F>(name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&format!("{name}_FILE")) {
            Some(path) if !path.trim().is_empty() => CredentialSource::File(PathBuf::from(path.trim())),
            _ => CredentialSource::Env(name.to_string()),
        }
    }

    /// Read the credential, trimming surrounding whitespace.
    pub fn load(&self) -> Result<Credential, MissingCredentialError> {
        self.load_with(|var| std::env::var(var).ok())
    }

    /// Same as [`CredentialSource::load`] but resolves variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<Credential, MissingCredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            CredentialSource::File(path) => {
                let content = fs::read_to_string(path).map_err(|source| {
                    MissingCredentialError::Unreadable {
                        path: path.clone(),
                        source,
                    }
                })?;
                let secret = content.trim();
                if secret.is_empty() {
                    return Err(MissingCredentialError::EmptyFile(path.clone()));
                }
                debug!(path = %path.display(), "Credential loaded from file");
                Ok(Credential(secret.to_string()))
            }
            CredentialSource::Env(var) => {
                let value = lookup(var).unwrap_or_default();
                let secret = value.trim();
                if secret.is_empty() {
                    return Err(MissingCredentialError::UnsetVariable(var.clone()));
                }
                debug!(variable = %var, "Credential loaded from environment");
                Ok(Credential(secret.to_string()))
            }
        }
    }
}

/// An opaque secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
