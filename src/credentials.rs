// ABOUTME: File-backed store for the refresh token and client id
// ABOUTME: Atomic writes so a rotated token can never be half-persisted

use crate::{storage::write_atomic, Credential, Error, Result};
use std::fs;
use std::path::PathBuf;

/// Seam for the token manager: anything that can load and durably save the
/// credential set. Production code uses [`CredentialStore`].
pub trait CredentialPersistence {
    fn load(&self) -> Result<Credential>;
    fn save(&self, cred: &Credential) -> Result<()>;
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        CredentialStore { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CredentialPersistence for CredentialStore {
    fn load(&self) -> Result<Credential> {
        if !self.path.exists() {
            return Err(Error::MissingCredential(format!(
                "{} not found",
                self.path.display()
            )));
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::MissingCredential(format!("{}: {}", self.path.display(), e)))?;

        let cred: Credential = serde_json::from_str(&content).map_err(|e| {
            Error::MissingCredential(format!("{} is malformed: {}", self.path.display(), e))
        })?;

        if cred.refresh_token.is_empty() || cred.client_id.is_empty() {
            return Err(Error::MissingCredential(format!(
                "{} is missing refresh_token or client_id",
                self.path.display()
            )));
        }

        Ok(cred)
    }

    fn save(&self, cred: &Credential) -> Result<()> {
        let json = serde_json::to_string_pretty(cred)?;
        write_atomic(&self.path, json.as_bytes())
            .map_err(|e| Error::Persistence(format!("could not save {}: {}", self.path.display(), e)))
    }
}
