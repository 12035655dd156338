// ABOUTME: OAuth refresh-token lifecycle against the WorkOS authenticate endpoint
// ABOUTME: Every exchange rotates the refresh token; the new one is saved before use

use crate::{
    credentials::{CredentialPersistence, CredentialStore},
    retry::{retry, thread_sleep, Backoff},
    AccessToken, Error, Result, TokenResponse,
};
use reqwest::blocking::Client;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

pub const WORKOS_AUTH_URL: &str = "https://api.workos.com/user_management/authenticate";

pub struct TokenManager<'a, S: CredentialPersistence = CredentialStore> {
    store: &'a S,
    client: Client,
    token_url: String,
    backoff: Backoff,
    /// Granola app session file to receive rotated tokens, so the desktop
    /// app is not logged out by the rotation. Best-effort.
    app_session_file: Option<PathBuf>,
}

impl<'a, S: CredentialPersistence> TokenManager<'a, S> {
    pub fn new(store: &'a S, token_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(TokenManager {
            store,
            client,
            token_url: token_url.unwrap_or_else(|| WORKOS_AUTH_URL.into()),
            backoff: Backoff::token_exchange(),
            app_session_file: None,
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_app_writeback(mut self, session_file: Option<PathBuf>) -> Self {
        self.app_session_file = session_file;
        self
    }

    /// Exchange the stored refresh token for an access token. The rotated
    /// refresh token is persisted before the access token is returned: a
    /// used-but-unsaved rotation would strand the deployment, since the old
    /// token is already invalid server-side.
    pub fn get_valid_access_token(&self) -> Result<AccessToken> {
        let mut cred = self.store.load()?;

        let response = retry(
            &self.backoff,
            |_| self.exchange_once(&cred.refresh_token, &cred.client_id),
            is_transient,
            thread_sleep,
        )
        .map_err(|e| {
            if is_transient(&e) {
                Error::TransientAuth {
                    attempts: self.backoff.max_attempts,
                    message: e.to_string(),
                }
            } else {
                e
            }
        })?;

        if let Some(new_refresh) = &response.refresh_token {
            cred.refresh_token = new_refresh.clone();
            self.store.save(&cred)?;
            self.writeback_to_app(&cred.refresh_token, &response.access_token);
        }

        Ok(AccessToken {
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(response.expires_in as i64),
            value: response.access_token,
        })
    }

    fn exchange_once(&self, refresh_token: &str, client_id: &str) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
                "client_id": client_id,
            }))
            .send()?;

        let status = response.status();
        if status.is_client_error() && status.as_u16() != 429 {
            let body = response.text().unwrap_or_default();
            return Err(Error::InvalidCredential(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(100).collect::<String>()
            )));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: self.token_url.clone(),
                status: status.as_u16(),
                message: body.chars().take(100).collect(),
            });
        }

        // A malformed 2xx body is not worth retrying
        let body = response.text()?;
        Ok(serde_json::from_str::<TokenResponse>(&body)?)
    }

    /// Write the rotated tokens back into the app's own session file.
    /// Missing file or unexpected shape is ignored: the sync still works,
    /// only the desktop app may need to log in again.
    fn writeback_to_app(&self, refresh_token: &str, access_token: &str) {
        let Some(path) = &self.app_session_file else {
            return;
        };
        if !path.exists() {
            return;
        }
        let _ = writeback_session_tokens(path, refresh_token, access_token);
    }
}

/// Update the `workos_tokens` blob inside a Granola session file, leaving
/// every other field intact. The session file is what `extract` recovers
/// from, so this write is atomic like every other persisted file.
pub fn writeback_session_tokens(
    path: &std::path::Path,
    refresh_token: &str,
    access_token: &str,
) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let mut session: serde_json::Value = serde_json::from_str(&content)?;

    let mut tokens: serde_json::Value = match session.get("workos_tokens") {
        Some(serde_json::Value::String(s)) => {
            serde_json::from_str(s).unwrap_or_else(|_| json!({}))
        }
        Some(v) => v.clone(),
        None => json!({}),
    };
    tokens["refresh_token"] = json!(refresh_token);
    tokens["access_token"] = json!(access_token);

    // The app stores this object as a JSON string inside the JSON.
    session["workos_tokens"] = json!(serde_json::to_string(&tokens)?);
    crate::storage::write_atomic(path, serde_json::to_string(&session)?.as_bytes())
}

fn is_transient(e: &Error) -> bool {
    match e {
        Error::Network(_) => true,
        Error::Api { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16) -> Error {
        Error::Api {
            endpoint: "auth".into(),
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_writeback_updates_tokens_and_preserves_other_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("supabase.json");
        std::fs::write(
            &path,
            r#"{
                "workos_tokens": "{\"access_token\": \"old_at\", \"refresh_token\": \"old_rt\", \"expires_in\": 3600}",
                "user_email": "alice@example.com"
            }"#,
        )
        .unwrap();

        writeback_session_tokens(&path, "new_rt", "new_at").unwrap();

        let session: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(session["user_email"], "alice@example.com");

        // Still a JSON string inside the JSON, as the app expects
        let tokens: serde_json::Value =
            serde_json::from_str(session["workos_tokens"].as_str().unwrap()).unwrap();
        assert_eq!(tokens["refresh_token"], "new_rt");
        assert_eq!(tokens["access_token"], "new_at");
        assert_eq!(tokens["expires_in"], 3600);
    }

    #[test]
    fn test_writeback_tolerates_missing_workos_tokens() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("supabase.json");
        std::fs::write(&path, r#"{"user_email": "alice@example.com"}"#).unwrap();

        writeback_session_tokens(&path, "rt", "at").unwrap();

        let session: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let tokens: serde_json::Value =
            serde_json::from_str(session["workos_tokens"].as_str().unwrap()).unwrap();
        assert_eq!(tokens["refresh_token"], "rt");
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&api_error(500)));
        assert!(is_transient(&api_error(503)));
        assert!(is_transient(&api_error(429)));
        assert!(!is_transient(&api_error(404)));
        assert!(!is_transient(&Error::InvalidCredential("401".into())));
        assert!(!is_transient(&Error::Persistence("disk".into())));
    }
}
