// ABOUTME: One-time credential extraction from the Granola app session file
// ABOUTME: macOS path first, then XDG; client id comes from the JWT iss claim

use crate::{
    credentials::{CredentialPersistence, CredentialStore},
    Credential, Error, Result,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Locations the Granola app keeps its session bundle, in precedence order.
pub fn session_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(home) = env::var("HOME") {
        candidates.push(
            PathBuf::from(&home).join("Library/Application Support/Granola/supabase.json"),
        );
    }

    let config_home = env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = env::var("HOME").unwrap_or_default();
        format!("{}/.config", home)
    });
    candidates.push(PathBuf::from(config_home).join("granola/supabase.json"));

    candidates
}

/// The first candidate that exists, for token write-back after rotation.
pub fn default_session_file() -> Option<PathBuf> {
    session_file_candidates().into_iter().find(|p| p.exists())
}

/// Pull the WorkOS token pair out of a session file. The `workos_tokens`
/// field is a JSON object stored as a string inside the JSON.
pub fn parse_session_file(path: &PathBuf) -> Result<Option<SessionTokens>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;

    let Some(workos_str) = json.get("workos_tokens").and_then(|v| v.as_str()) else {
        return Ok(None);
    };
    let workos: serde_json::Value = serde_json::from_str(workos_str)?;

    let access = workos.get("access_token").and_then(|v| v.as_str());
    let refresh = workos.get("refresh_token").and_then(|v| v.as_str());

    match (access, refresh) {
        (Some(access_token), Some(refresh_token)) => Ok(Some(SessionTokens {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        })),
        _ => Ok(None),
    }
}

/// Derive the OAuth client id from an access token: decode the JWT payload
/// segment and take the trailing path segment of the `iss` claim.
pub fn client_id_from_access_token(access_token: &str) -> Result<String> {
    let payload_b64 = access_token.split('.').nth(1).ok_or_else(|| {
        Error::MissingCredential("access token is not a JWT".into())
    })?;

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| {
        Error::MissingCredential(format!("could not decode JWT payload: {}", e))
    })?;

    let claims: serde_json::Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| Error::MissingCredential(format!("JWT payload is not JSON: {}", e)))?;

    let issuer = claims
        .get("iss")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MissingCredential("JWT has no iss claim".into()))?;

    let client_id = issuer
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::MissingCredential(format!("unusable iss claim: {}", issuer)))?;

    Ok(client_id.to_string())
}

/// Find the session file, derive `{refresh_token, client_id}`, and write the
/// credential file the sync runs from.
pub fn extract_credentials(store: &CredentialStore) -> Result<Credential> {
    for path in session_file_candidates() {
        if let Some(tokens) = parse_session_file(&path)? {
            let client_id = client_id_from_access_token(&tokens.access_token)?;
            let cred = Credential {
                refresh_token: tokens.refresh_token,
                client_id,
                extracted_at: chrono::Utc::now(),
            };
            store.save(&cred)?;
            println!("Extracted credentials from {}", path.display());
            return Ok(cred);
        }
    }

    Err(Error::MissingCredential(
        "no Granola session file found; is Granola installed and logged in?".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn test_parse_session_file_valid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("supabase.json");

        let content = r#"{
            "workos_tokens": "{\"access_token\": \"at1\", \"refresh_token\": \"rt1\"}"
        }"#;
        fs::write(&path, content).unwrap();

        let tokens = parse_session_file(&path).unwrap().unwrap();
        assert_eq!(tokens.access_token, "at1");
        assert_eq!(tokens.refresh_token, "rt1");
    }

    #[test]
    fn test_parse_session_file_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.json");
        assert!(parse_session_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_parse_session_file_without_refresh_token() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("supabase.json");
        fs::write(&path, r#"{"workos_tokens": "{\"access_token\": \"at1\"}"}"#).unwrap();

        assert!(parse_session_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_client_id_from_jwt_iss() {
        let jwt = fake_jwt(serde_json::json!({
            "iss": "https://api.workos.com/user_management/client_01ABCDEF",
            "sub": "user_123"
        }));
        let client_id = client_id_from_access_token(&jwt).unwrap();
        assert_eq!(client_id, "client_01ABCDEF");
    }

    #[test]
    fn test_client_id_from_jwt_trailing_slash() {
        let jwt = fake_jwt(serde_json::json!({
            "iss": "https://api.workos.com/user_management/client_01ABCDEF/"
        }));
        assert_eq!(
            client_id_from_access_token(&jwt).unwrap(),
            "client_01ABCDEF"
        );
    }

    #[test]
    fn test_client_id_not_a_jwt() {
        let err = client_id_from_access_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[test]
    fn test_client_id_missing_iss() {
        let jwt = fake_jwt(serde_json::json!({"sub": "user_123"}));
        let err = client_id_from_access_token(&jwt).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }
}
