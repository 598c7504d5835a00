use rand::Rng;
use serde::Deserialize;

use keel_shared::errors::{AppError, ErrorCode};
use keel_shared::types::auth::OAuthProvider;

use crate::config::AppConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// What the code exchange hands back; opaque to us beyond expiry bookkeeping.
#[derive(Debug)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug)]
pub struct ProviderProfile {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    #[serde(alias = "sub")]
    id: String,
    email: Option<String>,
}

/// Random anti-forgery state for the authorization redirect. Issued once,
/// mirrored into a short-lived cookie, redeemed once on callback.
pub fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Compare the state echoed back by the provider against the value stored in
/// the redirect cookie. Absent or different means this callback was not
/// initiated by us and it is rejected, never retried.
pub fn verify_state(stored: Option<&str>, presented: &str) -> Result<(), AppError> {
    match stored {
        Some(stored) if stored == presented => Ok(()),
        _ => Err(AppError::new(ErrorCode::StateMismatch, "oauth state mismatch")),
    }
}

pub fn authorize_url(
    config: &AppConfig,
    provider: OAuthProvider,
    state: &str,
) -> Result<String, AppError> {
    let url = match provider {
        OAuthProvider::Google => reqwest::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", config.google_client_id.as_str()),
                ("redirect_uri", config.google_redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::internal(format!("authorize url construction failed: {e}")))?,
    };
    Ok(url.into())
}

pub async fn exchange_code(
    http: &reqwest::Client,
    config: &AppConfig,
    provider: OAuthProvider,
    code: &str,
) -> Result<ProviderTokens, AppError> {
    let token_url = match provider {
        OAuthProvider::Google => GOOGLE_TOKEN_URL,
    };

    let response = http
        .post(token_url)
        .form(&[
            ("code", code),
            ("client_id", &config.google_client_id),
            ("client_secret", &config.google_client_secret),
            ("redirect_uri", &config.google_redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("token exchange failed: {e}")))?;

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider = %provider, body = %body, "provider rejected code exchange");
        return Err(AppError::new(ErrorCode::OAuthError, "provider rejected the authorization code"));
    }

    let tokens: GoogleTokenResponse = response
        .json()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("invalid token response: {e}")))?;

    Ok(ProviderTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    })
}

pub async fn fetch_profile(
    http: &reqwest::Client,
    provider: OAuthProvider,
    access_token: &str,
) -> Result<ProviderProfile, AppError> {
    let userinfo_url = match provider {
        OAuthProvider::Google => GOOGLE_USERINFO_URL,
    };

    let response = http
        .get(userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("userinfo fetch failed: {e}")))?;

    let profile: GoogleUserInfo = response
        .json()
        .await
        .map_err(|e| AppError::new(ErrorCode::OAuthError, format!("invalid userinfo response: {e}")))?;

    Ok(ProviderProfile {
        id: profile.id,
        email: profile.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionMode;

    fn config() -> AppConfig {
        AppConfig {
            port: 3001,
            database_url: String::new(),
            access_secret: "a".into(),
            refresh_secret: "r".into(),
            access_ttl: 900,
            refresh_ttl: 2_592_000,
            session_mode: SessionMode::Bearer,
            cookie_secure: false,
            post_login_redirect: "/".into(),
            google_client_id: "client-123".into(),
            google_client_secret: "shh".into(),
            google_redirect_uri: "http://localhost:3001/auth/google/callback".into(),
        }
    }

    #[test]
    fn state_is_long_and_non_repeating() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn matching_state_is_accepted() {
        assert!(verify_state(Some("nonce123"), "nonce123").is_ok());
    }

    #[test]
    fn differing_state_is_a_mismatch() {
        let err = verify_state(Some("nonce123"), "forged").unwrap_err();
        assert_eq!(err.code(), ErrorCode::StateMismatch);
        assert_eq!(err.code().status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn absent_cookie_is_a_mismatch() {
        let err = verify_state(None, "nonce123").unwrap_err();
        assert_eq!(err.code(), ErrorCode::StateMismatch);
    }

    #[test]
    fn authorize_url_carries_client_and_state() {
        let url = authorize_url(&config(), OAuthProvider::Google, "nonce123").unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=nonce123"));
        assert!(url.contains("response_type=code"));
    }
}
