use axum::http::{header::SET_COOKIE, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;

use keel_shared::middleware::{ACCESS_COOKIE, REFRESH_COOKIE};
use keel_shared::types::{ApiResponse, TokenPair};

use crate::config::{AppConfig, SessionMode};

pub const STATE_COOKIE: &str = "keel_oauth_state";
const STATE_COOKIE_TTL: i64 = 600;

/// Turn a freshly issued pair into the deployment's session response:
/// bearer mode returns the pair in the body, cookie mode sets HttpOnly
/// cookies and keeps the body empty.
pub fn establish(config: &AppConfig, status: StatusCode, pair: TokenPair) -> Response {
    match config.session_mode {
        SessionMode::Bearer => (status, Json(ApiResponse::ok(pair))).into_response(),
        SessionMode::Cookie => {
            let access = build_cookie(
                ACCESS_COOKIE,
                &pair.access_token,
                config.access_ttl,
                config.cookie_secure,
            );
            let refresh = build_cookie(
                REFRESH_COOKIE,
                &pair.refresh_token,
                config.refresh_ttl,
                config.cookie_secure,
            );
            let status = if status == StatusCode::OK {
                StatusCode::NO_CONTENT
            } else {
                status
            };
            (status, AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)])).into_response()
        }
    }
}

/// Session response for the OAuth callback, which always answers a browser:
/// cookie mode sets the cookies and sends the user on to the application,
/// bearer mode returns the pair for the frontend to pick up.
pub fn establish_redirect(config: &AppConfig, pair: TokenPair, location: &str) -> Response {
    match config.session_mode {
        SessionMode::Bearer => (StatusCode::OK, Json(ApiResponse::ok(pair))).into_response(),
        SessionMode::Cookie => {
            let access = build_cookie(
                ACCESS_COOKIE,
                &pair.access_token,
                config.access_ttl,
                config.cookie_secure,
            );
            let refresh = build_cookie(
                REFRESH_COOKIE,
                &pair.refresh_token,
                config.refresh_ttl,
                config.cookie_secure,
            );
            (
                AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
                Redirect::to(location),
            )
                .into_response()
        }
    }
}

/// End the session. There is no server-side token store to purge; in cookie
/// mode the session cookies are expired, in bearer mode the client simply
/// drops its copy.
pub fn clear(config: &AppConfig) -> Response {
    match config.session_mode {
        SessionMode::Bearer => StatusCode::NO_CONTENT.into_response(),
        SessionMode::Cookie => {
            let access = clear_cookie(ACCESS_COOKIE, config.cookie_secure);
            let refresh = clear_cookie(REFRESH_COOKIE, config.cookie_secure);
            (
                StatusCode::NO_CONTENT,
                AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
            )
                .into_response()
        }
    }
}

pub fn state_cookie(config: &AppConfig, state: &str) -> String {
    build_cookie(STATE_COOKIE, state, STATE_COOKIE_TTL, config.cookie_secure)
}

pub fn clear_state_cookie(config: &AppConfig) -> String {
    clear_cookie(STATE_COOKIE, config.cookie_secure)
}

fn build_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_session_attributes() {
        let cookie = build_cookie("keel_access", "tok", 900, false);
        assert_eq!(cookie, "keel_access=tok; Path=/; Max-Age=900; HttpOnly; SameSite=Lax");

        let secure = build_cookie("keel_access", "tok", 900, true);
        assert!(secure.ends_with("; Secure"));
    }

    #[test]
    fn clearing_expires_immediately() {
        let cookie = clear_cookie("keel_refresh", false);
        assert!(cookie.starts_with("keel_refresh=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
