use axum::extract::{Path, Query, State};
use axum::http::{header::SET_COOKIE, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use chrono::{Duration, Utc};
use serde::Deserialize;

use keel_shared::errors::{AppError, AppResult};
use keel_shared::middleware::cookie_value;
use keel_shared::types::auth::{OAuthProvider, UserRole};

use crate::models::NewAccount;
use crate::services::session_service::STATE_COOKIE;
use crate::services::{account_service, oauth_service, session_service, user_service};
use crate::AppState;

// Provider tokens occasionally come back without an expiry; assume an hour.
const DEFAULT_PROVIDER_TOKEN_TTL: i64 = 3600;

fn parse_provider(provider: &str) -> Result<OAuthProvider, AppError> {
    provider
        .parse()
        .map_err(|_| AppError::not_found(format!("unknown provider: {provider}")))
}

/// Step one of the authorization-code flow: send the browser to the provider
/// with a single-use anti-forgery state, mirrored into a short-lived cookie
/// for the callback to compare against.
pub async fn oauth_redirect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<Response> {
    let provider = parse_provider(&provider)?;

    let nonce = oauth_service::generate_state();
    let url = oauth_service::authorize_url(&state.config, provider, &nonce)?;
    let cookie = session_service::state_cookie(&state.config, &nonce);

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(&url)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let provider = parse_provider(&provider)?;

    // The state cookie is single-use: it is cleared on every outcome,
    // matching or not.
    let clear_state = session_service::clear_state_cookie(&state.config);
    let stored = cookie_value(&headers, STATE_COOKIE);

    if let Err(err) = oauth_service::verify_state(stored.as_deref(), &query.state) {
        tracing::warn!(provider = %provider, "oauth state mismatch");
        return Ok((AppendHeaders([(SET_COOKIE, clear_state)]), err).into_response());
    }

    let provider_tokens =
        oauth_service::exchange_code(&state.http, &state.config, provider, &query.code).await?;
    let profile =
        oauth_service::fetch_profile(&state.http, provider, &provider_tokens.access_token).await?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = account_service::find_by_provider_uid(&mut conn, &provider.to_string(), &profile.id)?;
    let user_id = match existing {
        Some(account) => account.user_id,
        None => resolve_local_user(&mut conn, provider, profile.email.as_deref())?,
    };

    let expires_at = Utc::now()
        + Duration::seconds(provider_tokens.expires_in.unwrap_or(DEFAULT_PROVIDER_TOKEN_TTL));
    let account_id = account_service::upsert_account(
        &mut conn,
        &NewAccount {
            user_id,
            provider: provider.to_string(),
            provider_id: profile.id,
            access_token: provider_tokens.access_token,
            refresh_token: provider_tokens.refresh_token.unwrap_or_default(),
            access_token_expires_at: expires_at,
        },
    )?;

    // The upsert never reassigns ownership, so on a concurrent first callback
    // the stored row decides which user this identity belongs to. Re-read it
    // rather than trusting the id resolved above.
    let account = account_service::find_by_id(&mut conn, account_id)?
        .ok_or_else(|| AppError::internal("linked account row missing after upsert"))?;
    let user = user_service::find_by_id(&mut conn, account.user_id)?
        .ok_or_else(|| AppError::internal("linked user row missing"))?;

    let role = user.role.parse().unwrap_or(UserRole::User);
    let pair = state.tokens.issue_pair(user.id, role)?;

    tracing::info!(user_id = user.id, provider = %provider, "oauth login");

    let session =
        session_service::establish_redirect(&state.config, pair, &state.config.post_login_redirect);
    Ok((AppendHeaders([(SET_COOKIE, clear_state)]), session).into_response())
}

/// No link exists yet for this external identity: reuse the local user whose
/// email matches the profile, otherwise create one. The fallback lookup
/// covers a signup racing this callback for the same email.
fn resolve_local_user(
    conn: &mut diesel::PgConnection,
    provider: OAuthProvider,
    email: Option<&str>,
) -> AppResult<i32> {
    let Some(email) = email.map(str::to_lowercase) else {
        return Ok(user_service::create_oauth_user(conn, None)?.id);
    };

    if let Some(user) = user_service::find_by_email(conn, &email)? {
        // A user can end up here with a different identity already linked for
        // this provider; worth a trace before the fresh link is attempted.
        if let Some(prev) = account_service::find_by_provider(conn, &provider.to_string(), user.id)? {
            tracing::warn!(
                user_id = user.id,
                provider = %provider,
                previous_account = prev.id,
                "user already has a linked identity for this provider"
            );
        }
        return Ok(user.id);
    }

    match user_service::create_oauth_user(conn, Some(&email)) {
        Ok(user) => Ok(user.id),
        Err(e) if user_service::is_unique_violation(&e) => {
            let user = user_service::find_by_email(conn, &email)?
                .ok_or_else(|| AppError::internal("user vanished after unique violation"))?;
            Ok(user.id)
        }
        Err(e) => Err(e.into()),
    }
}
