use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{Claims, TokenPair, UserRole};

/// Stateless issuer/verifier for the local session tokens.
///
/// Built once at startup from two independent HS256 secrets and held immutably
/// in the application state. Access and refresh tokens carry the same claim
/// shape but are signed with distinct secrets, so neither kind can stand in
/// for the other. Nothing is stored server-side: expiry is the only
/// termination condition, and a rotated-out refresh token that has not yet
/// expired remains replayable. That limitation is deliberate.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenService {
    pub fn new(access_secret: &str, refresh_secret: &str, access_ttl: i64, refresh_ttl: i64) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access(&self, user_id: i32, role: UserRole) -> Result<String, AppError> {
        let claims = Claims::new(user_id, role, self.access_ttl);
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
    }

    pub fn issue_refresh(&self, user_id: i32, role: UserRole) -> Result<String, AppError> {
        let claims = Claims::new(user_id, role, self.refresh_ttl);
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
    }

    pub fn issue_pair(&self, user_id: i32, role: UserRole) -> Result<TokenPair, AppError> {
        let access_token = self.issue_access(user_id, role)?;
        let refresh_token = self.issue_refresh(user_id, role)?;
        Ok(TokenPair::new(access_token, refresh_token, self.access_ttl))
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, AppError> {
        validate(token, &self.access_decoding)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, AppError> {
        validate(token, &self.refresh_decoding)
    }

    /// Rotate a refresh token: verify it, then mint a brand-new pair for the
    /// same subject. The caller is expected to discard the presented token.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.validate_refresh(refresh_token)?;
        self.issue_pair(claims.sub, claims.role)
    }
}

fn validate(token: &str, key: &DecodingKey) -> Result<Claims, AppError> {
    // Pinning the algorithm makes a token with an unexpected `alg` header
    // fail closed as invalid instead of being verified under it.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::new(ErrorCode::TokenExpired, "token has expired")
        }
        _ => AppError::new(ErrorCode::TokenInvalid, "invalid token"),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("access-secret", "refresh-secret", 900, 2_592_000)
    }

    #[test]
    fn access_token_round_trips() {
        let tokens = service();
        let token = tokens.issue_access(42, UserRole::User).unwrap();
        let claims = tokens.validate_access(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, UserRole::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_round_trips() {
        let tokens = service();
        let token = tokens.issue_refresh(7, UserRole::User).unwrap();
        let claims = tokens.validate_refresh(&token).unwrap();
        assert_eq!(claims.sub, 7);
    }

    #[test]
    fn secrets_are_not_interchangeable() {
        let tokens = service();
        let access = tokens.issue_access(1, UserRole::User).unwrap();
        let refresh = tokens.issue_refresh(1, UserRole::User).unwrap();

        let err = tokens.validate_access(&refresh).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);

        let err = tokens.validate_refresh(&access).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let tokens = service();
        let mut token = tokens.issue_access(1, UserRole::User).unwrap();
        token.push('x');
        let err = tokens.validate_access(&token).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn garbage_is_invalid_not_a_panic() {
        let tokens = service();
        let err = tokens.validate_access("not-a-jwt").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = TokenService::new("access-secret", "refresh-secret", -60, -60);
        let token = tokens.issue_access(1, UserRole::User).unwrap();
        let err = tokens.validate_access(&token).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenExpired);
    }

    #[test]
    fn refresh_rotates_to_a_fresh_pair() {
        let tokens = service();
        let old_refresh = tokens.issue_refresh(9, UserRole::User).unwrap();
        let pair = tokens.refresh(&old_refresh).unwrap();

        let claims = tokens.validate_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, 9);

        // jti is fresh on every issuance, so the rotated token differs even
        // when minted within the same second.
        assert_ne!(pair.refresh_token, old_refresh);
        let rotated = tokens.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(rotated.sub, 9);
    }

    #[test]
    fn refresh_rejects_an_access_token() {
        let tokens = service();
        let access = tokens.issue_access(3, UserRole::User).unwrap();
        let err = tokens.refresh(&access).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }
}
