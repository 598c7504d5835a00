use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use keel_shared::errors::{AppError, ErrorCode};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

/// A malformed stored hash verifies as false rather than erroring, so the
/// caller cannot tell "bad hash" apart from "bad password".
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn validate_password(password: &str, password2: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "password must be at least 8 characters",
        ));
    }
    if password != password2 {
        return Err(AppError::new(ErrorCode::ValidationError, "passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("longpass1").unwrap();
        assert!(verify_password("longpass1", &hash));
        assert!(!verify_password("wrongpass", &hash));
    }

    #[test]
    fn equal_inputs_hash_differently() {
        let a = hash_password("longpass1").unwrap();
        let b = hash_password("longpass1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("longpass1", "not-a-phc-string"));
        assert!(!verify_password("longpass1", ""));
    }

    #[test]
    fn short_password_is_rejected() {
        let err = validate_password("short", "short").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        let err = validate_password("longpass1", "longpass2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn valid_password_passes() {
        assert!(validate_password("longpass1", "longpass1").is_ok());
    }
}
