use chrono::{Utc, Duration};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Serialize, Deserialize};
use crate::error::AppError;

pub const TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
    pub username: String,
}

pub fn sign_token(user_id: i64, role: &str, username: &str, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
        username: username.to_string(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256)
    )
    .map(|d| d.claims)
    .map_err(|e| AppError::validation(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_token_verifies_with_same_secret() {
        let token = sign_token(42, "owner", "mona", "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "owner");
        assert_eq!(claims.username, "mona");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_token(1, "staff", "sam", "secret").unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
