use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User};

const TOKEN_LIFETIME_HOURS: i64 = 24;

pub fn issue_token(secret: &str, user: &User) -> Result<String> {
    let sub = user
        ._id
        .map(|id| id.to_hex())
        .ok_or_else(|| AppError::service("cannot issue a token for an unsaved user"))?;

    let claims = Claims {
        sub,
        email: user.email.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::service(format!("token generation failed: {}", e)))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}
