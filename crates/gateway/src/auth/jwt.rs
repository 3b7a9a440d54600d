//! Signed session cookie values.
//!
//! The cookie carries a JWT naming the server-side session; the signature
//! keeps clients from forging session ids, the session store decides whether
//! the session is still live.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::types::Claims;
use crate::session::Session;

/// Sign a cookie token for a session. Expires with the session.
pub fn create_token(secret: &str, session: &Session) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: session.provider_id.clone(),
        sid: session.id.clone(),
        iat: Utc::now().timestamp(),
        exp: session.expires_at.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a cookie token and return its claims.
pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
