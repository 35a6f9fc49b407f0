use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use uuid::Uuid;

use crate::error_code::ErrorCode;

const ISSUER: &str = "tubely-access";

#[derive(Debug, thiserror::Error)]
pub(crate) enum AuthError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header is not a bearer token")]
    NotBearer,

    #[error("Invalid token")]
    Token(#[source] jsonwebtoken::errors::Error),

    #[error("Token subject is not a user id")]
    Subject(#[source] uuid::Error),
}

impl AuthError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingHeader | Self::NotBearer => ErrorCode::MISSING_TOKEN,
            Self::Token(_) | Self::Subject(_) => ErrorCode::INVALID_TOKEN,
        }
    }
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::NotBearer)?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::NotBearer),
    }
}

/// Validate an HS256 access token, returning the user it was issued to
pub(crate) fn validate_jwt(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(AuthError::Token)?;

    Uuid::parse_str(&data.claims.sub).map_err(AuthError::Subject)
}

/// Authenticate a request from its headers
pub(crate) fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Uuid, AuthError> {
    let token = bearer_token(headers)?;

    validate_jwt(token, secret)
}

#[cfg(test)]
pub(crate) fn make_jwt(user_id: Uuid, secret: &str, expires_in: time::Duration) -> String {
    use jsonwebtoken::{EncodingKey, Header};

    let now = time::OffsetDateTime::now_utc();

    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.unix_timestamp(),
        exp: (now + expires_in).unix_timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Encoded token")
}
