/// Request authentication
///
/// Resolves an `Authorization: Bearer <jwt>` header into the [`AuthUser`]
/// the token was issued for. The HTTP layer calls [`authenticate`] from its
/// middleware and stores the result in the request extensions.
///
/// A token whose subject no longer exists is rejected the same way as an
/// invalid token.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;
use crate::store::{Store, StoreError};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Unknown user")]
    UnknownUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Validates the bearer token and loads its user
pub async fn authenticate(
    store: &dyn Store,
    secret: &str,
    header: Option<&str>,
) -> Result<AuthUser, AuthError> {
    let token = bearer_token(header)?;
    let claims = validate_token(token, secret)?;

    let user = store.find_user(claims.sub).await?.ok_or_else(|| {
        debug!(user_id = %claims.sub, "Token subject not found");
        AuthError::UnknownUser
    })?;

    Ok(user.into())
}
