/// Request validation
///
/// - [`ValidatedJson`]: JSON body extractor that runs `validator` rules
///   before the handler sees the value.
/// - [`parse_id`]: path identifier parsing with a field-level error.
/// - [`not_blank`]: custom rule rejecting whitespace-only strings.
///
/// Request structs read their string fields through [`lenient_string`]:
/// absent, `null` and non-scalar values all become an empty string, so they
/// are reported per field with the same message as a blank value.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// Message for malformed identifiers
pub const INVALID_ID: &str = "ID no válido";

/// JSON body that has passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Reads a JSON scalar as a string; `null`, arrays and objects read as empty
///
/// Use together with `#[serde(default)]` so a missing field is empty too.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Parses a path identifier, naming `field` on failure
pub fn parse_id(field: &str, value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::invalid_field(field, INVALID_ID))
}

/// Rejects strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Rejects strings that are not identifiers
pub fn valid_id(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_id"))
}
