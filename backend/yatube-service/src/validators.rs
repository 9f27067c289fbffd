/// Payload decoding and field validation shared by the resource services
use crate::error::{AppError, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Wire format of a write payload, picked from the request `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    /// Anything that is not a urlencoded form is read as JSON.
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            BodyFormat::Form
        } else {
            BodyFormat::Json
        }
    }
}

pub fn decode_body<T: DeserializeOwned>(format: BodyFormat, body: &[u8]) -> Result<T> {
    match format {
        BodyFormat::Json => decode_json(body),
        BodyFormat::Form => decode_form(body),
    }
}

/// Decode a urlencoded form. Every value arrives as a string; fields that
/// need another type must accept the string spelling (see `nullable_id`).
pub fn decode_form<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let fields: Map<String, Value> = url::form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::Validation(format!("Invalid form body: {}", e)))
}

/// Decode a JSON request body. An empty body is treated as `{}` so that
/// missing-field errors surface as field validation, not as a parse failure.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Validate a `text` field. Surrounding whitespace is stripped; a missing
/// value fails only when `required`.
pub fn clean_text(value: Option<String>, required: bool) -> Result<Option<String>> {
    match value {
        None if required => Err(AppError::Validation(
            "text: This field is required.".to_string(),
        )),
        None => Ok(None),
        Some(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(AppError::Validation(
                    "text: This field may not be blank.".to_string(),
                ));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

pub fn required_text(value: Option<String>) -> Result<String> {
    clean_text(value, true)?
        .ok_or_else(|| AppError::Validation("text: This field is required.".to_string()))
}

/// Deserialize a nullable field so that "absent" and "null" stay distinct.
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Nullable primary-key reference, distinguishing absent from null like
/// `double_option`. Accepts an integer, its string spelling (form bodies),
/// `null`, or an empty string meaning null.
pub fn nullable_id<'de, D>(deserializer: D) -> std::result::Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let invalid = || D::Error::custom("Incorrect type. Expected pk value.");

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Some(None)),
        Value::Number(n) => n.as_i64().map(|id| Some(Some(id))).ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(Some(None)),
        Value::String(s) => s.trim().parse().map(|id| Some(Some(id))).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
