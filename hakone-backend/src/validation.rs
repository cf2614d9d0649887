//! Parsing and bounds checks for guest link creation requests.
//!
//! Fields are read as untyped JSON first so that a value of the wrong
//! JSON type is reported against its own field rather than as a generic
//! body error. An omitted field and an explicit `null` are equivalent.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::guest_link::{
    FileLifetime, GuestLinkLabel, LifetimeRejection, MaxFileBytes, MaxFileUploads, NewGuestLink,
    MAX_GUEST_FILE_BYTES, MAX_GUEST_FILE_UPLOADS, MAX_LABEL_CHARS, MIN_GUEST_FILE_BYTES,
};

pub const LABEL_FIELD: &str = "label";
pub const URL_EXPIRATION_FIELD: &str = "urlExpirationTime";
pub const FILE_LIFETIME_FIELD: &str = "fileLifetime";
pub const MAX_FILE_BYTES_FIELD: &str = "maxFileBytes";
pub const MAX_FILE_UPLOADS_FIELD: &str = "maxFileUploads";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("malformed field {field}: {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("field {field} is out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("invalid guest link ID: {0:?}")]
    InvalidGuestLinkId(String),
}

impl ValidationError {
    /// The request field the error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field)
            | Self::MalformedField { field, .. }
            | Self::OutOfRange { field, .. } => Some(field),
            Self::InvalidBody(_) | Self::InvalidGuestLinkId(_) => None,
        }
    }

    fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field,
            reason: reason.into(),
        }
    }

    fn out_of_range(field: &'static str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct RawGuestLinkRequest {
    label: Option<Value>,
    url_expiration_time: Option<Value>,
    file_lifetime: Option<Value>,
    max_file_bytes: Option<Value>,
    max_file_uploads: Option<Value>,
}

/// Validate a raw creation request body
pub fn parse_guest_link_request(body: &[u8]) -> Result<NewGuestLink, ValidationError> {
    let raw: RawGuestLinkRequest = serde_json::from_slice(body)
        .map_err(|e| ValidationError::InvalidBody(e.to_string()))?;

    Ok(NewGuestLink {
        label: parse_label(raw.label.as_ref())?,
        url_expires: parse_url_expiration(raw.url_expiration_time.as_ref())?,
        file_lifetime: parse_file_lifetime(raw.file_lifetime.as_ref())?,
        max_file_bytes: parse_max_file_bytes(raw.max_file_bytes.as_ref())?,
        max_file_uploads: parse_max_file_uploads(raw.max_file_uploads.as_ref())?,
    })
}

pub fn parse_label(value: Option<&Value>) -> Result<GuestLinkLabel, ValidationError> {
    match value {
        None => Ok(GuestLinkLabel::default()),
        Some(Value::String(text)) => GuestLinkLabel::new(text.as_str()).ok_or_else(|| {
            ValidationError::out_of_range(
                LABEL_FIELD,
                format!("must be at most {} characters", MAX_LABEL_CHARS),
            )
        }),
        Some(other) => Err(ValidationError::malformed(
            LABEL_FIELD,
            format!("expected a string, got {}", json_type(other)),
        )),
    }
}

pub fn parse_url_expiration(value: Option<&Value>) -> Result<DateTime<Utc>, ValidationError> {
    let text = match value {
        None => return Err(ValidationError::MissingField(URL_EXPIRATION_FIELD)),
        Some(Value::String(text)) => text,
        Some(other) => {
            return Err(ValidationError::malformed(
                URL_EXPIRATION_FIELD,
                format!("expected an RFC 3339 timestamp, got {}", json_type(other)),
            ))
        }
    };

    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ValidationError::malformed(URL_EXPIRATION_FIELD, e.to_string()))
}

pub fn parse_file_lifetime(value: Option<&Value>) -> Result<FileLifetime, ValidationError> {
    let text = match value {
        None => return Err(ValidationError::MissingField(FILE_LIFETIME_FIELD)),
        Some(Value::String(text)) => text,
        Some(other) => {
            return Err(ValidationError::malformed(
                FILE_LIFETIME_FIELD,
                format!("expected a duration string, got {}", json_type(other)),
            ))
        }
    };

    // Negative durations are not part of the grammar and fail here
    let duration = humantime::parse_duration(text)
        .map_err(|e| ValidationError::malformed(FILE_LIFETIME_FIELD, e.to_string()))?;

    FileLifetime::from_duration(duration).map_err(|rejection| {
        let reason = match rejection {
            LifetimeRejection::ShorterThanOneDay => "must be at least one day",
            LifetimeRejection::LongerThanInfinite => "must not exceed 876000h",
        };
        ValidationError::out_of_range(FILE_LIFETIME_FIELD, reason)
    })
}

pub fn parse_max_file_bytes(value: Option<&Value>) -> Result<MaxFileBytes, ValidationError> {
    let Some(bytes) = parse_positive_integer(MAX_FILE_BYTES_FIELD, value)? else {
        return Ok(MaxFileBytes::Unlimited);
    };

    MaxFileBytes::bounded(bytes).ok_or_else(|| {
        ValidationError::out_of_range(
            MAX_FILE_BYTES_FIELD,
            format!(
                "must be between {} and {} bytes",
                MIN_GUEST_FILE_BYTES, MAX_GUEST_FILE_BYTES
            ),
        )
    })
}

pub fn parse_max_file_uploads(value: Option<&Value>) -> Result<MaxFileUploads, ValidationError> {
    let Some(count) = parse_positive_integer(MAX_FILE_UPLOADS_FIELD, value)? else {
        return Ok(MaxFileUploads::Unlimited);
    };

    u32::try_from(count)
        .ok()
        .and_then(MaxFileUploads::bounded)
        .ok_or_else(|| {
            ValidationError::out_of_range(
                MAX_FILE_UPLOADS_FIELD,
                format!("must be between 1 and {}", MAX_GUEST_FILE_UPLOADS),
            )
        })
}

/// Reads an optional strictly positive JSON integer. Fractions are a type
/// error, not something to truncate.
fn parse_positive_integer(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<u64>, ValidationError> {
    let number = match value {
        None => return Ok(None),
        Some(Value::Number(number)) => number,
        Some(other) => {
            return Err(ValidationError::malformed(
                field,
                format!("expected an integer, got {}", json_type(other)),
            ))
        }
    };

    match (number.as_u64(), number.as_i64()) {
        (Some(0), _) => Err(ValidationError::out_of_range(field, "must not be zero")),
        (Some(n), _) => Ok(Some(n)),
        (None, Some(_)) => Err(ValidationError::out_of_range(
            field,
            "must not be negative",
        )),
        (None, None) => Err(ValidationError::malformed(
            field,
            format!("expected a whole number, got {}", number),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
