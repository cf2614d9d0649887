use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire encoding of a file lifetime that never expires (100 years).
pub const INFINITE_FILE_LIFETIME: &str = "876000h0m0s";

// Request types
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestLinkRequest {
    pub label: Option<String>,
    pub url_expiration_time: DateTime<Utc>,
    pub file_lifetime: String,
    pub max_file_bytes: Option<u64>,
    pub max_file_uploads: Option<u32>,
}

// Response types
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct GuestLinkPostResponse {
    pub id: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GuestLinkInfo {
    pub id: String,
    pub label: String,
    pub created: DateTime<Utc>,
    pub url_expires: DateTime<Utc>,
    pub file_lifetime: String,
    pub max_file_bytes: Option<u64>,
    pub max_file_uploads: Option<u32>,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
