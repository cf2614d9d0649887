use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Json},
};

use crate::{
    error::Result, guest_link::GuestLink, guest_link::GuestLinkStatus, AppState, GuestLinkInfo,
    GuestLinkPostResponse,
};

// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hakone-backend",
        "timestamp": chrono::Utc::now()
    }))
}

// Create guest link endpoint. The body is parsed by the validators rather
// than an extractor so every malformed payload maps to 400.
pub async fn create_guest_link(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GuestLinkPostResponse>> {
    let id = state.guest_links.create(&body).await?;

    Ok(Json(GuestLinkPostResponse { id: id.into() }))
}

pub async fn list_guest_links(State(state): State<AppState>) -> Result<Json<Vec<GuestLinkInfo>>> {
    let links = state.guest_links.list().await?;

    let infos = links
        .iter()
        .map(|link| to_info(link, state.guest_links.status(link)))
        .collect();

    Ok(Json(infos))
}

pub async fn get_guest_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GuestLinkInfo>> {
    let link = state.guest_links.get(&id).await?;
    let status = state.guest_links.status(&link);

    Ok(Json(to_info(&link, status)))
}

// Delete guest link endpoint - succeeds whether or not the link existed
pub async fn delete_guest_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.guest_links.delete(&id).await?;

    Ok(Json(serde_json::json!({})))
}

fn to_info(link: &GuestLink, status: GuestLinkStatus) -> GuestLinkInfo {
    GuestLinkInfo {
        id: link.id.to_string(),
        label: link.label.as_str().to_string(),
        created: link.created,
        url_expires: link.url_expires,
        file_lifetime: link.file_lifetime.to_wire(),
        max_file_bytes: link.max_file_bytes.limit(),
        max_file_uploads: link.max_file_uploads.limit(),
        is_active: status == GuestLinkStatus::Active,
    }
}
