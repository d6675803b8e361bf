//! Authorized file downloads

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use ccr_core::traits::Id;
use ccr_services::{MediaService, StoredFile};

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser};

/// Images display in the browser; everything else downloads
fn file_response(file: StoredFile) -> Response {
    let inline = file
        .content_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false);
    let disposition = format!(
        "{}; filename=\"{}\"",
        if inline { "inline" } else { "attachment" },
        file.file_name.replace('"', "")
    );

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let mut response = (
        [(header::CONTENT_TYPE, content_type)],
        file.data,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// GET /media/documents/:id/
pub async fn document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<Response> {
    let file = MediaService::new(&state.services).document(&user, id).await?;
    Ok(file_response(file))
}

/// GET /media/updates/:id/image/
pub async fn update_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<Response> {
    let file = MediaService::new(&state.services)
        .update_image(&user, id)
        .await?;
    Ok(file_response(file))
}
