use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiResult, Created, Listing};
use crate::database::models::{Jenjang, JenjangWithCount};
use crate::database::JenjangRepository;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{upload_and_discard, UploadFolder};

use super::form::parse_form;
use super::parse_path_id;

/// GET /jenjang - levels with their module count
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<JenjangWithCount>>> {
    let rows = JenjangRepository::new(state.db.pool().clone()).select_with_count().await?;
    Ok(Json(rows))
}

/// POST /jenjang - multipart `jenjang` (name) and `file` (image)
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Created<Value>> {
    let server = &state.config.server;
    let mut form = parse_form(multipart, &server.upload_dir, server.max_upload_bytes).await?;

    let name = match form.text("jenjang") {
        Some(n) => n.trim().to_string(),
        None => {
            form.discard().await;
            return Err(ApiError::bad_request("jenjang is required"));
        }
    };
    let file = form
        .take_file()
        .ok_or_else(|| ApiError::bad_request("file is required"))?;

    let asset = upload_and_discard(state.uploader.as_ref(), file, UploadFolder::LevelImages).await?;
    let row = JenjangRepository::new(state.db.pool().clone())
        .insert(&name, &asset.secure_url)
        .await?;

    info!(id = row.id_jenjang, "Created jenjang");
    Ok(Created(json!({
        "message": "Jenjang created",
        "image": asset.secure_url,
        "data": row,
    })))
}

/// DELETE /jenjang/:id - physical delete; unknown ids return an empty list
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Listing<Jenjang>> {
    let id = parse_path_id(&id)?;
    let rows = JenjangRepository::new(state.db.pool().clone()).delete(id).await?;
    info!(id, deleted = rows.len(), "Deleted jenjang");
    Ok(Listing::new(rows))
}
