use axum::{extract::State, Json};

use crate::api::ApiResult;
use crate::database::models::KategoriWithCount;
use crate::database::KategoriRepository;
use crate::state::AppState;

/// GET /kategori - categories with their module count
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<KategoriWithCount>>> {
    let rows = KategoriRepository::new(state.db.pool().clone()).select_with_count().await?;
    Ok(Json(rows))
}
