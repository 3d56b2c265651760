use axum::extract::{Multipart, Path, Query, State};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiResult, Created, Listing, Single};
use crate::database::models::{Modul, ModulWithJenjang, NewModul};
use crate::database::ModulRepository;
use crate::error::ApiError;
use crate::filter::{ModulFilter, ModulQuery};
use crate::state::AppState;
use crate::storage::{upload_and_discard, StagedFile, UploadFolder};

use super::form::{parse_form, FormData};
use super::parse_path_id;

/// Where a new module's `files` value comes from, decided once from its category
#[derive(Debug)]
pub enum ModuleSource {
    UploadedFile(StagedFile),
    ExternalLink(String),
}

/// Validated `POST /modul` form
#[derive(Debug)]
pub struct ModulSubmission {
    pub id_jenjang: Option<i32>,
    pub id_kategori: i32,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub name: Option<String>,
    pub source: ModuleSource,
}

impl ModulSubmission {
    /// The file-backed category takes the staged `file`; every other category
    /// needs a `link`. Anything left in `form` is the caller's to discard.
    pub fn resolve(form: &mut FormData, file_category_id: i32) -> Result<Self, ApiError> {
        let id_kategori = form
            .text("idKategori")
            .ok_or_else(|| ApiError::bad_request("idKategori is required"))?
            .trim()
            .parse::<i32>()
            .map_err(|_| ApiError::bad_request("idKategori must be an integer"))?;

        let id_jenjang = match form.text("idJenjang") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| ApiError::bad_request("idJenjang must be an integer"))?,
            ),
            None => None,
        };

        let source = if id_kategori == file_category_id {
            let file = form
                .take_file()
                .ok_or_else(|| ApiError::bad_request("file is required for this category"))?;
            ModuleSource::UploadedFile(file)
        } else {
            let link = form
                .text("link")
                .ok_or_else(|| ApiError::bad_request("link is required for this category"))?;
            ModuleSource::ExternalLink(link.to_string())
        };

        Ok(Self {
            id_jenjang,
            id_kategori,
            title: form.text("title").map(str::to_string),
            desc: form.text("desc").map(str::to_string),
            name: form.text("name").map(str::to_string),
            source,
        })
    }
}

/// GET /modul - filtered, sorted, limited listing joined with the level
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Listing<ModulWithJenjang>> {
    let filter = ModulFilter::from_query(ModulQuery::from_pairs(pairs), state.config.filter.max_limit);
    let rows = ModulRepository::new(state.db.pool().clone()).select_filtered(&filter).await?;
    Ok(Listing::new(rows))
}

/// GET /modul/jenjang/:id - modules of one level, optional `search`
pub async fn list_by_jenjang(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Listing<Modul>> {
    let search = ModulQuery::from_pairs(pairs).search;
    let filter = ModulFilter::for_level(parse_path_id(&id)?, search);
    let rows = ModulRepository::new(state.db.pool().clone()).select_by_level(&filter).await?;
    Ok(Listing::new(rows))
}

/// GET /modul/:id - 404 when no row matches
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Single<ModulWithJenjang>> {
    let id = parse_path_id(&id)?;
    let row = ModulRepository::new(state.db.pool().clone())
        .select_one_joined(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Modul {} not found", id)))?;
    Ok(Single::new(row))
}

/// POST /modul - multipart `idJenjang,title,desc,name,idKategori,link` and `file`
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Created<Value>> {
    let server = &state.config.server;
    let mut form = parse_form(multipart, &server.upload_dir, server.max_upload_bytes).await?;

    let resolved = ModulSubmission::resolve(&mut form, state.config.modul.file_category_id);
    // A file sent alongside a link category, or with an invalid form, is never uploaded
    form.discard().await;
    let submission = resolved?;

    let files = match submission.source {
        ModuleSource::UploadedFile(file) => {
            upload_and_discard(state.uploader.as_ref(), file, UploadFolder::ModuleFiles)
                .await?
                .secure_url
        }
        ModuleSource::ExternalLink(link) => link,
    };

    let new_modul = NewModul {
        id_jenjang: submission.id_jenjang,
        id_kategori: submission.id_kategori,
        title: submission.title,
        desc: submission.desc,
        name: submission.name,
        files,
    };
    let row = ModulRepository::new(state.db.pool().clone())
        .insert_and_fetch(&new_modul)
        .await?;

    info!(id = row.id_modul, kategori = row.id_kategori, "Created modul");
    Ok(Created(json!({
        "message": "Modul created",
        "fileUrl": row.files,
        "idModul": row.id_modul,
        "data": row,
    })))
}

/// DELETE /modul/:id - physical delete; unknown ids return an empty list
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Listing<Modul>> {
    let id = parse_path_id(&id)?;
    let rows = ModulRepository::new(state.db.pool().clone()).delete(id).await?;
    info!(id, deleted = rows.len(), "Deleted modul");
    Ok(Listing::new(rows))
}
