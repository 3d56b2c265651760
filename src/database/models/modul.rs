use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};

use super::jenjang::Jenjang;

/// Learning module row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Modul {
    pub id_modul: i32,
    pub id_jenjang: Option<i32>,
    pub id_kategori: Option<i32>,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub name: Option<String>,
    /// Uploaded-file URL or the external link, verbatim
    pub files: String,
    pub created_at: DateTime<Utc>,
}

/// Module with its level nested under `jenjang`; `null` when the level row is gone
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ModulWithJenjang {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub modul: Modul,
    pub jenjang: Option<Json<Jenjang>>,
}

/// Insert payload for a module, with `files` already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NewModul {
    pub id_jenjang: Option<i32>,
    pub id_kategori: i32,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub name: Option<String>,
    pub files: String,
}
