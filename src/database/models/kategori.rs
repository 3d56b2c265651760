use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Kategori {
    #[serde(rename = "idKategori")]
    #[sqlx(rename = "idKategori")]
    pub id_kategori: i32,
    pub kategori: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct KategoriWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub kategori: Kategori,
    pub count: i64,
}
