// handlers/mod.rs - one module per resource
//
// /jenjang   education levels (list with module count, create with image, delete)
// /modul     learning modules (filtered list, per-level list, show, create, delete)
// /kategori  read-only categories with module count
pub mod form;
pub mod health;
pub mod jenjang;
pub mod kategori;
pub mod modul;

use crate::error::ApiError;

/// Parse a numeric `:id` path segment
pub(crate) fn parse_path_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}
