use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// `{ data, count, status }` body used by module listings and deletions
#[derive(Debug, Serialize)]
pub struct Listing<T: Serialize> {
    pub data: Vec<T>,
    pub count: usize,
    pub status: u16,
}

impl<T: Serialize> Listing<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
            status: StatusCode::OK.as_u16(),
        }
    }
}

impl<T: Serialize> IntoResponse for Listing<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// `{ data, status }` body for a single row
#[derive(Debug, Serialize)]
pub struct Single<T: Serialize> {
    pub data: T,
    pub status: u16,
}

impl<T: Serialize> Single<T> {
    pub fn new(data: T) -> Self {
        Self { data, status: StatusCode::OK.as_u16() }
    }
}

impl<T: Serialize> IntoResponse for Single<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Wraps any serializable body in a 201 Created response
#[derive(Debug)]
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<T, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_counts_rows() {
        let listing = Listing::new(vec![json!({"idModul": 1}), json!({"idModul": 2})]);
        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            json!({ "data": [{"idModul": 1}, {"idModul": 2}], "count": 2, "status": 200 })
        );
    }

    #[test]
    fn empty_listing_is_still_ok() {
        let listing: Listing<serde_json::Value> = Listing::new(vec![]);
        assert_eq!(listing.count, 0);
        assert_eq!(listing.into_response().status(), StatusCode::OK);
    }

    #[test]
    fn created_uses_201() {
        assert_eq!(Created(json!({"ok": true})).into_response().status(), StatusCode::CREATED);
    }
}
