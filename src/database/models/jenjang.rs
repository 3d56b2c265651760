use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Education level row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Jenjang {
    #[serde(rename = "idJenjang")]
    #[sqlx(rename = "idJenjang")]
    pub id_jenjang: i32,
    pub jenjang: String,
    pub images: Option<String>,
}

/// Level annotated with the number of modules referencing it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JenjangWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub jenjang: Jenjang,
    pub count: i64,
}
