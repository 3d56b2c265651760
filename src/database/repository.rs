use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Jenjang, JenjangWithCount, KategoriWithCount, Modul, ModulWithJenjang, NewModul};
use crate::database::query_builder::{Predicate, QueryBuilder, SqlParam};
use crate::filter::ModulFilter;

const JENJANG_COLUMNS: &str = "\"idJenjang\", \"jenjang\", \"images\"";

const MODUL_COLUMNS: &str =
    "\"idModul\", \"idJenjang\", \"idKategori\", \"title\", \"desc\", \"name\", \"files\", \"createdAt\"";

const MODUL_COLUMNS_M: &str =
    "m.\"idModul\", m.\"idJenjang\", m.\"idKategori\", m.\"title\", m.\"desc\", m.\"name\", m.\"files\", m.\"createdAt\"";

pub struct JenjangRepository {
    pool: PgPool,
}

impl JenjangRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All levels with the number of modules pointing at each, computed per call
    pub async fn select_with_count(&self) -> Result<Vec<JenjangWithCount>, DatabaseError> {
        let rows = sqlx::query_as::<_, JenjangWithCount>(
            "SELECT j.\"idJenjang\", j.\"jenjang\", j.\"images\", COUNT(m.\"idModul\") AS count
             FROM jenjang j
             LEFT JOIN modul m ON m.\"idJenjang\" = j.\"idJenjang\"
             GROUP BY j.\"idJenjang\"
             ORDER BY j.\"idJenjang\"",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert(&self, name: &str, image_url: &str) -> Result<Jenjang, DatabaseError> {
        let sql = format!(
            "INSERT INTO jenjang (\"jenjang\", \"images\") VALUES ($1, $2) RETURNING {}",
            JENJANG_COLUMNS
        );
        let row = sqlx::query_as::<_, Jenjang>(&sql)
            .bind(name)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Physical delete; an unknown id yields an empty vec
    pub async fn delete(&self, id: i32) -> Result<Vec<Jenjang>, DatabaseError> {
        let sql = format!(
            "DELETE FROM jenjang WHERE \"idJenjang\" = $1 RETURNING {}",
            JENJANG_COLUMNS
        );
        let rows = sqlx::query_as::<_, Jenjang>(&sql).bind(id).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

pub struct ModulRepository {
    pool: PgPool,
}

impl ModulRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Modules left-joined with their level, so a missing level never drops a row
    fn joined_base() -> String {
        format!(
            "SELECT {}, CASE WHEN j.\"idJenjang\" IS NULL THEN NULL ELSE to_jsonb(j) END AS jenjang
             FROM modul m
             LEFT JOIN jenjang j ON j.\"idJenjang\" = m.\"idJenjang\"",
            MODUL_COLUMNS_M
        )
    }

    fn plain_base() -> String {
        format!("SELECT {} FROM modul m", MODUL_COLUMNS_M)
    }

    pub async fn select_filtered(&self, filter: &ModulFilter) -> Result<Vec<ModulWithJenjang>, DatabaseError> {
        filter
            .apply(QueryBuilder::new(Self::joined_base()))
            .fetch_all(&self.pool)
            .await
    }

    /// Modules of one level, without the level join
    pub async fn select_by_level(&self, filter: &ModulFilter) -> Result<Vec<Modul>, DatabaseError> {
        filter
            .apply(QueryBuilder::new(Self::plain_base()))
            .fetch_all(&self.pool)
            .await
    }

    pub async fn select_one_joined(&self, id: i32) -> Result<Option<ModulWithJenjang>, DatabaseError> {
        QueryBuilder::new(Self::joined_base())
            .and_where(Predicate::eq("m.\"idModul\"", SqlParam::Int(id.into())))
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn select_one(&self, id: i32) -> Result<Option<Modul>, DatabaseError> {
        QueryBuilder::new(Self::plain_base())
            .and_where(Predicate::eq("m.\"idModul\"", SqlParam::Int(id.into())))
            .fetch_optional(&self.pool)
            .await
    }

    /// Insert and return the generated id
    pub async fn insert(&self, modul: &NewModul) -> Result<i32, DatabaseError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO modul (\"idJenjang\", \"idKategori\", \"title\", \"desc\", \"name\", \"files\")
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING \"idModul\"",
        )
        .bind(modul.id_jenjang)
        .bind(modul.id_kategori)
        .bind(modul.title.as_deref())
        .bind(modul.desc.as_deref())
        .bind(modul.name.as_deref())
        .bind(&modul.files)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert, then read the persisted row back so defaults such as `createdAt` are included
    pub async fn insert_and_fetch(&self, modul: &NewModul) -> Result<Modul, DatabaseError> {
        let id = self.insert(modul).await?;
        self.select_one(id)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("modul {} missing after insert", id)))
    }

    pub async fn delete(&self, id: i32) -> Result<Vec<Modul>, DatabaseError> {
        let sql = format!("DELETE FROM modul WHERE \"idModul\" = $1 RETURNING {}", MODUL_COLUMNS);
        let rows = sqlx::query_as::<_, Modul>(&sql).bind(id).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

pub struct KategoriRepository {
    pool: PgPool,
}

impl KategoriRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn select_with_count(&self) -> Result<Vec<KategoriWithCount>, DatabaseError> {
        let rows = sqlx::query_as::<_, KategoriWithCount>(
            "SELECT k.\"idKategori\", k.\"kategori\", k.\"icon\", k.\"color\", COUNT(m.\"idModul\") AS count
             FROM kategori k
             LEFT JOIN modul m ON m.\"idKategori\" = k.\"idKategori\"
             GROUP BY k.\"idKategori\"
             ORDER BY k.\"idKategori\"",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
