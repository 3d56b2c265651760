use super::types::SortOrder;
use crate::database::query_builder::{OrderBy, Predicate, QueryBuilder, SqlParam};

const LEVEL_COLUMN: &str = "m.\"idJenjang\"";
const CATEGORY_COLUMN: &str = "m.\"idKategori\"";
const CREATED_AT_COLUMN: &str = "m.\"createdAt\"";
const SEARCH_COLUMNS: [&str; 3] = ["m.\"title\"", "m.\"desc\"", "m.\"name\""];

/// Raw query string of `GET /modul`. Every field stays a string so that a
/// malformed value is dropped instead of rejecting the request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModulQuery {
    pub search: Option<String>,
    pub id: Option<String>,
    pub kategori: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
}

impl ModulQuery {
    /// Build from decoded `key=value` pairs. The first occurrence of a key
    /// (or any of its aliases) wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "search" => &mut query.search,
                "id" | "idJenjang" => &mut query.id,
                "kategori" | "categoria" | "idKategori" => &mut query.kategori,
                "sort" => &mut query.sort,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Allow-listed, typed filters for module listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModulFilter {
    pub level_id: Option<i32>,
    pub category_id: Option<i32>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub limit: Option<i64>,
}

impl ModulFilter {
    pub fn from_query(query: ModulQuery, max_limit: Option<i64>) -> Self {
        let limit = query
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(|n| match max_limit {
                Some(max) if n > max => {
                    tracing::debug!("Limit {} exceeds max {}, capping to max", n, max);
                    max
                }
                _ => n,
            });

        Self {
            level_id: parse_id(query.id.as_deref()),
            category_id: parse_id(query.kategori.as_deref()),
            search: query.search.filter(|s| !s.is_empty()),
            sort: query.sort.as_deref().and_then(SortOrder::parse),
            limit,
        }
    }

    /// Only the search term applies when listing the modules of one level
    pub fn for_level(level_id: i32, search: Option<String>) -> Self {
        Self {
            level_id: Some(level_id),
            search: search.filter(|s| !s.is_empty()),
            ..Default::default()
        }
    }

    pub fn apply(&self, mut builder: QueryBuilder) -> QueryBuilder {
        if let Some(id) = self.level_id {
            builder = builder.and_where(Predicate::eq(LEVEL_COLUMN, SqlParam::Int(id.into())));
        }
        if let Some(id) = self.category_id {
            builder = builder.and_where(Predicate::eq(CATEGORY_COLUMN, SqlParam::Int(id.into())));
        }
        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            builder = builder.and_where(Predicate::ilike_any(&SEARCH_COLUMNS, pattern));
        }
        match self.sort {
            Some(SortOrder::CreatedAt(sort)) => {
                builder = builder.order_by(OrderBy::Column { column: CREATED_AT_COLUMN.to_string(), sort });
            }
            Some(SortOrder::Random) => builder = builder.order_by(OrderBy::Random),
            None => {}
        }
        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        builder
    }
}

fn parse_id(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Make `%`, `_` and `\` match literally inside an ILIKE pattern
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
