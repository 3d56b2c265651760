use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::types::SortDirection;

/// A value bound to a positional `$n` marker. User input only ever travels here,
/// never inside the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Sql(String),
    /// Index into the owning predicate's `params`
    Param(usize),
}

/// One AND-joined condition: a SQL template plus the values it binds.
///
/// A template may reference the same parameter more than once; it is bound once.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pieces: Vec<Piece>,
    params: Vec<SqlParam>,
}

impl Predicate {
    /// `column = $n`
    pub fn eq(column: &str, value: SqlParam) -> Self {
        Self {
            pieces: vec![Piece::Sql(format!("{} = ", column)), Piece::Param(0)],
            params: vec![value],
        }
    }

    /// `(a ILIKE $n OR b ILIKE $n OR ...)` sharing a single bound pattern
    pub fn ilike_any(columns: &[&str], pattern: String) -> Self {
        let mut pieces = vec![Piece::Sql("(".to_string())];
        for (i, column) in columns.iter().enumerate() {
            let prefix = if i == 0 { "" } else { " OR " };
            pieces.push(Piece::Sql(format!("{}{} ILIKE ", prefix, column)));
            pieces.push(Piece::Param(0));
        }
        pieces.push(Piece::Sql(")".to_string()));
        Self { pieces, params: vec![pattern.into()] }
    }

    fn render(&self, offset: usize, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Sql(s) => out.push_str(s),
                Piece::Param(i) => out.push_str(&format!("${}", offset + i + 1)),
            }
        }
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderBy {
    Column { column: String, sort: SortDirection },
    Random,
}

impl OrderBy {
    fn to_sql(&self) -> String {
        match self {
            OrderBy::Column { column, sort } => format!("ORDER BY {} {}", column, sort.to_sql()),
            OrderBy::Random => "ORDER BY random()".to_string(),
        }
    }
}

/// Final statement and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Folds an ordered list of predicates, an optional order and an optional
/// limit onto a fixed `SELECT ... FROM ...` base.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base: String,
    predicates: Vec<Predicate>,
    order: Option<OrderBy>,
    limit: Option<i64>,
}

impl QueryBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            predicates: vec![],
            order: None,
            limit: None,
        }
    }

    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut query = self.base.clone();
        let mut params = Vec::new();

        for (i, predicate) in self.predicates.iter().enumerate() {
            query.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.render(params.len(), &mut query);
            params.extend(predicate.params.iter().cloned());
        }

        if let Some(order) = &self.order {
            query.push(' ');
            query.push_str(&order.to_sql());
        }

        if let Some(limit) = self.limit {
            params.push(SqlParam::Int(limit));
            query.push_str(&format!(" LIMIT ${}", params.len()));
        }

        SqlResult { query, params }
    }

    pub async fn fetch_all<T>(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql_result = self.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn fetch_optional<T>(self, pool: &PgPool) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql_result = self.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let row = q.fetch_optional(pool).await?;
        Ok(row)
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "SELECT * FROM modul m";

    #[test]
    fn no_predicates_leaves_base_untouched() {
        let sql = QueryBuilder::new(BASE).to_sql();
        assert_eq!(sql.query, BASE);
        assert!(sql.params.is_empty());
    }

    #[test]
    fn predicates_are_and_joined_and_numbered_in_order() {
        let sql = QueryBuilder::new(BASE)
            .and_where(Predicate::eq("m.\"idJenjang\"", SqlParam::Int(5)))
            .and_where(Predicate::eq("m.\"idKategori\"", SqlParam::Int(2)))
            .to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM modul m WHERE m.\"idJenjang\" = $1 AND m.\"idKategori\" = $2"
        );
        assert_eq!(sql.params, vec![SqlParam::Int(5), SqlParam::Int(2)]);
    }

    #[test]
    fn ilike_any_shares_one_parameter() {
        let sql = QueryBuilder::new(BASE)
            .and_where(Predicate::eq("m.\"idJenjang\"", SqlParam::Int(1)))
            .and_where(Predicate::ilike_any(&["m.\"title\"", "m.\"desc\"", "m.\"name\""], "%fiqih%".into()))
            .to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM modul m WHERE m.\"idJenjang\" = $1 AND \
             (m.\"title\" ILIKE $2 OR m.\"desc\" ILIKE $2 OR m.\"name\" ILIKE $2)"
        );
        assert_eq!(sql.params, vec![SqlParam::Int(1), SqlParam::Text("%fiqih%".into())]);
    }

    #[test]
    fn user_text_never_reaches_the_query_string() {
        let evil = "'; DROP TABLE modul; --".to_string();
        let sql = QueryBuilder::new(BASE)
            .and_where(Predicate::ilike_any(&["m.\"title\""], evil.clone()))
            .to_sql();
        assert!(!sql.query.contains("DROP"));
        assert_eq!(sql.params, vec![SqlParam::Text(evil)]);
    }

    #[test]
    fn order_and_limit_follow_predicates() {
        let sql = QueryBuilder::new(BASE)
            .and_where(Predicate::eq("m.\"idJenjang\"", SqlParam::Int(3)))
            .order_by(OrderBy::Column { column: "m.\"createdAt\"".into(), sort: SortDirection::Desc })
            .limit(10)
            .to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM modul m WHERE m.\"idJenjang\" = $1 ORDER BY m.\"createdAt\" DESC LIMIT $2"
        );
        assert_eq!(sql.params, vec![SqlParam::Int(3), SqlParam::Int(10)]);
    }

    #[test]
    fn random_order_without_filters() {
        let sql = QueryBuilder::new(BASE).order_by(OrderBy::Random).limit(2).to_sql();
        assert_eq!(sql.query, "SELECT * FROM modul m ORDER BY random() LIMIT $1");
        assert_eq!(sql.params, vec![SqlParam::Int(2)]);
    }
}
