use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Recognised values of the `sort` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// By creation time
    CreatedAt(SortDirection),
    Random,
}

impl SortOrder {
    /// Anything other than `asc`, `desc` or `random` yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::CreatedAt(SortDirection::Asc)),
            "desc" => Some(SortOrder::CreatedAt(SortDirection::Desc)),
            "random" => Some(SortOrder::Random),
            _ => None,
        }
    }
}
