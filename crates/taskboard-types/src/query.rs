//! Task listing query
//!
//! The sort column is a closed set. Anything a client sends for `order_by`
//! must parse into [`SortColumn`] before it gets anywhere near SQL text.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Columns a task listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Id,
    Name,
    Description,
}

impl SortColumn {
    /// Qualified column reference for the task listing query
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::Id => "t.id",
            SortColumn::Name => "t.name",
            SortColumn::Description => "t.description",
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortColumn::Id => write!(f, "id"),
            SortColumn::Name => write!(f, "name"),
            SortColumn::Description => write!(f, "description"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort column: {0}")]
pub struct UnknownSortColumn(pub String);

impl FromStr for SortColumn {
    type Err = UnknownSortColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortColumn::Id),
            "name" => Ok(SortColumn::Name),
            "description" => Ok(SortColumn::Description),
            _ => Err(UnknownSortColumn(s.to_string())),
        }
    }
}

/// Sort direction, ascending unless asked otherwise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `"desc"` in any case means descending; everything else is ascending.
    pub fn from_param(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Filter, ordering and limit for a task listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Exact match on task name
    pub name: Option<String>,
    pub order_by: Option<SortColumn>,
    #[serde(default)]
    pub direction: SortDirection,
    pub limit: Option<u32>,
}

impl TaskQuery {
    /// Build a query from raw client parameters.
    ///
    /// Empty `name` and `order_by` mean "no filter" and "no ordering".
    /// A non-empty `order_by` outside [`SortColumn`] is rejected.
    pub fn from_params(
        name: &str,
        order_by: &str,
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Self, UnknownSortColumn> {
        let order_by = if order_by.trim().is_empty() {
            None
        } else {
            Some(order_by.parse()?)
        };

        Ok(Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            order_by,
            direction: SortDirection::from_param(sort),
            limit,
        })
    }
}
