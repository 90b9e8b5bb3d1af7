//! Generic record access at the backend boundary.
//!
//! The remote persistence service exposes four tables through a small
//! insert/delete/select surface. Queries are built from structured
//! predicates; identifiers never travel as interpolated query text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum::{AsRefStr, Display};

use crate::backend::auth::UserId;
use crate::error::Result;

/// Opaque identifier of a stored record (UUID format for the bundled
/// backends, but callers must not rely on that).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The record tables consumed by the client core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Posts,
    Likes,
    SavedPosts,
    Comments,
}

/// Field map for inserts and delete matches.
pub type Fields = serde_json::Map<String, Value>;

/// A record returned by `select`, as a raw JSON object. Callers decode the
/// projection they asked for via serde.
pub type Record = serde_json::Map<String, Value>;

/// Builds a field map from column/value pairs.
pub fn fields<const N: usize>(entries: [(&str, Value); N]) -> Fields {
    entries
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

/// A structured filter predicate. Values are passed as typed arguments,
/// never spliced into query text.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self::Eq {
            column: column.into(),
            value,
        }
    }
}

/// Sort direction for `OrderBy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Result ordering for a `select`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }
}

/// What a `select` should yield per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Every stored column of the table.
    All,
    /// Post columns joined with the aggregate like count and, when a viewer
    /// is given, the viewer's like/save existence flags. Only meaningful on
    /// [`Table::Posts`]. With no viewer both flags are `false` on every row.
    FeedView { viewer: Option<UserId> },
}

/// A structured query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: Table,
    pub projection: Projection,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
}

impl Select {
    /// Selects all columns of `table`, unfiltered and unordered.
    pub fn all(table: Table) -> Self {
        Self {
            table,
            projection: Projection::All,
            filters: Vec::new(),
            order: None,
        }
    }

    /// The single feed query: posts newest-first, joined with the like
    /// aggregate and the per-viewer flags.
    pub fn feed_view(viewer: Option<&UserId>) -> Self {
        Self {
            table: Table::Posts,
            projection: Projection::FeedView {
                viewer: viewer.cloned(),
            },
            filters: Vec::new(),
            order: Some(OrderBy::descending("created_at")),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// An abstract store for record CRUD at the backend boundary.
///
/// Implementations decide how the structured arguments reach the remote
/// service (HTTP parameters, SQL binds, in-memory evaluation). Every method
/// is a suspension point; none of them block the calling thread.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts one record and returns its id.
    async fn insert(&self, table: Table, fields: Fields) -> Result<RecordId>;

    /// Deletes the records whose columns equal every entry of `matches`.
    /// Deleting zero records is not an error.
    async fn delete(&self, table: Table, matches: Fields) -> Result<()>;

    /// Runs a structured query and returns the matching rows.
    async fn select(&self, query: Select) -> Result<Vec<Record>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_names() {
        assert_eq!(Table::Posts.as_ref(), "posts");
        assert_eq!(Table::Likes.as_ref(), "likes");
        assert_eq!(Table::SavedPosts.as_ref(), "saved_posts");
        assert_eq!(Table::Comments.as_ref(), "comments");
    }

    #[test]
    fn test_fields_builder() {
        let map = fields([("post_id", json!("p1")), ("user_id", json!("u1"))]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["post_id"], json!("p1"));
    }

    #[test]
    fn test_feed_view_query_shape() {
        let viewer = UserId::new("u1");
        let query = Select::feed_view(Some(&viewer));
        assert_eq!(query.table, Table::Posts);
        assert_eq!(
            query.order,
            Some(OrderBy::descending("created_at"))
        );
        match query.projection {
            Projection::FeedView { viewer: Some(v) } => assert_eq!(v, viewer),
            other => panic!("unexpected projection: {other:?}"),
        }
    }

    #[test]
    fn test_feed_view_anonymous() {
        let query = Select::feed_view(None);
        assert!(matches!(
            query.projection,
            Projection::FeedView { viewer: None }
        ));
    }
}
