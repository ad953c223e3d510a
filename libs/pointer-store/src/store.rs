//! The seam between the repository and the backing store
//!
//! The engine talks to its backing store through [`PointerStore`], the minimal
//! set of primitives the repository needs: conditional single-item writes,
//! a point lookup by table partition key, paged secondary-index queries, a
//! count that never materialises items, and a bounded atomic multi-item write.
//! Production uses the DynamoDB implementation; tests substitute an in-memory
//! double behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::query::SearchQuery;
use crate::Result;

/// A stored item in the backing store's typed attribute representation.
pub type Item = HashMap<String, AttributeValue>;

/// A table or index key in attribute representation.
pub type Key = HashMap<String, AttributeValue>;

/// Conditional-write precondition on the table key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The key must not exist yet (create).
    Absent,
    /// The key must already exist (update, delete).
    Present,
}

impl Precondition {
    pub(crate) fn expression(&self) -> &'static str {
        match self {
            Precondition::Absent => "attribute_not_exists(pk) AND attribute_not_exists(sk)",
            Precondition::Present => "attribute_exists(pk) AND attribute_exists(sk)",
        }
    }
}

/// One entry in an atomic multi-item write.
#[derive(Debug, Clone)]
pub enum WriteOperation {
    Put {
        item: Item,
        precondition: Precondition,
    },
    Delete {
        key: Key,
        precondition: Precondition,
    },
}

/// One raw page from a secondary-index query.
#[derive(Debug, Default)]
pub struct QueryPage {
    /// Items surviving the store-side filter for this page. May be empty even
    /// when later pages hold matches.
    pub items: Vec<Item>,
    /// Present while the store has more data to scroll. Opaque pass-through
    /// state; the engine hands it back unchanged.
    pub last_evaluated_key: Option<Key>,
}

/// Table key pair for a partition key. The table keys one item per pointer,
/// with `sk` equal to `pk`.
pub fn table_key(partition_key: &str) -> Key {
    Key::from([
        (
            "pk".to_string(),
            AttributeValue::S(partition_key.to_string()),
        ),
        (
            "sk".to_string(),
            AttributeValue::S(partition_key.to_string()),
        ),
    ])
}

/// Backing-store primitives the engine is built on.
///
/// Implementations perform one synchronous round trip per call and push all
/// consistency onto the store's native conditional-write and transaction
/// machinery; the engine holds no locks and no cache. A violated precondition
/// surfaces as [`Error::PreconditionFailed`](crate::Error::PreconditionFailed);
/// transport and throttling failures as
/// [`Error::BackingStore`](crate::Error::BackingStore). Nothing is retried.
#[async_trait]
pub trait PointerStore: Send + Sync {
    /// Write one item, subject to `precondition` on its table key pair.
    async fn put_item(&self, item: Item, precondition: Precondition) -> Result<()>;

    /// Delete one item, subject to `precondition` on its table key pair.
    async fn delete_item(&self, key: Key, precondition: Precondition) -> Result<()>;

    /// All items stored under one table partition key.
    async fn query_primary(&self, partition_key: &str) -> Result<Vec<Item>>;

    /// One page of a secondary-index query, resuming from `start_key`.
    ///
    /// The store applies filters after paging, so the returned page may be
    /// empty while `last_evaluated_key` still points at further matches.
    async fn query_page(&self, query: &SearchQuery, start_key: Option<Key>) -> Result<QueryPage>;

    /// Number of items matching `query`, without materialising them.
    async fn count(&self, query: &SearchQuery) -> Result<u64>;

    /// Submit `operations` as a single all-or-nothing transaction.
    async fn transact_write(&self, operations: Vec<WriteOperation>) -> Result<()>;
}
