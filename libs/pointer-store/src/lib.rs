//! Storage and query engine for the Signpost document pointer registry
//!
//! This crate is the engine behind every read, search, create, update,
//! delete and supersede of a document pointer: key derivation and the item
//! codec at the bottom, a query builder with opaque pagination above them,
//! and a repository plus supersede coordinator on top. It owns no wire
//! protocol and no file format; upstream entry points hand it fully
//! validated entities and it talks to a DynamoDB-shaped backing store.
//!
//! # Examples
//!
//! ```ignore
//! use signpost_store::{DocumentPointerRepository, SearchQuery};
//!
//! let config = aws_config::load_from_env().await;
//! let client = aws_sdk_dynamodb::Client::new(&config);
//! let repository = DocumentPointerRepository::dynamodb(client, "document-pointer");
//!
//! let page = repository
//!     .search(&SearchQuery::for_patient("9278693472"), None)
//!     .await?;
//! ```

pub mod codec;
pub mod dynamodb;
pub mod error;
pub mod page;
pub mod query;
pub mod repository;
pub mod store;
mod supersede;

pub use dynamodb::DynamoDbStore;
pub use error::{Error, Result};
pub use page::SearchPage;
pub use query::{SearchQuery, PAGE_ITEM_LIMIT};
pub use repository::DocumentPointerRepository;
pub use store::{table_key, Item, Key, PointerStore, Precondition, QueryPage, WriteOperation};
pub use supersede::MAX_TRANSACT_ITEMS;

// Re-export the model types for convenience.
pub use signpost_models::{DocumentPointer, PointerId};
