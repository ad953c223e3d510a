//! Domain model for the Signpost document pointer registry
//!
//! A document pointer is a lightweight record telling a consumer where a full
//! clinical document lives, keyed by patient identifier, owning organisation
//! and document type. This crate holds the entity itself, its parsed
//! identifier, and the pure key-derivation functions used by the storage
//! engine. Nothing here talks to a database.
//!
//! # Examples
//!
//! ```rust
//! use signpost_models::PointerId;
//!
//! let id: PointerId = "Y05868-1234567890".parse()?;
//! assert_eq!(id.partition_key(), "D#Y05868#1234567890");
//! # Ok::<(), signpost_models::Error>(())
//! ```

pub mod error;
pub mod keys;
pub mod pointer;

pub use error::{Error, Result};
pub use keys::{organisation_key, patient_key, KeyPrefix};
pub use pointer::{now_timestamp, DocumentPointer, PointerId};
