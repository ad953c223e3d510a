//! Search pages and opaque continuation tokens
//!
//! A continuation token is the store's last-evaluated key, carried as
//! URL-safe base64 over its JSON string map. The contents are pass-through
//! state: the engine encodes and decodes the envelope but never interprets
//! what is inside it.

use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::AttributeValue;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use signpost_models::DocumentPointer;

use crate::error::{Error, Result};
use crate::query::SearchQuery;
use crate::store::Key;

/// One page of search results.
#[derive(Debug)]
pub struct SearchPage {
    pub items: Vec<DocumentPointer>,
    /// Token resuming the scroll; `None` on the final page.
    pub next_page_token: Option<String>,
}

/// Encode a store key as an opaque continuation token.
pub(crate) fn encode_page_token(key: &Key) -> Result<String> {
    let mut plain = BTreeMap::new();
    for (name, value) in key {
        let AttributeValue::S(value) = value else {
            return Err(Error::CorruptRecord(format!(
                "non-string key attribute {name:?}"
            )));
        };
        plain.insert(name.clone(), value.clone());
    }

    let json = serde_json::to_vec(&plain).map_err(|_| Error::InvalidContinuationToken)?;
    Ok(URL_SAFE.encode(json))
}

/// Decode a continuation token back into a store key.
pub(crate) fn decode_page_token(token: &str) -> Result<Key> {
    let bytes = URL_SAFE
        .decode(token)
        .map_err(|_| Error::InvalidContinuationToken)?;
    let plain: BTreeMap<String, String> =
        serde_json::from_slice(&bytes).map_err(|_| Error::InvalidContinuationToken)?;

    Ok(plain
        .into_iter()
        .map(|(name, value)| (name, AttributeValue::S(value)))
        .collect())
}

/// Synthesise the start key that resumes a scroll immediately after
/// `pointer`, for the index `query` runs against.
///
/// Used when a page is cut mid-scroll: the store's own last-evaluated key
/// points at the end of the raw page, not at the last item we returned.
pub(crate) fn continuation_key(pointer: &DocumentPointer, query: &SearchQuery) -> Key {
    Key::from([
        ("pk".to_string(), AttributeValue::S(pointer.partition_key())),
        ("sk".to_string(), AttributeValue::S(pointer.sort_key())),
        (
            query.key_attribute().to_string(),
            AttributeValue::S(query.index_partition_value(pointer)),
        ),
        (
            query.sort_attribute().to_string(),
            AttributeValue::S(pointer.created_on_sort_key()),
        ),
    ])
}
