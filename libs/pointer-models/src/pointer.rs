//! The `DocumentPointer` entity and its parsed identifier

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parsed identity of a document pointer.
///
/// The wire form is `"{producer_id}-{document_id}"`, where the producer id is
/// one or two `.`-separated ODS code segments (e.g. `Y05868` or `Y05868.CBS`).
/// Parsing is the only place a malformed id can be observed; once constructed,
/// every key derivation on the id is total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PointerId {
    producer_id: String,
    document_id: String,
}

impl PointerId {
    /// The producer (owning organisation) portion of the id, ODS separators included.
    pub fn producer_id(&self) -> &str {
        &self.producer_id
    }

    /// The producer-scoped document identifier portion of the id.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The producer id split into its ODS code segments.
    pub fn ods_code_parts(&self) -> impl Iterator<Item = &str> {
        self.producer_id.split('.')
    }
}

impl FromStr for PointerId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let malformed = || Error::MalformedIdentifier(value.to_string());

        let (producer_id, document_id) = value.split_once('-').ok_or_else(malformed)?;
        if producer_id.is_empty() || document_id.is_empty() {
            return Err(malformed());
        }

        let ods_code_parts: Vec<&str> = producer_id.split('.').collect();
        if ods_code_parts.len() > 2 || ods_code_parts.iter().any(|part| part.is_empty()) {
            return Err(malformed());
        }

        Ok(Self {
            producer_id: producer_id.to_string(),
            document_id: document_id.to_string(),
        })
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.producer_id, self.document_id)
    }
}

impl TryFrom<String> for PointerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PointerId> for String {
    fn from(id: PointerId) -> Self {
        id.to_string()
    }
}

/// A document pointer: the registry record describing where a clinical
/// document lives, not the document itself.
///
/// Upstream callers construct these from fully validated inbound resources;
/// the storage engine treats the fields as already well-formed. `document` is
/// an opaque payload carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPointer {
    pub id: PointerId,
    pub nhs_number: String,
    pub custodian: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custodian_suffix: Option<String>,
    /// Document type as `"<system>|<code>"`.
    #[serde(rename = "type")]
    pub pointer_type: String,
    pub source: String,
    pub version: i64,
    pub document: String,
    pub created_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,
}

/// Current UTC instant as an RFC 3339 string with millisecond precision and a
/// trailing `Z`, the format used for `created_on`/`updated_on`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
