//! Key derivation for the backing store
//!
//! Every stored item carries six derived key attributes: the table key pair
//! (`pk`, `sk`), the patient index pair (`pk_1`, `sk_1`) and the organisation
//! index pair (`pk_2`, `sk_2`). None of them are stored independently in the
//! entity; they are recomputed from entity fields on every encode. All
//! derivations here are total string concatenations.

use std::fmt;

use crate::pointer::{DocumentPointer, PointerId};

/// Typed prefixes for derived keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    DocumentPointer,
    Patient,
    Organisation,
    CreatedOn,
}

impl KeyPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyPrefix::DocumentPointer => "D",
            KeyPrefix::Patient => "P",
            KeyPrefix::Organisation => "O",
            KeyPrefix::CreatedOn => "CO",
        }
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient index partition key: `P#<nhs_number>`.
pub fn patient_key(nhs_number: &str) -> String {
    format!("{}#{}", KeyPrefix::Patient, nhs_number)
}

/// Organisation index partition key: `O#<custodian>` or
/// `O#<custodian>#<custodian_suffix>`.
pub fn organisation_key(custodian: &str, custodian_suffix: Option<&str>) -> String {
    match custodian_suffix {
        Some(suffix) => format!("{}#{}#{}", KeyPrefix::Organisation, custodian, suffix),
        None => format!("{}#{}", KeyPrefix::Organisation, custodian),
    }
}

impl PointerId {
    /// Table partition key: `D#<ods code parts>#<document_id>`.
    pub fn partition_key(&self) -> String {
        let mut segments = vec![KeyPrefix::DocumentPointer.as_str()];
        segments.extend(self.ods_code_parts());
        segments.push(self.document_id());
        segments.join("#")
    }
}

impl DocumentPointer {
    /// Table partition key, derived from the pointer id.
    pub fn partition_key(&self) -> String {
        self.id.partition_key()
    }

    /// Table sort key. The table keys one item per pointer, so this is the
    /// partition key again.
    pub fn sort_key(&self) -> String {
        self.partition_key()
    }

    /// Patient index partition key (`pk_1`).
    pub fn patient_key(&self) -> String {
        patient_key(&self.nhs_number)
    }

    /// Organisation index partition key (`pk_2`).
    pub fn organisation_key(&self) -> String {
        organisation_key(&self.custodian, self.custodian_suffix.as_deref())
    }

    /// Shared sort key for both secondary indexes (`sk_1`, `sk_2`):
    /// `CO#<created_on>#<custodian>[#<custodian_suffix>]#<document_id>`.
    ///
    /// Leading with `created_on` keeps both search axes scrolling in
    /// creation-time order.
    pub fn created_on_sort_key(&self) -> String {
        let mut segments = vec![
            KeyPrefix::CreatedOn.as_str(),
            self.created_on.as_str(),
            self.custodian.as_str(),
        ];
        if let Some(suffix) = self.custodian_suffix.as_deref() {
            segments.push(suffix);
        }
        segments.push(self.id.document_id());
        segments.join("#")
    }
}
