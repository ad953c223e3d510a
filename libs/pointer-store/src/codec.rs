//! Item codec: domain entity to and from the store's attribute representation

use aws_sdk_dynamodb::types::AttributeValue;
use signpost_models::DocumentPointer;

use crate::error::{Error, Result};
use crate::store::Item;

/// Encode a pointer into the store's attribute representation.
///
/// Total and deterministic. The six derived key attributes (`pk`, `sk`,
/// `pk_1`, `sk_1`, `pk_2`, `sk_2`) are recomputed from entity fields on every
/// encode; they are never stored independently.
pub fn encode(pointer: &DocumentPointer) -> Item {
    let mut item = Item::new();

    item.insert("pk".into(), AttributeValue::S(pointer.partition_key()));
    item.insert("sk".into(), AttributeValue::S(pointer.sort_key()));
    item.insert("pk_1".into(), AttributeValue::S(pointer.patient_key()));
    item.insert(
        "sk_1".into(),
        AttributeValue::S(pointer.created_on_sort_key()),
    );
    item.insert("pk_2".into(), AttributeValue::S(pointer.organisation_key()));
    item.insert(
        "sk_2".into(),
        AttributeValue::S(pointer.created_on_sort_key()),
    );

    item.insert("id".into(), AttributeValue::S(pointer.id.to_string()));
    item.insert(
        "nhs_number".into(),
        AttributeValue::S(pointer.nhs_number.clone()),
    );
    item.insert(
        "custodian".into(),
        AttributeValue::S(pointer.custodian.clone()),
    );
    if let Some(suffix) = &pointer.custodian_suffix {
        item.insert("custodian_suffix".into(), AttributeValue::S(suffix.clone()));
    }
    item.insert(
        "type".into(),
        AttributeValue::S(pointer.pointer_type.clone()),
    );
    item.insert("source".into(), AttributeValue::S(pointer.source.clone()));
    item.insert(
        "version".into(),
        AttributeValue::N(pointer.version.to_string()),
    );
    item.insert(
        "document".into(),
        AttributeValue::S(pointer.document.clone()),
    );
    item.insert(
        "created_on".into(),
        AttributeValue::S(pointer.created_on.clone()),
    );
    if let Some(updated_on) = &pointer.updated_on {
        item.insert("updated_on".into(), AttributeValue::S(updated_on.clone()));
    }

    item
}

/// Decode a stored item back into a pointer.
///
/// A missing or mistyped attribute is a [`Error::CorruptRecord`], never a
/// default: corrupt backing data must surface as an internal error, distinct
/// from "not found".
pub fn decode(item: &Item) -> Result<DocumentPointer> {
    let raw_id = required_string(item, "id")?;
    let id = raw_id
        .parse()
        .map_err(|_| Error::CorruptRecord(format!("stored id {raw_id:?} is malformed")))?;

    Ok(DocumentPointer {
        id,
        nhs_number: required_string(item, "nhs_number")?,
        custodian: required_string(item, "custodian")?,
        custodian_suffix: optional_string(item, "custodian_suffix")?,
        pointer_type: required_string(item, "type")?,
        source: required_string(item, "source")?,
        version: required_number(item, "version")?,
        document: required_string(item, "document")?,
        created_on: required_string(item, "created_on")?,
        updated_on: optional_string(item, "updated_on")?,
    })
}

fn required_string(item: &Item, name: &str) -> Result<String> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(_) => Err(Error::CorruptRecord(format!(
            "attribute {name:?} has the wrong type"
        ))),
        None => Err(Error::CorruptRecord(format!(
            "attribute {name:?} is missing"
        ))),
    }
}

fn optional_string(item: &Item, name: &str) -> Result<Option<String>> {
    match item.get(name) {
        None => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(Error::CorruptRecord(format!(
            "attribute {name:?} has the wrong type"
        ))),
    }
}

fn required_number(item: &Item, name: &str) -> Result<i64> {
    match item.get(name) {
        Some(AttributeValue::N(value)) => value.parse().map_err(|_| {
            Error::CorruptRecord(format!("attribute {name:?} is not a valid number"))
        }),
        Some(_) => Err(Error::CorruptRecord(format!(
            "attribute {name:?} has the wrong type"
        ))),
        None => Err(Error::CorruptRecord(format!(
            "attribute {name:?} is missing"
        ))),
    }
}
