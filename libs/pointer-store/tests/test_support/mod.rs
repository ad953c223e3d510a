//! In-memory `PointerStore` used by the integration tests
//!
//! Mimics the backing-store semantics the engine depends on: conditional
//! writes on the table key pair, paged secondary-index queries where filters
//! apply AFTER paging (so a page can be empty while later pages hold
//! matches), and all-or-nothing transactional writes. It also counts store
//! round trips so tests can assert an operation never reached the network.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use signpost_store::{
    DocumentPointer, Error, Item, Key, PointerStore, Precondition, QueryPage, Result, SearchQuery,
    WriteOperation,
};

/// Raw items per underlying page; small so a handful of records spans
/// several pages.
pub const UNDERLYING_PAGE_SIZE: usize = 3;

pub struct InMemoryStore {
    /// Items keyed by the full table key pair, in native key order.
    items: Mutex<BTreeMap<(String, String), Item>>,
    page_size: usize,
    calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(UNDERLYING_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            page_size,
            calls: AtomicUsize::new(0),
        }
    }

    /// Store round trips made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn contains(&self, partition_key: &str) -> bool {
        self.items
            .lock()
            .unwrap()
            .keys()
            .any(|(pk, _)| pk == partition_key)
    }

    /// Insert a raw item directly, bypassing preconditions. Used to seed
    /// states the engine itself would refuse to create.
    pub fn insert_raw(&self, item: Item) {
        let table_key = (
            string_attr(&item, "pk").expect("item missing pk"),
            string_attr(&item, "sk").expect("item missing sk"),
        );
        self.items.lock().unwrap().insert(table_key, item);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn string_attr(item: &Item, name: &str) -> Option<String> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Some(value.clone()),
        _ => None,
    }
}

fn table_key_of(item: &Item) -> (String, String) {
    (
        string_attr(item, "pk").expect("item missing pk"),
        string_attr(item, "sk").expect("item missing sk"),
    )
}

fn check_precondition(
    items: &BTreeMap<(String, String), Item>,
    table_key: &(String, String),
    precondition: Precondition,
) -> Result<()> {
    let exists = items.contains_key(table_key);
    match precondition {
        Precondition::Absent if exists => Err(Error::PreconditionFailed(format!(
            "key {:?} already exists",
            table_key.0
        ))),
        Precondition::Present if !exists => Err(Error::PreconditionFailed(format!(
            "key {:?} does not exist",
            table_key.0
        ))),
        _ => Ok(()),
    }
}

fn matches_filters(item: &Item, query: &SearchQuery) -> bool {
    if !query.pointer_types().is_empty() {
        match string_attr(item, "type") {
            Some(pointer_type) if query.pointer_types().contains(&pointer_type) => {}
            _ => return false,
        }
    }
    if let Some(custodian) = query.custodian() {
        if string_attr(item, "custodian").as_deref() != Some(custodian) {
            return false;
        }
    }
    if let Some(nhs_number) = query.nhs_number() {
        if string_attr(item, "nhs_number").as_deref() != Some(nhs_number) {
            return false;
        }
    }
    true
}

fn index_key_of(item: &Item, query: &SearchQuery) -> Key {
    let mut key = Key::new();
    for name in ["pk", "sk", query.key_attribute(), query.sort_attribute()] {
        let value = string_attr(item, name).expect("item missing index attribute");
        key.insert(name.to_string(), AttributeValue::S(value));
    }
    key
}

#[async_trait]
impl PointerStore for InMemoryStore {
    async fn put_item(&self, item: Item, precondition: Precondition) -> Result<()> {
        self.record_call();
        let mut items = self.items.lock().unwrap();
        let table_key = table_key_of(&item);
        check_precondition(&items, &table_key, precondition)?;
        items.insert(table_key, item);
        Ok(())
    }

    async fn delete_item(&self, key: Key, precondition: Precondition) -> Result<()> {
        self.record_call();
        let mut items = self.items.lock().unwrap();
        let table_key = table_key_of(&key);
        check_precondition(&items, &table_key, precondition)?;
        items.remove(&table_key);
        Ok(())
    }

    async fn query_primary(&self, partition_key: &str) -> Result<Vec<Item>> {
        self.record_call();
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|((pk, _), _)| pk == partition_key)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn query_page(&self, query: &SearchQuery, start_key: Option<Key>) -> Result<QueryPage> {
        self.record_call();
        let items = self.items.lock().unwrap();

        // All partition matches, in index (sort key) order.
        let mut matches: Vec<&Item> = items
            .values()
            .filter(|item| {
                string_attr(item, query.key_attribute()).as_deref() == Some(query.partition_key())
            })
            .collect();
        matches.sort_by_key(|item| {
            (
                string_attr(item, query.sort_attribute()),
                string_attr(item, "pk"),
            )
        });

        // Resume strictly after the item the start key points at.
        let start_index = match &start_key {
            Some(key) => {
                let start_pk = string_attr(key, "pk");
                matches
                    .iter()
                    .position(|item| string_attr(item, "pk") == start_pk)
                    .map(|index| index + 1)
                    .unwrap_or(0)
            }
            None => 0,
        };

        let raw_page: Vec<&Item> = matches[start_index.min(matches.len())..]
            .iter()
            .take(self.page_size)
            .copied()
            .collect();
        let more = start_index + raw_page.len() < matches.len();
        let last_evaluated_key = if more {
            raw_page.last().map(|item| index_key_of(item, query))
        } else {
            None
        };

        // Filters are applied after paging: the page may come back empty
        // while the last evaluated key still points onwards.
        let filtered = raw_page
            .into_iter()
            .filter(|item| matches_filters(item, query))
            .cloned()
            .collect();

        Ok(QueryPage {
            items: filtered,
            last_evaluated_key,
        })
    }

    async fn count(&self, query: &SearchQuery) -> Result<u64> {
        self.record_call();
        let items = self.items.lock().unwrap();
        let count = items
            .values()
            .filter(|item| {
                string_attr(item, query.key_attribute()).as_deref() == Some(query.partition_key())
            })
            .filter(|item| matches_filters(item, query))
            .count();
        Ok(count as u64)
    }

    async fn transact_write(&self, operations: Vec<WriteOperation>) -> Result<()> {
        self.record_call();
        let mut items = self.items.lock().unwrap();

        // Validate every precondition before touching anything: the batch
        // commits fully or not at all.
        for operation in &operations {
            match operation {
                WriteOperation::Put { item, precondition } => {
                    check_precondition(&items, &table_key_of(item), *precondition)?;
                }
                WriteOperation::Delete { key, precondition } => {
                    check_precondition(&items, &table_key_of(key), *precondition)?;
                }
            }
        }
        for operation in operations {
            match operation {
                WriteOperation::Put { item, .. } => {
                    items.insert(table_key_of(&item), item);
                }
                WriteOperation::Delete { key, .. } => {
                    items.remove(&table_key_of(&key));
                }
            }
        }
        Ok(())
    }
}

/// A pointer with plausible defaults for tests.
pub fn pointer(id: &str, nhs_number: &str) -> DocumentPointer {
    DocumentPointer {
        id: id.parse().expect("test pointer id must parse"),
        nhs_number: nhs_number.to_string(),
        custodian: "Y05868".to_string(),
        custodian_suffix: None,
        pointer_type: "http://snomed.info/sct|736253002".to_string(),
        source: "NRLF".to_string(),
        version: 1,
        document: r#"{"resourceType":"DocumentReference"}"#.to_string(),
        created_on: "2024-03-01T12:00:00.000Z".to_string(),
        updated_on: None,
    }
}
