//! The document pointer repository: the engine's public API

use aws_sdk_dynamodb::Client;
use signpost_models::{now_timestamp, DocumentPointer, PointerId};

use crate::codec;
use crate::dynamodb::DynamoDbStore;
use crate::error::{Error, Result};
use crate::page::{self, SearchPage};
use crate::query::{SearchQuery, PAGE_ITEM_LIMIT};
use crate::store::{table_key, PointerStore, Precondition};
use crate::supersede::SupersedeTransaction;

/// Repository for document pointer records.
///
/// Stateless and safe for concurrent callers: all consistency is pushed to
/// the backing store's conditional writes and transactions, and there is no
/// cache and no cross-call session state. Two concurrent `create` calls on
/// the same key race on the store's precondition; exactly one wins and the
/// other observes [`Error::Duplicate`].
#[derive(Debug, Clone)]
pub struct DocumentPointerRepository<S> {
    store: S,
}

impl DocumentPointerRepository<DynamoDbStore> {
    /// Repository over a DynamoDB table.
    ///
    /// The client should be created once per process and shared; request
    /// timeouts are taken from its configuration.
    pub fn dynamodb(client: Client, table_name: impl Into<String>) -> Self {
        Self::new(DynamoDbStore::new(client, table_name))
    }
}

impl<S: PointerStore> DocumentPointerRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store this repository talks to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a pointer. Fails with [`Error::Duplicate`] when the primary
    /// key already exists.
    pub async fn create(&self, pointer: &DocumentPointer) -> Result<()> {
        tracing::info!(id = %pointer.id, nhs_number = %pointer.nhs_number, "Creating document pointer");

        self.store
            .put_item(codec::encode(pointer), Precondition::Absent)
            .await
            .map_err(|err| match err {
                Error::PreconditionFailed(_) => Error::Duplicate(pointer.id.to_string()),
                other => other,
            })
    }

    /// Fetch a single pointer by id. Absence is `Ok(None)`, not an error;
    /// more than one item under the key is a fatal integrity error.
    pub async fn read_by_id(&self, id: &str) -> Result<Option<DocumentPointer>> {
        let id: PointerId = id.parse()?;
        let partition_key = id.partition_key();

        let items = self.store.query_primary(&partition_key).await?;
        match items.as_slice() {
            [] => Ok(None),
            [item] => Ok(Some(codec::decode(item)?)),
            _ => Err(Error::MultipleItems(partition_key)),
        }
    }

    /// Update an existing pointer in place: same key, `updated_on` bumped,
    /// `created_on` preserved. Returns the entity as stored.
    pub async fn update(&self, mut pointer: DocumentPointer) -> Result<DocumentPointer> {
        pointer.updated_on = Some(now_timestamp());
        tracing::info!(id = %pointer.id, "Updating document pointer");

        self.store
            .put_item(codec::encode(&pointer), Precondition::Present)
            .await
            .map_err(|err| match err {
                Error::PreconditionFailed(_) => Error::PreconditionFailed(format!(
                    "cannot update {}: no such pointer",
                    pointer.id
                )),
                other => other,
            })?;
        Ok(pointer)
    }

    /// Physically delete a pointer. Fails when the key does not exist.
    pub async fn delete(&self, pointer: &DocumentPointer) -> Result<()> {
        tracing::info!(id = %pointer.id, "Deleting document pointer");
        self.store
            .delete_item(table_key(&pointer.partition_key()), Precondition::Present)
            .await
    }

    /// Physically delete a pointer by raw id.
    ///
    /// With `ignore_failure` set, a precondition violation (key absent) is
    /// swallowed; this is the best-effort path supersede uses. Everything
    /// else propagates.
    pub async fn delete_by_id(&self, id: &str, ignore_failure: bool) -> Result<()> {
        let id: PointerId = id.parse()?;

        let result = self
            .store
            .delete_item(table_key(&id.partition_key()), Precondition::Present)
            .await;
        match result {
            Err(Error::PreconditionFailed(reason)) if ignore_failure => {
                tracing::warn!(id = %id, reason = %reason, "Ignoring failed pointer delete");
                Ok(())
            }
            other => other,
        }
    }

    /// One page of search results, resuming from `page_token` when given.
    ///
    /// The store applies filters after paging, so this scrolls the store
    /// until the page fills or the continuation key is exhausted; it never
    /// stops on a filter-emptied page. A returned token means more data may
    /// exist; the final call returns none.
    pub async fn search(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let mut start_key = page_token.map(page::decode_page_token).transpose()?;
        let mut items: Vec<DocumentPointer> = Vec::new();

        loop {
            let raw_page = self.store.query_page(query, start_key.take()).await?;

            let mut raw_items = raw_page.items.into_iter().peekable();
            while items.len() < PAGE_ITEM_LIMIT {
                match raw_items.next() {
                    Some(raw) => items.push(codec::decode(&raw)?),
                    None => break,
                }
            }

            let page_full = items.len() == PAGE_ITEM_LIMIT;
            let more_in_store = raw_items.peek().is_some() || raw_page.last_evaluated_key.is_some();

            if page_full && more_in_store {
                // Cut mid-scroll: resume from the last item we actually
                // returned, not from the store's own page boundary.
                if let Some(last) = items.last() {
                    let key = page::continuation_key(last, query);
                    let next_page_token = Some(page::encode_page_token(&key)?);
                    return Ok(SearchPage {
                        items,
                        next_page_token,
                    });
                }
            }

            match raw_page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => {
                    return Ok(SearchPage {
                        items,
                        next_page_token: None,
                    })
                }
            }
        }
    }

    /// Number of pointers matching `query`, without materialising items.
    pub async fn count(&self, query: &SearchQuery) -> Result<u64> {
        self.store.count(query).await
    }

    /// Atomically create `pointer` and delete every pointer in `delete_ids`.
    ///
    /// The whole batch commits or nothing does. Before assembling it, each
    /// delete target is read back and must still exist with the replacement
    /// pointer's `nhs_number` and type; with `ignore_delete_fail` set, a
    /// target failing that guard is omitted from the delete set instead of
    /// blocking the create. The guard runs outside the transaction, so the
    /// in-transaction delete preconditions remain the last word.
    pub async fn supersede(
        &self,
        pointer: &DocumentPointer,
        delete_ids: &[String],
        ignore_delete_fail: bool,
    ) -> Result<()> {
        // Ceiling first: over-large batches must fail before any store round
        // trip, including the guard reads below.
        SupersedeTransaction::check_ceiling(delete_ids.len())?;

        let mut delete_keys = Vec::with_capacity(delete_ids.len());
        for raw_id in delete_ids {
            let id: PointerId = raw_id.parse()?;
            match self.read_by_id(raw_id).await? {
                Some(existing)
                    if existing.nhs_number == pointer.nhs_number
                        && existing.pointer_type == pointer.pointer_type =>
                {
                    delete_keys.push(id.partition_key());
                }
                Some(_) if ignore_delete_fail => {
                    tracing::warn!(id = %id, "Skipping supersede target with mismatched details");
                }
                None if ignore_delete_fail => {
                    tracing::warn!(id = %id, "Skipping missing supersede target");
                }
                Some(_) => {
                    return Err(Error::PreconditionFailed(format!(
                        "supersede target {id} does not match the replacement pointer"
                    )))
                }
                None => {
                    return Err(Error::PreconditionFailed(format!(
                        "supersede target {id} does not exist"
                    )))
                }
            }
        }

        let transaction = SupersedeTransaction::build(pointer, &delete_keys)?;
        tracing::info!(
            id = %pointer.id,
            deletes = delete_keys.len(),
            "Submitting supersede transaction"
        );

        self.store
            .transact_write(transaction.into_operations())
            .await
            .map_err(|err| match err {
                Error::PreconditionFailed(_) => Error::Duplicate(pointer.id.to_string()),
                other => other,
            })
    }
}
