//! DynamoDB implementation of the storage seam

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, Select, TransactWriteItem};
use aws_sdk_dynamodb::Client;

use crate::error::{Error, Result};
use crate::query::{SearchQuery, PAGE_ITEM_LIMIT};
use crate::store::{Item, Key, PointerStore, Precondition, QueryPage, WriteOperation};

/// Store backed by a DynamoDB table with two global secondary indexes:
/// `idx_gsi_1` keyed on `pk_1`/`sk_1` (patient axis) and `idx_gsi_2` on
/// `pk_2`/`sk_2` (custodian axis).
///
/// The client is injected and shared: create it once per process and reuse
/// it everywhere. Request timeouts are whatever the client was configured
/// with; a timeout surfaces as [`Error::BackingStore`] and is not retried
/// here.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl PointerStore for DynamoDbStore {
    async fn put_item(&self, item: Item, precondition: Precondition) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression(precondition.expression())
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Error::PreconditionFailed(format!(
                        "conditional put rejected: {}",
                        precondition.expression()
                    ))
                } else {
                    Error::backing_store(err)
                }
            })?;
        Ok(())
    }

    async fn delete_item(&self, key: Key, precondition: Precondition) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .condition_expression(precondition.expression())
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Error::PreconditionFailed(format!(
                        "conditional delete rejected: {}",
                        precondition.expression()
                    ))
                } else {
                    Error::backing_store(err)
                }
            })?;
        Ok(())
    }

    async fn query_primary(&self, partition_key: &str) -> Result<Vec<Item>> {
        tracing::debug!(table = %self.table_name, partition_key = %partition_key, "Querying table key");

        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("pk = :pk")
            .expression_attribute_values(":pk", AttributeValue::S(partition_key.to_string()))
            .send()
            .await
            .map_err(|err| Error::backing_store(err.into_service_error()))?;

        Ok(output.items.unwrap_or_default())
    }

    async fn query_page(&self, query: &SearchQuery, start_key: Option<Key>) -> Result<QueryPage> {
        tracing::debug!(
            table = %self.table_name,
            index = query.index_name(),
            partition_key = query.partition_key(),
            filter = query.filter_expression().as_deref().unwrap_or(""),
            "Querying secondary index"
        );

        let mut request = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(query.index_name())
            .limit(PAGE_ITEM_LIMIT as i32)
            .key_condition_expression(query.key_condition_expression())
            .set_expression_attribute_values(Some(query.expression_attribute_values()))
            .set_expression_attribute_names(query.expression_attribute_names())
            .set_exclusive_start_key(start_key);
        if let Some(filter) = query.filter_expression() {
            request = request.filter_expression(filter);
        }

        let output = request
            .send()
            .await
            .map_err(|err| Error::backing_store(err.into_service_error()))?;

        Ok(QueryPage {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn count(&self, query: &SearchQuery) -> Result<u64> {
        let mut total = 0u64;
        let mut start_key: Option<Key> = None;

        // Counts page like everything else; scroll to the end so the result
        // covers the whole partition.
        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(query.index_name())
                .select(Select::Count)
                .key_condition_expression(query.key_condition_expression())
                .set_expression_attribute_values(Some(query.expression_attribute_values()))
                .set_expression_attribute_names(query.expression_attribute_names())
                .set_exclusive_start_key(start_key.take());
            if let Some(filter) = query.filter_expression() {
                request = request.filter_expression(filter);
            }

            let output = request
                .send()
                .await
                .map_err(|err| Error::backing_store(err.into_service_error()))?;

            total += output.count.max(0) as u64;
            match output.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        Ok(total)
    }

    async fn transact_write(&self, operations: Vec<WriteOperation>) -> Result<()> {
        let mut transact_items = Vec::with_capacity(operations.len());
        for operation in operations {
            let entry = match operation {
                WriteOperation::Put { item, precondition } => {
                    let put = Put::builder()
                        .table_name(&self.table_name)
                        .set_item(Some(item))
                        .condition_expression(precondition.expression())
                        .build()
                        .map_err(Error::backing_store)?;
                    TransactWriteItem::builder().put(put).build()
                }
                WriteOperation::Delete { key, precondition } => {
                    let delete = Delete::builder()
                        .table_name(&self.table_name)
                        .set_key(Some(key))
                        .condition_expression(precondition.expression())
                        .build()
                        .map_err(Error::backing_store)?;
                    TransactWriteItem::builder().delete(delete).build()
                }
            };
            transact_items.push(entry);
        }

        self.client
            .transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_transaction_canceled_exception() {
                    Error::PreconditionFailed(
                        "transaction cancelled by a failed condition check".to_string(),
                    )
                } else {
                    Error::backing_store(err)
                }
            })?;
        Ok(())
    }
}
