//! Supersede transaction assembly
//!
//! Supersede replaces many pointers with one: a single all-or-nothing batch
//! of one "put, fail if exists" plus one "delete, fail if absent" per target
//! key. The lifecycle is Building (here) then Submitting (the store's
//! transactional write): a committed batch makes the new pointer visible and
//! removes every target in one step, and a cancelled batch changes nothing.
//! There is no observable intermediate state.

use signpost_models::DocumentPointer;

use crate::codec;
use crate::error::{Error, Result};
use crate::store::{table_key, Precondition, WriteOperation};

/// The store's transaction size ceiling.
pub const MAX_TRANSACT_ITEMS: usize = 100;

/// A fully built supersede batch, ready to submit.
pub(crate) struct SupersedeTransaction {
    operations: Vec<WriteOperation>,
}

impl SupersedeTransaction {
    /// Fail fast when one put plus `delete_count` deletes would exceed the
    /// transaction ceiling. Called before any store round trip; the batch is
    /// never truncated to fit.
    pub(crate) fn check_ceiling(delete_count: usize) -> Result<()> {
        let count = delete_count + 1;
        if count > MAX_TRANSACT_ITEMS {
            return Err(Error::TooManyItems {
                count,
                limit: MAX_TRANSACT_ITEMS,
            });
        }
        Ok(())
    }

    /// Package the creation of `pointer` and the deletion of `delete_keys`
    /// as one atomic batch.
    pub(crate) fn build(pointer: &DocumentPointer, delete_keys: &[String]) -> Result<Self> {
        Self::check_ceiling(delete_keys.len())?;

        let mut operations = Vec::with_capacity(delete_keys.len() + 1);
        operations.push(WriteOperation::Put {
            item: codec::encode(pointer),
            precondition: Precondition::Absent,
        });
        for key in delete_keys {
            operations.push(WriteOperation::Delete {
                key: table_key(key),
                precondition: Precondition::Present,
            });
        }

        Ok(Self { operations })
    }

    pub(crate) fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }
}
