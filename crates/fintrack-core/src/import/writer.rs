//! Batched persistence of import candidates

use tracing::debug;

use crate::error::Result;
use crate::models::NewTransaction;

/// Outcome of storing a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored; contains the new row id
    Inserted(i64),
    /// Another row for the same user already carries this fingerprint
    Duplicate,
}

/// Where imported transactions end up
///
/// Implementations must treat a conflict on `(user_id, fingerprint)` as a
/// duplicate and report every other failure as an error.
pub trait TransactionStore {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome>;

    /// Store a group atomically; returns how many rows were new
    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<usize>;
}

/// Counts for one flushed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub attempted: usize,
    pub inserted: usize,
}

impl BatchResult {
    pub fn duplicates(&self) -> usize {
        self.attempted - self.inserted
    }
}

/// Buffers candidates and hands them to the store `batch_size` at a time
pub struct BatchWriter<'a, S: TransactionStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    pending: Vec<NewTransaction>,
}

impl<'a, S: TransactionStore + ?Sized> BatchWriter<'a, S> {
    /// `batch_size` below 1 is treated as 1
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Vec::with_capacity(batch_size),
        }
    }

    /// Queue a candidate, flushing when the batch is full
    pub fn push(&mut self, tx: NewTransaction) -> Result<Option<BatchResult>> {
        self.pending.push(tx);
        if self.pending.len() >= self.batch_size {
            return self.flush();
        }
        Ok(None)
    }

    /// Store whatever is queued; `None` when nothing was pending
    pub fn flush(&mut self) -> Result<Option<BatchResult>> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let attempted = self.pending.len();
        let inserted = self.store.insert_batch(&self.pending)?;
        self.pending.clear();

        debug!(attempted, inserted, "Flushed import batch");
        Ok(Some(BatchResult {
            attempted,
            inserted,
        }))
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryStore;

    fn candidate(n: usize) -> NewTransaction {
        crate::test_utils::candidate(1, &format!("row {}", n), "-1.00")
    }

    #[test]
    fn test_batches_of_configured_size() {
        let store = MemoryStore::default();
        let mut writer = BatchWriter::new(&store, 100);

        let mut flushed = Vec::new();
        for n in 0..250 {
            if let Some(batch) = writer.push(candidate(n)).unwrap() {
                flushed.push(batch.attempted);
            }
        }
        assert_eq!(writer.pending(), 50);
        if let Some(batch) = writer.flush().unwrap() {
            flushed.push(batch.attempted);
        }

        assert_eq!(flushed, vec![100, 100, 50]);
        assert_eq!(store.batch_sizes(), vec![100, 100, 50]);
        assert_eq!(store.len(), 250);
    }

    #[test]
    fn test_zero_batch_size_means_one() {
        let store = MemoryStore::default();
        let mut writer = BatchWriter::new(&store, 0);
        assert!(writer.push(candidate(1)).unwrap().is_some());
        assert!(writer.flush().unwrap().is_none());
    }

    #[test]
    fn test_duplicates_counted_per_batch() {
        let store = MemoryStore::default();
        let mut writer = BatchWriter::new(&store, 10);

        writer.push(candidate(1)).unwrap();
        writer.push(candidate(1)).unwrap();
        writer.push(candidate(2)).unwrap();
        let batch = writer.flush().unwrap().unwrap();

        assert_eq!(batch.attempted, 3);
        assert_eq!(batch.inserted, 2);
        assert_eq!(batch.duplicates(), 1);
    }

    #[test]
    fn test_store_failure_propagates() {
        let store = MemoryStore::failing();
        let mut writer = BatchWriter::new(&store, 2);
        writer.push(candidate(1)).unwrap();
        assert!(writer.push(candidate(2)).is_err());
    }
}
