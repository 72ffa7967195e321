//! Test utilities for fintrack-core
//!
//! An in-memory `TransactionStore` that records every batch it receives, so
//! import tests can assert on batching without a database.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::import::{fingerprint, InsertOutcome, TransactionStore};
use crate::models::NewTransaction;

#[derive(Default)]
struct State {
    keys: HashSet<(i64, String)>,
    rows: Vec<NewTransaction>,
    batches: Vec<usize>,
}

/// In-memory store with the same dedup rule as the database
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail: bool,
}

impl MemoryStore {
    /// A store whose every write fails with a storage error
    pub fn failing() -> Self {
        Self {
            state: Mutex::default(),
            fail: true,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sizes of the batches received so far, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.lock().batches.clone()
    }

    pub fn rows(&self) -> Vec<NewTransaction> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(Error::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
                Some("simulated storage failure".into()),
            )));
        }
        Ok(())
    }
}

fn insert(state: &mut State, tx: &NewTransaction) -> bool {
    if let Some(fp) = &tx.fingerprint {
        if !state.keys.insert((tx.user_id, fp.clone())) {
            return false;
        }
    }
    state.rows.push(tx.clone());
    true
}

impl TransactionStore for MemoryStore {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome> {
        self.check()?;
        let mut state = self.lock();
        if insert(&mut state, tx) {
            Ok(InsertOutcome::Inserted(state.rows.len() as i64))
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<usize> {
        self.check()?;
        let mut state = self.lock();
        state.batches.push(txs.len());
        Ok(txs.iter().filter(|tx| insert(&mut state, tx)).count())
    }
}

/// A ready-to-store import candidate dated 2024-01-15
pub fn candidate(user_id: i64, description: &str, amount: &str) -> NewTransaction {
    let amount = Decimal::from_str(amount).unwrap_or_default();
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
    NewTransaction {
        user_id,
        category_id: Some(1),
        name: description.chars().take(25).collect(),
        amount,
        description: Some(description.to_string()),
        transaction_date: date,
        balance: Decimal::ZERO,
        fingerprint: Some(fingerprint(user_id, description, amount, date)),
    }
}
