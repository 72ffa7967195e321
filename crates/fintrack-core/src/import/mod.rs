//! Bank statement CSV import
//!
//! The pipeline, leaf first:
//! - `columns` - header aliases and delimiter detection
//! - `row` - per-row parsing and normalization
//! - `fingerprint` - stable transaction identity
//! - `writer` - the storage seam and batching
//! - `upload` - checks on an uploaded file before it is parsed
//!
//! [`Importer::import`] drives the whole thing. It rejects a file only when
//! required columns are missing or storage fails; bad rows are counted and
//! skipped, duplicates are counted separately.

use std::io::{BufRead, BufReader, Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::error::Result;

mod columns;
mod fingerprint;
mod row;
mod upload;
mod writer;

pub use columns::{detect_delimiter, normalize_header, ColumnMap};
pub use fingerprint::fingerprint;
pub use row::{
    looks_like_decimal_comma, normalize_description, parse_amount, parse_date, parse_row,
    truncate_chars, RowError, MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS,
};
pub use upload::{decode_content, read_upload, validate_filename, validate_upload};
pub use writer::{BatchResult, BatchWriter, InsertOutcome, TransactionStore};

/// Shared flag a caller sets to stop an import early
pub type CancelFlag = Arc<AtomicBool>;

/// Knobs for a single import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub batch_size: usize,
    /// Row error messages kept in the summary; further errors are only counted
    pub max_errors: usize,
    pub cancel: Option<CancelFlag>,
    pub deadline: Option<Instant>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            max_errors: config.max_row_errors,
            cancel: None,
            deadline: None,
        }
    }
}

impl ImportOptions {
    fn should_stop(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Outcome of one import call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    /// Rows that made it past validation (new plus duplicate)
    pub total: usize,
    /// Total rejected rows, including those whose message was dropped
    pub errors: usize,
    pub error_messages: Vec<String>,
    pub errors_truncated: bool,
    pub cancelled: bool,
}

impl ImportSummary {
    fn record_error(&mut self, message: String, cap: usize) {
        self.errors += 1;
        if self.error_messages.len() < cap {
            self.error_messages.push(message);
        } else {
            self.errors_truncated = true;
        }
    }

    fn record_batch(&mut self, batch: BatchResult) {
        self.imported += batch.inserted;
        self.duplicates += batch.duplicates();
        self.total = self.imported + self.duplicates;
    }
}

/// Drives a statement through parsing, fingerprinting and batched storage
pub struct Importer<'a, S: TransactionStore + ?Sized> {
    store: &'a S,
    options: ImportOptions,
}

impl<'a, S: TransactionStore + ?Sized> Importer<'a, S> {
    pub fn new(store: &'a S, options: ImportOptions) -> Self {
        Self { store, options }
    }

    /// Import a statement for `user_id`, filing every row under `default_category_id`
    pub fn import<R: Read>(
        &self,
        reader: R,
        user_id: i64,
        default_category_id: i64,
    ) -> Result<ImportSummary> {
        let mut reader = BufReader::new(reader);

        // Sniff the delimiter from the raw header line, then stitch it back on
        let mut header_line = Vec::new();
        reader.read_until(b'\n', &mut header_line)?;
        if header_line.starts_with(b"\xef\xbb\xbf") {
            header_line.drain(..3);
        }
        let delimiter = detect_delimiter(&String::from_utf8_lossy(&header_line));

        let mut csv = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(Cursor::new(header_line).chain(reader));

        let columns = ColumnMap::resolve(csv.headers()?)?;
        info!(
            user_id,
            delimiter = %(delimiter as char).escape_default(),
            "Starting statement import"
        );

        let mut summary = ImportSummary::default();
        let mut writer = BatchWriter::new(self.store, self.options.batch_size);
        let mut warned_decimal_comma = false;

        for (idx, record) in csv.records().enumerate() {
            if self.options.should_stop() {
                summary.cancelled = true;
                warn!("Import cancelled after {} rows", idx);
                break;
            }
            let row_number = idx + 1;

            let parsed = match record {
                Ok(record) => {
                    // Commas are read as grouping separators regardless of delimiter
                    if delimiter == b';'
                        && !warned_decimal_comma
                        && record
                            .get(columns.amount)
                            .is_some_and(looks_like_decimal_comma)
                    {
                        warned_decimal_comma = true;
                        warn!(
                            row = row_number,
                            "Amount looks like it uses a decimal comma; commas are treated as thousands separators"
                        );
                    }
                    parse_row(&record, &columns, user_id, default_category_id)
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => Err(RowError::Unreadable(e.to_string())),
            };

            match parsed {
                Ok(tx) => {
                    if let Some(batch) = writer.push(tx)? {
                        summary.record_batch(batch);
                    }
                }
                Err(reason) => {
                    debug!("Row {} skipped: {}", row_number, reason);
                    summary.record_error(
                        format!("Row {}: {}", row_number, reason),
                        self.options.max_errors,
                    );
                }
            }
        }

        if let Some(batch) = writer.flush()? {
            summary.record_batch(batch);
        }

        info!(
            user_id,
            imported = summary.imported,
            duplicates = summary.duplicates,
            errors = summary.errors,
            cancelled = summary.cancelled,
            "Statement import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::NewTransaction;
    use crate::test_utils::MemoryStore;

    const STATEMENT: &str = "Value date,Text,Amount,Balance
2024-01-15,Coffee Shop,-4.50,995.50
2024-01-16,Salary,2500.00,3495.50
2024-01-17,Rent,-900.00,2595.50
";

    fn import(store: &MemoryStore, csv: &str) -> Result<ImportSummary> {
        Importer::new(store, ImportOptions::default()).import(csv.as_bytes(), 1, 1)
    }

    #[test]
    fn test_import_is_idempotent() {
        let store = MemoryStore::default();

        let first = import(&store, STATEMENT).unwrap();
        assert_eq!((first.imported, first.duplicates, first.errors), (3, 0, 0));

        let second = import(&store, STATEMENT).unwrap();
        assert_eq!((second.imported, second.duplicates, second.errors), (0, 3, 0));
        assert_eq!(second.total, 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_same_row_twice_in_one_file() {
        let store = MemoryStore::default();
        let csv = "Value date,Text,Amount\n2024-01-15,Coffee,-4.50\n2024-01-15,Coffee,-4.50\n";

        let summary = import(&store, csv).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn test_balance_does_not_affect_identity() {
        let store = MemoryStore::default();
        let csv = "Value date,Text,Amount,Balance\n2024-01-15,Coffee,-4.50,100\n2024-01-15,Coffee,-4.50,200\n";

        let summary = import(&store, csv).unwrap();
        assert_eq!((summary.imported, summary.duplicates), (1, 1));
    }

    #[test]
    fn test_dedup_is_per_user() {
        let store = MemoryStore::default();
        let importer = Importer::new(&store, ImportOptions::default());

        importer.import(STATEMENT.as_bytes(), 1, 1).unwrap();
        let other = importer.import(STATEMENT.as_bytes(), 2, 1).unwrap();
        assert_eq!(other.imported, 3);
    }

    #[test]
    fn test_missing_amount_column_rejects_file() {
        let store = MemoryStore::default();
        let err = import(&store, "Value date,Text\n2024-01-15,Coffee\n").unwrap_err();

        match err {
            Error::MissingColumns(cols) => assert_eq!(cols, vec!["Amount".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.is_empty());
        assert!(store.batch_sizes().is_empty());
    }

    #[test]
    fn test_bad_row_is_isolated() {
        let store = MemoryStore::default();
        let csv = "Value date,Text,Amount
2024-01-15,Coffee,-4.50
2024-01-16,Lunch,abc
2024-01-17,,-3.00
not a date,Dinner,-20.00
2024-01-18,Books,-12.00
";
        let summary = import(&store, csv).unwrap();

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.errors, 3);
        assert_eq!(
            summary.error_messages,
            vec![
                "Row 2: invalid amount 'abc'".to_string(),
                "Row 3: missing description".to_string(),
                "Row 4: invalid date 'not a date'".to_string(),
            ]
        );
        assert!(!summary.errors_truncated);
    }

    #[test]
    fn test_out_of_range_amount_is_a_row_error() {
        let store = MemoryStore::default();
        let csv = "Value date,Text,Amount
2024-01-15,Coffee,-4.50
2024-01-16,Typo,99999999999999999999
2024-01-17,Books,-12.00
";
        let summary = import(&store, csv).unwrap();

        assert_eq!((summary.imported, summary.errors), (2, 1));
        assert_eq!(
            summary.error_messages,
            vec!["Row 2: invalid amount '99999999999999999999'".to_string()]
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_undecodable_record_is_a_row_error() {
        let store = MemoryStore::default();
        let mut csv = b"Value date,Text,Amount\n2024-01-15,caf".to_vec();
        csv.extend_from_slice(b"\xff,-4.50\n2024-01-16,Books,-12.00\n");

        let summary = Importer::new(&store, ImportOptions::default())
            .import(csv.as_slice(), 1, 1)
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.errors, 1);
        assert!(summary.error_messages[0].starts_with("Row 1: unreadable record"));
    }

    #[test]
    fn test_error_messages_are_capped() {
        let store = MemoryStore::default();
        let mut csv = String::from("Value date,Text,Amount\n");
        for _ in 0..5 {
            csv.push_str("2024-01-15,Coffee,oops\n");
        }
        let options = ImportOptions {
            max_errors: 2,
            ..ImportOptions::default()
        };

        let summary = Importer::new(&store, options)
            .import(csv.as_bytes(), 1, 1)
            .unwrap();

        assert_eq!(summary.errors, 5);
        assert_eq!(summary.error_messages.len(), 2);
        assert!(summary.errors_truncated);
    }

    #[test]
    fn test_rows_are_written_in_batches() {
        let store = MemoryStore::default();
        let mut csv = String::from("Value date,Text,Amount\n");
        for n in 0..250 {
            csv.push_str(&format!("2024-01-15,Purchase {},-1.00\n", n));
        }

        let summary = import(&store, &csv).unwrap();
        assert_eq!(summary.imported, 250);
        assert_eq!(store.batch_sizes(), vec![100, 100, 50]);
    }

    #[test]
    fn test_semicolon_and_bom_header() {
        let store = MemoryStore::default();
        let csv = "\u{feff}Booking Date;Description;Amount\n15.01.2024;Coffee;\"-4,50\"\n";

        let summary = import(&store, csv).unwrap();
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.imported, 1);
        // Commas are always thousands separators; a decimal-comma export is
        // logged as a warning but still read as -450
        assert!(looks_like_decimal_comma("-4,50"));
        assert_eq!(store.rows()[0].amount.to_string(), "-450.00");
    }

    #[test]
    fn test_tab_delimited() {
        let store = MemoryStore::default();
        let csv = "Date\tDetails\tAmount\n2024-01-15\tCoffee\t-4.50\n";
        assert_eq!(import(&store, csv).unwrap().imported, 1);
    }

    #[test]
    fn test_header_only_file_imports_nothing() {
        let store = MemoryStore::default();
        let summary = import(&store, "Value date,Text,Amount\n").unwrap();
        assert_eq!(summary, ImportSummary::default());
    }

    #[test]
    fn test_cancelled_before_start() {
        let store = MemoryStore::default();
        let flag: CancelFlag = Arc::new(AtomicBool::new(true));
        let options = ImportOptions {
            cancel: Some(flag),
            ..ImportOptions::default()
        };

        let summary = Importer::new(&store, options)
            .import(STATEMENT.as_bytes(), 1, 1)
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.imported, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_deadline_stops_import() {
        let store = MemoryStore::default();
        let options = ImportOptions {
            deadline: Some(Instant::now()),
            ..ImportOptions::default()
        };

        let summary = Importer::new(&store, options)
            .import(STATEMENT.as_bytes(), 1, 1)
            .unwrap();
        assert!(summary.cancelled);
    }

    /// Cancels the import as soon as the first batch lands
    struct CancelAfterFirstBatch {
        inner: MemoryStore,
        flag: CancelFlag,
    }

    impl TransactionStore for CancelAfterFirstBatch {
        fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome> {
            self.inner.insert_transaction(tx)
        }

        fn insert_batch(&self, txs: &[NewTransaction]) -> Result<usize> {
            self.flag.store(true, Ordering::Relaxed);
            self.inner.insert_batch(txs)
        }
    }

    #[test]
    fn test_cancel_mid_import_flushes_pending_rows() {
        let flag: CancelFlag = Arc::new(AtomicBool::new(false));
        let store = CancelAfterFirstBatch {
            inner: MemoryStore::default(),
            flag: flag.clone(),
        };
        let options = ImportOptions {
            batch_size: 2,
            cancel: Some(flag),
            ..ImportOptions::default()
        };
        let csv = "Value date,Text,Amount
2024-01-15,a,-1
2024-01-15,b,-1
2024-01-15,c,-1
2024-01-15,d,-1
";

        let summary = Importer::new(&store, options)
            .import(csv.as_bytes(), 1, 1)
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.imported, 2);
        assert_eq!(store.inner.batch_sizes(), vec![2]);
    }

    #[test]
    fn test_storage_failure_is_fatal() {
        let store = MemoryStore::failing();
        let err = import(&store, STATEMENT).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
