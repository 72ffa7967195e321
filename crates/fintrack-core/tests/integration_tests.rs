//! Integration tests for fintrack-core
//!
//! These tests exercise the full upload → import → budget → report workflow
//! against a real database.

use std::str::FromStr;
use std::sync::Mutex;
use std::thread;

use fintrack_core::{
    auth,
    config::{AuthConfig, ImportConfig},
    db::Database,
    import::{read_upload, ImportOptions, Importer, InsertOutcome, TransactionStore},
    models::{CategoryKind, NewAccount, NewTransaction},
    reports::monthly_report,
    Error, LoginLimiter, Result,
};
use rust_decimal::Decimal;

const PASSWORD: &str = "Sup3r!secret";

fn statement() -> &'static str {
    "Value date,Text,Amount,Balance
2024-03-01,SALARY   March,3200.00,3450.00
2024-03-02,Grocery Store,-84.20,3365.80
2024-03-02,Coffee Shop,-4.50,3361.30
2024-03-05,Rent,-1200.00,2161.30
2024-03-09,Grocery Store,-61.75,2099.55
"
}

fn setup() -> (Database, i64, i64) {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let user = auth::register(&db, "Alice Smith", "alice@example.com", PASSWORD)
        .expect("Failed to register user");
    let category = db
        .create_category(user.id, "Uncategorized", CategoryKind::Expense)
        .expect("Failed to create category");
    (db, user.id, category)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Database store that records the size of every batch it is handed
struct CountingStore<'a> {
    db: &'a Database,
    batches: Mutex<Vec<usize>>,
}

impl TransactionStore for CountingStore<'_> {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome> {
        self.db.insert_transaction(tx)
    }

    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<usize> {
        self.batches.lock().unwrap().push(txs.len());
        self.db.insert_batch(txs)
    }
}

// =============================================================================
// Import Integration Tests
// =============================================================================

#[test]
fn test_reimport_is_idempotent() {
    let (db, user, category) = setup();
    let importer = Importer::new(&db, ImportOptions::default());

    let first = importer.import(statement().as_bytes(), user, category).unwrap();
    assert_eq!((first.imported, first.duplicates), (5, 0));

    let second = importer.import(statement().as_bytes(), user, category).unwrap();
    assert_eq!((second.imported, second.duplicates), (0, 5));

    assert_eq!(db.count_transactions(user).unwrap(), 5);
}

#[test]
fn test_imported_rows_are_normalized() {
    let (db, user, category) = setup();
    Importer::new(&db, ImportOptions::default())
        .import(statement().as_bytes(), user, category)
        .unwrap();

    let stored = db.list_transactions(user, None).unwrap();
    let salary = stored
        .iter()
        .find(|t| t.amount == dec("3200"))
        .expect("salary row stored");

    assert_eq!(salary.name, "salary march");
    assert_eq!(salary.description.as_deref(), Some("salary march"));
    assert_eq!(salary.balance, dec("3450.00"));
    assert_eq!(salary.category_id, Some(category));
    assert_eq!(salary.fingerprint.as_ref().map(String::len), Some(64));
}

#[test]
fn test_duplicate_row_within_file() {
    let (db, user, category) = setup();
    let csv = "Value date,Text,Amount\n2024-03-02,Coffee,-4.50\n2024-03-02,Coffee,-4.50\n";

    let summary = Importer::new(&db, ImportOptions::default())
        .import(csv.as_bytes(), user, category)
        .unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.total, 2);
}

#[test]
fn test_250_rows_written_as_three_batches() {
    let (db, user, category) = setup();
    let mut csv = String::from("Value date,Text,Amount\n");
    for n in 0..250 {
        csv.push_str(&format!("2024-03-10,Purchase {},-1.00\n", n));
    }

    let store = CountingStore {
        db: &db,
        batches: Mutex::new(Vec::new()),
    };
    let summary = Importer::new(&store, ImportOptions::default())
        .import(csv.as_bytes(), user, category)
        .unwrap();

    assert_eq!(summary.imported, 250);
    assert_eq!(*store.batches.lock().unwrap(), vec![100, 100, 50]);
    assert_eq!(db.count_transactions(user).unwrap(), 250);
}

#[test]
fn test_missing_column_stores_nothing() {
    let (db, user, category) = setup();
    let csv = "Value date,Text\n2024-03-02,Coffee\n";

    let err = Importer::new(&db, ImportOptions::default())
        .import(csv.as_bytes(), user, category)
        .unwrap_err();

    assert!(matches!(err, Error::MissingColumns(_)));
    assert!(err.to_string().contains("Amount"));
    assert_eq!(db.count_transactions(user).unwrap(), 0);
}

#[test]
fn test_malformed_row_isolated() {
    let (db, user, category) = setup();
    let csv = "Value date,Text,Amount
2024-03-01,Lunch,-12.00
2024-03-02,Dinner,twelve
2024-03-03,Books,-30.00
2024-03-04,Taxi,-18.40
";

    let summary = Importer::new(&db, ImportOptions::default())
        .import(csv.as_bytes(), user, category)
        .unwrap();

    assert_eq!(summary.imported, 3);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.error_messages, vec!["Row 2: invalid amount 'twelve'"]);
}

#[test]
fn test_out_of_range_amount_does_not_abort_batch() {
    let (db, user, category) = setup();
    let csv = "Value date,Text,Amount,Balance
2024-03-01,Coffee,-4.50,1e30
2024-03-02,Typo,99999999999999999999,0
2024-03-03,Books,-12.00,99999999999999999999
";

    let summary = Importer::new(&db, ImportOptions::default())
        .import(csv.as_bytes(), user, category)
        .unwrap();

    assert_eq!((summary.imported, summary.errors), (2, 1));
    assert_eq!(db.count_transactions(user).unwrap(), 2);
    let books = db
        .list_transactions(user, None)
        .unwrap()
        .into_iter()
        .find(|t| t.name == "books")
        .unwrap();
    assert_eq!(books.balance, Decimal::ZERO);
}

#[test]
fn test_unknown_category_is_fatal() {
    let (db, user, _) = setup();

    let err = Importer::new(&db, ImportOptions::default())
        .import(statement().as_bytes(), user, 9999)
        .unwrap_err();

    assert!(matches!(err, Error::Database(_)));
    assert_eq!(db.count_transactions(user).unwrap(), 0);
}

#[test]
fn test_dedup_scope_is_per_user() {
    let (db, alice, alice_cat) = setup();
    let bob = auth::register(&db, "Bobby Brown", "bob@example.com", PASSWORD).unwrap();
    let bob_cat = db
        .create_category(bob.id, "Uncategorized", CategoryKind::Expense)
        .unwrap();
    let importer = Importer::new(&db, ImportOptions::default());

    importer.import(statement().as_bytes(), alice, alice_cat).unwrap();
    let summary = importer.import(statement().as_bytes(), bob.id, bob_cat).unwrap();

    assert_eq!(summary.imported, 5);
    assert_eq!(db.count_transactions(alice).unwrap(), 5);
    assert_eq!(db.count_transactions(bob.id).unwrap(), 5);
}

#[test]
fn test_concurrent_imports_store_each_row_once() {
    let (db, user, category) = setup();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            thread::spawn(move || {
                let options = ImportOptions {
                    batch_size: 2,
                    ..ImportOptions::default()
                };
                Importer::new(&db, options)
                    .import(statement().as_bytes(), user, category)
                    .unwrap()
            })
        })
        .collect();

    let imported: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap().imported)
        .sum();

    assert_eq!(imported, 5);
    assert_eq!(db.count_transactions(user).unwrap(), 5);
}

#[test]
fn test_upload_then_import() {
    let (db, user, category) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("march.csv");
    let mut bytes = b"\xef\xbb\xbf".to_vec();
    bytes.extend_from_slice(statement().as_bytes());
    std::fs::write(&path, bytes).unwrap();

    let config = ImportConfig::default();
    let text = read_upload(&path, config.max_upload_bytes).unwrap();
    let summary = Importer::new(&db, ImportOptions::from(&config))
        .import(text.as_bytes(), user, category)
        .unwrap();

    assert_eq!(summary.imported, 5);
}

// =============================================================================
// End-to-end Workflow
// =============================================================================

#[test]
fn test_budget_and_report_after_import() {
    let (db, user, category) = setup();
    Importer::new(&db, ImportOptions::default())
        .import(statement().as_bytes(), user, category)
        .unwrap();

    db.set_budget(user, category, dec("1000"), 3, 2024).unwrap();
    let status = db.budget_status(user, 2024, 3).unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].spent, dec("1350.45"));
    assert!(status[0].is_over());

    let report = monthly_report(&db, user, 2024, 3).unwrap();
    assert_eq!(report.summary.count, 5);
    assert_eq!(report.summary.total, dec("1849.55"));
    assert_eq!(report.summary.min, Some(dec("-1200.00")));
    assert_eq!(report.daily.len(), 4);
    assert_eq!(
        report.busiest_day.map(|d| d.date.to_string()),
        Some("2024-03-01".to_string())
    );
}

#[test]
fn test_login_then_manage_accounts() {
    let (db, _, _) = setup();
    let limiter = LoginLimiter::new(&AuthConfig::default());
    let user = auth::login(&db, &limiter, "alice@example.com", PASSWORD).unwrap();

    let account = |name: &str, balance: &str| NewAccount {
        name: name.to_string(),
        account_type: "savings".parse().unwrap(),
        balance: dec(balance),
        currency: "EUR".to_string(),
        platform_name: None,
    };
    let checking = db.add_account(user.id, &account("Checking", "250.00")).unwrap();
    let savings = db.add_account(user.id, &account("Savings", "0")).unwrap();

    db.add_money(user.id, checking, dec("50")).unwrap();
    db.transfer(user.id, checking, savings, dec("120.25")).unwrap();

    let accounts = db.list_accounts(user.id).unwrap();
    let total: Decimal = accounts.iter().map(|a| a.balance).sum();
    assert_eq!(total, dec("300.00"));

    db.delete_account(user.id, savings, PASSWORD).unwrap();
    assert_eq!(db.list_accounts(user.id).unwrap().len(), 1);
}
