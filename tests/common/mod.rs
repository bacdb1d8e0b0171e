#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use debt_rollup::{
    config::EngineConfig,
    domain::DebtRecord,
    storage::InMemoryDataset,
    RollupEngine,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

pub const DATASET: &str = "ledger";

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Eight rows over three stations exercising duplicates, blanks, negative
/// and zero balances, MIT amounts and a missing aging value.
pub static SAMPLE_RECORDS: Lazy<Vec<DebtRecord>> = Lazy::new(|| {
    vec![
        record("A001", "6210", "OPCN", "DM", "S1", Some("SME"), Some(2.0), [1500.0, 100.0, 50.0, 200.0], None),
        record("A002", "6210", "LPCN", "DS", "S2", None, Some(4.0), [500.0, 10.0, 5.0, 20.0], Some(0.0)),
        record("A003", "6210", "LPCG", "GV", "S1", Some(""), Some(7.5), [1000.0, 0.0, 0.0, 0.0], Some(25.0)),
        record("A004", "6210", "OPCG", "GV", "", Some("CORP"), Some(13.0), [2000.0, 40.0, 10.0, 60.0], None),
        record("B001", "6220", "OPCN", "DM", "S3", Some("SME"), Some(0.5), [300.0, 30.0, 3.0, 33.0], None),
        record("B001", "6220", "OPCN", "DM", "S3", Some("SME"), Some(1.0), [200.0, 20.0, 2.0, 22.0], None),
        record("B002", "6220", "LPCG", "IN", "S3", Some("CORP"), None, [-100.0, 0.0, 0.0, 0.0], Some(5.0)),
        record("C001", "6230", "OPCN", "AG", "S4", None, Some(12.0), [0.0, 0.0, 0.0, 0.0], None),
    ]
});

/// Builds a record; `amounts` is outstanding, total undue, current month
/// unpaid, total unpaid.
#[allow(clippy::too_many_arguments)]
pub fn record(
    account_id: &str,
    business_area: &str,
    account_class: &str,
    adid: &str,
    staff_id: &str,
    smer_segment: Option<&str>,
    months_outstanding: Option<f64>,
    amounts: [f64; 4],
    mit_amount: Option<f64>,
) -> DebtRecord {
    let mut record = DebtRecord::new(account_id, business_area, account_class, amounts[0]);
    record.adid = adid.to_string();
    record.account_status = "ACTIVE".to_string();
    record.staff_id = staff_id.to_string();
    record.smer_segment = smer_segment.map(str::to_string);
    record.months_outstanding = months_outstanding;
    record.total_undue = amounts[1];
    record.current_month_unpaid = amounts[2];
    record.total_unpaid = amounts[3];
    record.mit_amount = mit_amount;
    record
}

/// Engine with the sample rows registered under [`DATASET`].
pub fn engine() -> RollupEngine {
    engine_with(SAMPLE_RECORDS.clone())
}

pub fn engine_with(records: Vec<DebtRecord>) -> RollupEngine {
    let engine = RollupEngine::new(EngineConfig::default()).expect("engine");
    engine
        .register(DATASET, Arc::new(InMemoryDataset::new(records)))
        .expect("register dataset");
    engine
}

/// Creates an isolated directory kept alive until the test binary exits.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// Writes the sample rows as a JSON array and returns the file path.
pub fn write_sample_json() -> PathBuf {
    let path = temp_dir().join("ledger.json");
    let json = serde_json::to_string_pretty(&*SAMPLE_RECORDS).expect("encode rows");
    std::fs::write(&path, json).expect("write dataset");
    path
}
