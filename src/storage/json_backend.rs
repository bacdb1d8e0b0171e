//! JSON row sources and the typed decoding step that turns raw rows into
//! [`DebtRecord`]s.
//!
//! Upstream exports are loose: amounts may arrive as numbers, numeric
//! strings or integers wider than `i64`, and identifiers may be numbers.
//! Everything is coerced here, once, so the engine only sees `f64` measures
//! and `String` codes.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    core::predicate::Predicate,
    domain::{ColumnSet, DebtRecord},
    errors::{Result, RollupError},
};

use super::{memory::InMemoryDataset, RecordStream, RowSource};

const JSON_LINES_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];

/// Row as found in an export, before coercion.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDebtRecord {
    #[serde(alias = "contractAccount")]
    account_id: Value,
    #[serde(alias = "businessAreaCode")]
    business_area: Value,
    account_class: Value,
    adid: Value,
    account_status: Value,
    staff_id: Value,
    smer_segment: Value,
    months_outstanding: Value,
    outstanding_amount: Value,
    total_undue: Value,
    current_month_unpaid: Value,
    total_unpaid: Value,
    mit_amount: Value,
}

/// Decodes one raw row. Unparseable measures become zero and are logged;
/// the record is kept so it still counts.
pub fn decode_record(row_id: u64, value: Value) -> Result<DebtRecord> {
    if !value.is_object() {
        return Err(RollupError::Storage(format!(
            "row {} is not a JSON object",
            row_id
        )));
    }
    let raw: RawDebtRecord = serde_json::from_value(value)?;
    let months_outstanding = match coerce_number("monthsOutstanding", &raw.months_outstanding) {
        Ok(months) => months,
        Err(err) => {
            tracing::warn!(row_id, %err, "ignoring months outstanding");
            None
        }
    };
    let mit_amount = match coerce_number("mitAmount", &raw.mit_amount) {
        Ok(amount) => amount,
        Err(err) => {
            tracing::warn!(row_id, %err, "substituting zero");
            Some(0.0)
        }
    };
    Ok(DebtRecord {
        row_id,
        account_id: coerce_text(&raw.account_id),
        business_area: coerce_text(&raw.business_area),
        account_class: coerce_text(&raw.account_class),
        adid: coerce_text(&raw.adid),
        account_status: coerce_text(&raw.account_status),
        staff_id: coerce_text(&raw.staff_id),
        smer_segment: match &raw.smer_segment {
            Value::Null => None,
            other => Some(coerce_text(other)),
        },
        months_outstanding,
        outstanding_amount: measure(row_id, "outstandingAmount", &raw.outstanding_amount),
        total_undue: measure(row_id, "totalUndue", &raw.total_undue),
        current_month_unpaid: measure(row_id, "currentMonthUnpaid", &raw.current_month_unpaid),
        total_unpaid: measure(row_id, "totalUnpaid", &raw.total_unpaid),
        mit_amount,
    })
}

fn measure(row_id: u64, field: &'static str, value: &Value) -> f64 {
    match coerce_number(field, value) {
        Ok(amount) => amount.unwrap_or(0.0),
        Err(err) => {
            tracing::warn!(row_id, %err, "substituting zero");
            0.0
        }
    }
}

/// Numbers pass through, numeric strings are parsed (thousands separators
/// allowed), null and blank strings are absent.
pub fn coerce_number(field: &'static str, value: &Value) -> Result<Option<f64>> {
    let invalid = || RollupError::NumericCoercion {
        field,
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_f64()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(invalid),
        Value::String(text) => {
            let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

/// Identifiers and codes: strings are trimmed, numbers keep their exact
/// digits, null is empty.
fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

/// Reads a file holding one JSON array of rows into memory.
pub fn load_json_array(path: &Path) -> Result<InMemoryDataset> {
    let data = fs::read_to_string(path)?;
    let rows: Vec<Value> = serde_json::from_str(&data)?;
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| decode_record(index as u64, row))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(path = %path.display(), rows = records.len(), "loaded JSON dataset");
    Ok(InMemoryDataset::new(records))
}

/// Opens a dataset by extension: `.jsonl`/`.ndjson` stream from disk,
/// anything else is read as a JSON array.
pub fn load_dataset(path: &Path) -> Result<Arc<dyn RowSource>> {
    let streaming = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            JSON_LINES_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    if streaming {
        Ok(Arc::new(JsonLinesDataset::open(path)?))
    } else {
        Ok(Arc::new(load_json_array(path)?))
    }
}

/// One JSON object per line, re-read on every scan. Blank lines are
/// skipped and do not consume a row id.
#[derive(Debug, Clone)]
pub struct JsonLinesDataset {
    path: PathBuf,
}

impl JsonLinesDataset {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RollupError::Storage(format!(
                "dataset file not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for JsonLinesDataset {
    fn scan<'a>(&'a self, predicate: &Predicate, columns: &ColumnSet) -> Result<RecordStream<'a>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let predicate = predicate.clone();
        let columns = columns.clone();
        let mut next_row_id = 0u64;
        let rows = reader
            .lines()
            .filter_map(move |line| match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => {
                    let row_id = next_row_id;
                    next_row_id += 1;
                    Some(
                        serde_json::from_str::<Value>(&line)
                            .map_err(|err| {
                                RollupError::Storage(format!("line for row {}: {}", row_id, err))
                            })
                            .and_then(|value| decode_record(row_id, value)),
                    )
                }
                Err(err) => Some(Err(err.into())),
            })
            .filter(move |record| match record {
                Ok(record) => predicate.matches(record),
                Err(_) => true,
            })
            .map(move |record| record.map(|record| record.project(&columns)));
        Ok(Box::new(rows))
    }

    fn describe(&self) -> String {
        format!("json-lines ({})", self.path.display())
    }
}
