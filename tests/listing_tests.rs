mod common;

use std::collections::BTreeSet;

use common::{engine, DATASET};
use debt_rollup::{
    core::services::{Cursor, Direction},
    domain::{BalanceSign, FilterSpec, SortKey},
    ListingRequest, RollupEngine, RollupError,
};

/// Walks every page and returns the keys in the order they were served.
fn drain(engine: &RollupEngine, request: ListingRequest) -> Vec<SortKey> {
    let mut keys = Vec::new();
    let mut next = Some(request.clone());
    while let Some(current) = next.take() {
        let page = engine.list(&current).expect("page");
        assert!(page.records.len() <= current.page_size.unwrap_or(usize::MAX));
        keys.extend(page.records.iter().map(|record| record.sort_key()));
        next = page
            .next_cursor
            .map(|token| request.clone().with_cursor(token));
    }
    keys
}

#[test]
fn pages_partition_the_filtered_rows_in_both_directions() {
    let engine = engine();
    for direction in [Direction::Asc, Direction::Desc] {
        for page_size in 1..=9 {
            let keys = drain(
                &engine,
                ListingRequest::new(DATASET)
                    .with_direction(direction)
                    .with_page_size(page_size),
            );
            assert_eq!(keys.len(), 8, "{direction:?}/{page_size}");
            let unique: BTreeSet<(String, u64)> = keys
                .iter()
                .map(|key| (key.account_id.clone(), key.row_id))
                .collect();
            assert_eq!(unique.len(), 8);

            let mut expected = keys.clone();
            expected.sort();
            if direction == Direction::Desc {
                expected.reverse();
            }
            assert_eq!(keys, expected, "{direction:?}/{page_size}");
        }
    }
}

#[test]
fn duplicate_accounts_are_ordered_by_row() {
    let page = engine()
        .list(&ListingRequest::new(DATASET).with_page_size(100))
        .expect("page");
    let b001: Vec<u64> = page
        .records
        .iter()
        .filter(|record| record.account_id == "B001")
        .map(|record| record.row_id)
        .collect();
    assert_eq!(b001, vec![4, 5]);
    assert!(page.next_cursor.is_none());
}

#[test]
fn filtered_listing_only_serves_matching_rows() {
    let keys = drain(
        &engine(),
        ListingRequest::new(DATASET)
            .with_filter(FilterSpec::new().with_balance_sign(BalanceSign::Positive))
            .with_page_size(4),
    );
    let accounts: Vec<&str> = keys.iter().map(|key| key.account_id.as_str()).collect();
    assert_eq!(accounts, vec!["A001", "A002", "A003", "A004", "B001", "B001"]);
}

#[test]
fn replaying_a_cursor_returns_the_same_page() {
    let engine = engine();
    let first = engine
        .list(&ListingRequest::new(DATASET).with_page_size(3))
        .expect("first page");
    let token = first.next_cursor.expect("more rows");
    let request = ListingRequest::new(DATASET)
        .with_page_size(3)
        .with_cursor(token.clone());
    let once = engine.list(&request).expect("second page");
    let twice = engine.list(&request).expect("second page again");
    assert_eq!(once, twice);
    assert_eq!(once.records[0].account_id, "A004");

    let cursor = Cursor::decode(&token).expect("decodes");
    assert_eq!(cursor.direction, Direction::Asc);
    assert_eq!(cursor.key.account_id, "A003");
}

#[test]
fn cursor_from_the_other_direction_is_rejected() {
    let engine = engine();
    let token = engine
        .list(&ListingRequest::new(DATASET).with_page_size(2))
        .expect("page")
        .next_cursor
        .expect("more rows");
    let err = engine
        .list(
            &ListingRequest::new(DATASET)
                .with_direction(Direction::Desc)
                .with_cursor(token),
        )
        .expect_err("direction mismatch");
    assert!(matches!(err, RollupError::Validation(_)));
}

#[test]
fn malformed_cursor_and_zero_page_size_are_validation_errors() {
    let engine = engine();
    let err = engine
        .list(&ListingRequest::new(DATASET).with_cursor("zz-not-hex"))
        .expect_err("bad cursor");
    assert!(matches!(err, RollupError::Validation(_)));

    let err = engine
        .list(&ListingRequest::new(DATASET).with_page_size(0))
        .expect_err("zero page");
    assert!(matches!(err, RollupError::Validation(_)));
}

#[test]
fn oversized_pages_are_clamped() {
    let engine = engine();
    let max = engine.config().max_page_size;
    let page = engine
        .list(&ListingRequest::new(DATASET).with_page_size(max + 1_000))
        .expect("page");
    assert_eq!(page.records.len(), 8);
}

#[test]
fn unknown_dataset_is_reported() {
    let err = engine()
        .list(&ListingRequest::new("missing"))
        .expect_err("unknown dataset");
    assert!(matches!(err, RollupError::DatasetNotFound(id) if id == "missing"));
}

#[test]
fn listing_request_reads_from_json() {
    let request = ListingRequest::from_json(
        r#"{"datasetId":"ledger","direction":"desc","pageSize":2,"filter":{"businessAreas":["6220"]}}"#,
    )
    .expect("parse");
    let page = engine().list(&request).expect("page");
    let accounts: Vec<&str> = page
        .records
        .iter()
        .map(|record| record.account_id.as_str())
        .collect();
    assert_eq!(accounts, vec!["B002", "B001"]);
    assert!(page.next_cursor.is_some());
}
