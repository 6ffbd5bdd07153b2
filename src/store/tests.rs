//! Tests for the file-backed quote store.

use super::*;
use crate::quote::ProductInfo;
use chrono::{Duration, Utc};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> FileQuoteStore {
    FileQuoteStore::new(dir.path().join("quotes"), dir.path().join("sequence"))
}

fn quote(number: &str, customer: &str) -> QuoteRecord {
    QuoteRecord::new_draft(number, customer, "USD", "en-US")
}

#[test]
fn test_save_then_load_round_trips_and_bumps_version() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut record = quote("Q-00001", "cust-1");
    record
        .add_product(
            &ProductInfo {
                id: "P-100".into(),
                name: "Widget".into(),
                sku: Some("W-1".into()),
                list_price: "12.00".parse().unwrap(),
                sale_price: None,
            },
            2,
        )
        .unwrap();

    assert_eq!(store.save(&record).unwrap(), 1);

    let loaded = store.load("Q-00001", &LocaleContext::default()).unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.items, record.items);
    assert_eq!(loaded.customer_id, "cust-1");
}

#[test]
fn test_load_missing_quote_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let err = store
        .load("Q-00042", &LocaleContext::default())
        .unwrap_err();
    assert!(matches!(err, QuoteError::NotFound(_)));
}

#[test]
fn test_load_fills_missing_language_from_locale() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut record = quote("Q-00001", "cust-1");
    record.language = String::new();
    store.save(&record).unwrap();

    let locale = LocaleContext {
        language: "de-DE".into(),
        currency: "EUR".into(),
    };
    let loaded = store.load("Q-00001", &locale).unwrap();
    assert_eq!(loaded.language, "de-DE");
    // Currency is part of the record and is never overridden.
    assert_eq!(loaded.currency, "USD");
}

#[test]
fn test_stale_version_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let record = quote("Q-00001", "cust-1");
    store.save(&record).unwrap();

    // A second writer still holding version 0.
    let err = store.save(&record).unwrap_err();
    assert!(matches!(err, QuoteError::PersistenceConflict(_)));

    let loaded = store.load("Q-00001", &LocaleContext::default()).unwrap();
    assert_eq!(loaded.version, 1);
}

#[test]
fn test_unsafe_numbers_are_rejected() {
    for number in ["../etc/passwd", "", "a/b", "..", " Q-1"] {
        let err = validate_quote_number(number).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput(_)), "{:?}", number);
    }
    assert!(validate_quote_number("Q-00001").is_ok());
    assert!(validate_quote_number("legacy.42").is_ok());
}

#[test]
fn test_next_number_is_sequential_and_skips_existing_files() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.next_number().unwrap(), "Q-00001");
    store.save(&quote("Q-00002", "cust-1")).unwrap();
    assert_eq!(store.next_number().unwrap(), "Q-00003");

    // The sequence survives a new store instance.
    let reopened = store_in(&dir);
    assert_eq!(reopened.next_number().unwrap(), "Q-00004");
}

#[test]
fn test_search_filters_by_customer_stage_and_keyword() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut submitted = quote("Q-00001", "cust-1");
    submitted.stage = QuoteStage::Submitted;
    submitted.tag = Some("Rush".into());
    store.save(&submitted).unwrap();

    let mut draft = quote("Q-00002", "cust-1");
    draft.comment = Some("rush order for spring".into());
    store.save(&draft).unwrap();

    store.save(&quote("Q-00003", "cust-2")).unwrap();

    let all = store.search(&SearchCriteria::for_customer("cust-1")).unwrap();
    assert_eq!(all.total_count, 2);

    let drafts = store
        .search(&SearchCriteria::for_customer("cust-1").with_stage(QuoteStage::Draft))
        .unwrap();
    assert_eq!(drafts.results, vec!["Q-00002".to_string()]);

    let rush = store
        .search(&SearchCriteria::for_customer("cust-1").with_keyword("RUSH"))
        .unwrap();
    assert_eq!(rush.total_count, 2);

    let other = store.search(&SearchCriteria::for_customer("cust-2")).unwrap();
    assert_eq!(other.results, vec!["Q-00003".to_string()]);
}

#[test]
fn test_search_is_newest_first_and_paged() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let base = Utc::now();

    for i in 1..=5 {
        let mut record = quote(&format!("Q-{:05}", i), "cust-1");
        record.created_at = base + Duration::minutes(i);
        store.save(&record).unwrap();
    }

    let first = store
        .search(&SearchCriteria::for_customer("cust-1").with_page(1, 2))
        .unwrap();
    assert_eq!(first.total_count, 5);
    assert_eq!(first.results, vec!["Q-00005", "Q-00004"]);

    let last = store
        .search(&SearchCriteria::for_customer("cust-1").with_page(3, 2))
        .unwrap();
    assert_eq!(last.results, vec!["Q-00001"]);

    let beyond = store
        .search(&SearchCriteria::for_customer("cust-1").with_page(9, 2))
        .unwrap();
    assert!(beyond.results.is_empty());
    assert_eq!(beyond.total_count, 5);
}

#[test]
fn test_search_rejects_zero_paging() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let err = store
        .search(&SearchCriteria::for_customer("cust-1").with_page(0, 20))
        .unwrap_err();
    assert!(matches!(err, QuoteError::InvalidInput(_)));
}

#[test]
fn test_search_on_empty_home_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let page = store.search(&SearchCriteria::for_customer("cust-1")).unwrap();
    assert!(page.results.is_empty());
    assert_eq!(page.total_count, 0);
}
