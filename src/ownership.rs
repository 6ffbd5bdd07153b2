//! Ownership guard.
//!
//! Must be evaluated against the copy loaded after the quote's lock was
//! acquired, never against an earlier snapshot.

use crate::error::{QuoteError, Result};
use crate::quote::QuoteRecord;

/// Fail with `Forbidden` unless `acting_customer_id` owns `record`.
pub fn assert_owner(record: &QuoteRecord, acting_customer_id: &str) -> Result<()> {
    if record.customer_id != acting_customer_id {
        return Err(QuoteError::Forbidden(format!(
            "quote '{}' does not belong to customer '{}'",
            record.number, acting_customer_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::QuoteStage;

    #[test]
    fn test_owner_passes() {
        let record = QuoteRecord::new_draft("Q-1", "cust-1", "USD", "en-US");
        assert!(assert_owner(&record, "cust-1").is_ok());
    }

    #[test]
    fn test_non_owner_is_forbidden_in_every_stage() {
        let mut record = QuoteRecord::new_draft("Q-1", "cust-1", "USD", "en-US");
        for stage in QuoteStage::ALL {
            record.stage = stage;
            let err = assert_owner(&record, "cust-2").unwrap_err();
            assert!(matches!(err, QuoteError::Forbidden(_)), "stage {}", stage);
        }
    }

    #[test]
    fn test_comparison_is_exact() {
        let record = QuoteRecord::new_draft("Q-1", "cust-1", "USD", "en-US");
        assert!(assert_owner(&record, "CUST-1").is_err());
        assert!(assert_owner(&record, "").is_err());
    }
}
