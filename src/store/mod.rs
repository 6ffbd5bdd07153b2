//! Quote record persistence.
//!
//! The engine owns the working copy only while it holds the record's key
//! lock; the store owns the durable copy. [`QuoteStore`] is the seam, and
//! [`FileQuoteStore`] is the YAML-on-disk implementation the CLI uses.
//!
//! # Conflicts
//!
//! Every record carries a `version`. A save whose version differs from the
//! stored one is rejected with `PersistenceConflict`; the engine surfaces it
//! and never retries.

use crate::error::{QuoteError, Result};
use crate::identity::LocaleContext;
use crate::quote::{QuoteRecord, QuoteStage};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

mod file;

#[cfg(test)]
mod tests;

pub use file::FileQuoteStore;

/// Default number of results per search page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

static FILE_STEM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("Invalid file stem regex")
});

/// Whether `value` can name a file under the desk home as-is.
pub fn is_safe_file_stem(value: &str) -> bool {
    FILE_STEM_REGEX.is_match(value) && !value.contains("..")
}

/// Reject quote numbers that could not safely name a record file.
pub fn validate_quote_number(number: &str) -> Result<()> {
    if !is_safe_file_stem(number) {
        return Err(QuoteError::InvalidInput(format!(
            "invalid quote number '{}'",
            number
        )));
    }
    Ok(())
}

/// Durable home of quote records.
pub trait QuoteStore: Send + Sync {
    /// Load a record by number, fails with `NotFound` when absent.
    fn load(&self, number: &str, locale: &LocaleContext) -> Result<QuoteRecord>;

    /// Persist a record, returning its new version.
    fn save(&self, record: &QuoteRecord) -> Result<u64>;

    /// Numbers of the records matching `criteria`, newest first.
    fn search(&self, criteria: &SearchCriteria) -> Result<SearchPage<String>>;

    /// Allocate a fresh, never-used quote number.
    fn next_number(&self) -> Result<String>;
}

/// Filters for [`QuoteStore::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Always the acting customer; the engine overwrites whatever the caller set.
    pub customer_id: String,
    pub stage: Option<QuoteStage>,
    /// Case-insensitive match over number, comment and tag.
    pub keyword: Option<String>,
    /// 1-based.
    pub page_number: usize,
    pub page_size: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            customer_id: String::new(),
            stage: None,
            keyword: None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchCriteria {
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Self::default()
        }
    }

    pub fn with_stage(mut self, stage: QuoteStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_page(mut self, page_number: usize, page_size: usize) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }

    /// Whether `record` passes every filter.
    pub fn matches(&self, record: &QuoteRecord) -> bool {
        if record.customer_id != self.customer_id {
            return false;
        }
        if let Some(stage) = self.stage
            && record.stage != stage
        {
            return false;
        }
        match self.keyword.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                [
                    Some(record.number.as_str()),
                    record.comment.as_deref(),
                    record.tag.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&keyword))
            }
        }
    }

    /// Reject paging values the store cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.page_number == 0 {
            return Err(QuoteError::InvalidInput(
                "page number must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(QuoteError::InvalidInput(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Slice one page out of an already ordered result list.
    pub fn paginate<T>(&self, all: Vec<T>) -> SearchPage<T> {
        let total_count = all.len();
        let skip = (self.page_number.saturating_sub(1)).saturating_mul(self.page_size);
        let results = all.into_iter().skip(skip).take(self.page_size).collect();
        SearchPage {
            results,
            total_count,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage<T> {
    pub results: Vec<T>,
    /// Matches across all pages.
    pub total_count: usize,
}
