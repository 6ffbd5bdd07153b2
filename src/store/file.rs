//! YAML-on-disk quote store.
//!
//! Layout under the desk home:
//!
//! ```text
//! quotes/
//!   Q-00001.yaml
//!   Q-00002.yaml
//! sequence          # last allocated quote number
//! ```

use super::{QuoteStore, SearchCriteria, SearchPage, validate_quote_number};
use crate::error::{QuoteError, Result};
use crate::fs::atomic_write_file;
use crate::identity::LocaleContext;
use crate::quote::QuoteRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Stores each record as `<quotes_dir>/<number>.yaml`.
#[derive(Debug)]
pub struct FileQuoteStore {
    quotes_dir: PathBuf,
    sequence_path: PathBuf,
    /// Serializes the version check with the write, and number allocation.
    write_lock: Mutex<()>,
}

impl FileQuoteStore {
    pub fn new(quotes_dir: impl Into<PathBuf>, sequence_path: impl Into<PathBuf>) -> Self {
        Self {
            quotes_dir: quotes_dir.into(),
            sequence_path: sequence_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the file backing `number`.
    pub fn record_path(&self, number: &str) -> PathBuf {
        self.quotes_dir.join(format!("{}.yaml", number))
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn stored_version(&self, number: &str) -> Result<u64> {
        let path = self.record_path(number);
        if !path.exists() {
            return Ok(0);
        }
        Ok(read_record(&path)?.version)
    }

    fn read_sequence(&self) -> Result<u64> {
        if !self.sequence_path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(&self.sequence_path).map_err(|e| {
            QuoteError::UserError(format!(
                "failed to read quote sequence '{}': {}",
                self.sequence_path.display(),
                e
            ))
        })?;
        content.trim().parse().map_err(|e| {
            QuoteError::UserError(format!(
                "corrupt quote sequence '{}': {}",
                self.sequence_path.display(),
                e
            ))
        })
    }
}

impl QuoteStore for FileQuoteStore {
    fn load(&self, number: &str, locale: &LocaleContext) -> Result<QuoteRecord> {
        validate_quote_number(number)?;
        let path = self.record_path(number);
        if !path.exists() {
            return Err(QuoteError::NotFound(format!("quote '{}'", number)));
        }

        let mut record = read_record(&path)?;
        if record.language.is_empty() {
            record.language = locale.language.clone();
        }
        if record.currency.is_empty() {
            record.currency = locale.currency.clone();
        }
        Ok(record)
    }

    fn save(&self, record: &QuoteRecord) -> Result<u64> {
        validate_quote_number(&record.number)?;
        let _guard = self.write_guard();

        let stored = self.stored_version(&record.number)?;
        if stored != record.version {
            return Err(QuoteError::PersistenceConflict(format!(
                "quote '{}' changed underneath this save (expected version {}, found {})",
                record.number, record.version, stored
            )));
        }

        let mut next = record.clone();
        next.version = stored + 1;
        let yaml = serde_yaml::to_string(&next).map_err(|e| {
            QuoteError::UserError(format!(
                "failed to serialize quote '{}': {}",
                record.number, e
            ))
        })?;
        atomic_write_file(self.record_path(&record.number), &yaml)?;

        debug!(quote = %record.number, version = next.version, "quote saved");
        Ok(next.version)
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<SearchPage<String>> {
        criteria.validate()?;
        if !self.quotes_dir.exists() {
            return Ok(criteria.paginate(Vec::new()));
        }

        let entries = fs::read_dir(&self.quotes_dir).map_err(|e| {
            QuoteError::UserError(format!(
                "failed to read quotes directory '{}': {}",
                self.quotes_dir.display(),
                e
            ))
        })?;

        let mut matches = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match read_record(&path) {
                Ok(record) if criteria.matches(&record) => matches.push(record),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable quote"),
            }
        }

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.number.cmp(&a.number))
        });
        let numbers = matches.into_iter().map(|record| record.number).collect();
        Ok(criteria.paginate(numbers))
    }

    fn next_number(&self) -> Result<String> {
        let _guard = self.write_guard();

        let mut sequence = self.read_sequence()?;
        let number = loop {
            sequence += 1;
            let candidate = format!("Q-{:05}", sequence);
            if !self.record_path(&candidate).exists() {
                break candidate;
            }
        };
        atomic_write_file(&self.sequence_path, &format!("{}\n", sequence))?;
        Ok(number)
    }
}

fn read_record(path: &Path) -> Result<QuoteRecord> {
    let content = fs::read_to_string(path).map_err(|e| {
        QuoteError::UserError(format!(
            "failed to read quote file '{}': {}",
            path.display(),
            e
        ))
    })?;
    serde_yaml::from_str(&content).map_err(|e| {
        QuoteError::UserError(format!(
            "failed to parse quote file '{}': {}",
            path.display(),
            e
        ))
    })
}
