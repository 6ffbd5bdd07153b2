use crate::approval::{ApprovalClient, ApprovalResponse, SubmittedQuote};
use crate::cart::CartSink;
use crate::catalog::FileCatalog;
use crate::engine::QuoteEngine;
use crate::error::{QuoteError, Result};
use crate::identity::{Actor, LocaleContext};
use crate::quote::{ProductInfo, QuoteRecord};
use crate::store::{QuoteStore, SearchCriteria, SearchPage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Store double that counts calls and can stretch loads to widen races.
#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<HashMap<String, QuoteRecord>>,
    sequence: AtomicU64,
    loads: AtomicUsize,
    saves: AtomicUsize,
    load_delay: Mutex<Option<Duration>>,
    /// Every successfully saved snapshot, in save order.
    history: Mutex<Vec<QuoteRecord>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, record: QuoteRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.number.clone(), record);
    }

    pub(crate) fn stored(&self, number: &str) -> Option<QuoteRecord> {
        self.records.lock().unwrap().get(number).cloned()
    }

    pub(crate) fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn history(&self) -> Vec<QuoteRecord> {
        self.history.lock().unwrap().clone()
    }

    pub(crate) fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = Some(delay);
    }

    /// Simulate a writer outside the lock discipline bumping the version.
    pub(crate) fn bump_version_externally(&self, number: &str) {
        if let Some(record) = self.records.lock().unwrap().get_mut(number) {
            record.version += 1;
        }
    }
}

impl QuoteStore for MemoryStore {
    fn load(&self, number: &str, _locale: &LocaleContext) -> Result<QuoteRecord> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let record = self.stored(number);
        let delay = *self.load_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        record.ok_or_else(|| QuoteError::NotFound(format!("quote '{}'", number)))
    }

    fn save(&self, record: &QuoteRecord) -> Result<u64> {
        let mut records = self.records.lock().unwrap();
        let stored = records.get(&record.number).map_or(0, |r| r.version);
        if stored != record.version {
            return Err(QuoteError::PersistenceConflict(format!(
                "quote '{}' is at version {}",
                record.number, stored
            )));
        }
        let mut next = record.clone();
        next.version = stored + 1;
        next.totals = Default::default();
        records.insert(next.number.clone(), next.clone());
        self.history.lock().unwrap().push(next.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(next.version)
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<SearchPage<String>> {
        criteria.validate()?;
        let mut matches: Vec<QuoteRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|record| criteria.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.number.cmp(&a.number))
        });
        Ok(criteria.paginate(matches.into_iter().map(|r| r.number).collect()))
    }

    fn next_number(&self) -> Result<String> {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("Q-{:05}", n))
    }
}

// =============================================================================
// Cart and approval doubles
// =============================================================================

#[derive(Default)]
pub(crate) struct RecordingCartSink {
    received: Mutex<Vec<QuoteRecord>>,
    fail_with: Mutex<Option<QuoteError>>,
}

impl RecordingCartSink {
    pub(crate) fn received(&self) -> Vec<QuoteRecord> {
        self.received.lock().unwrap().clone()
    }

    pub(crate) fn fail_with(&self, error: QuoteError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }
}

impl CartSink for RecordingCartSink {
    fn materialize_from_quote(&self, quote: &QuoteRecord) -> Result<()> {
        self.received.lock().unwrap().push(quote.clone());
        match self.fail_with.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Approval double answering from a per-quote script.
#[derive(Default)]
pub(crate) struct ScriptedApprovalClient {
    statuses: Mutex<HashMap<String, Result<ApprovalResponse>>>,
    notify_response: Mutex<Option<Result<ApprovalResponse>>>,
    polls: Mutex<Vec<String>>,
    notified: Mutex<Vec<SubmittedQuote>>,
}

impl ScriptedApprovalClient {
    pub(crate) fn answer_status(&self, number: &str, status: &str) {
        self.statuses.lock().unwrap().insert(
            number.to_string(),
            Ok(ApprovalResponse {
                status: Some(status.to_string()),
                correlation_id: None,
            }),
        );
    }

    pub(crate) fn answer(&self, number: &str, response: Result<ApprovalResponse>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(number.to_string(), response);
    }

    pub(crate) fn answer_notify(&self, response: Result<ApprovalResponse>) {
        *self.notify_response.lock().unwrap() = Some(response);
    }

    pub(crate) fn polls(&self) -> Vec<String> {
        self.polls.lock().unwrap().clone()
    }

    pub(crate) fn notified(&self) -> Vec<SubmittedQuote> {
        self.notified.lock().unwrap().clone()
    }
}

impl ApprovalClient for ScriptedApprovalClient {
    fn poll_status(&self, number: &str) -> Result<ApprovalResponse> {
        self.polls.lock().unwrap().push(number.to_string());
        self.statuses
            .lock()
            .unwrap()
            .get(number)
            .cloned()
            .unwrap_or_else(|| {
                Err(QuoteError::ExternalSyncFailure(format!(
                    "no scripted status for '{}'",
                    number
                )))
            })
    }

    fn notify_submitted(&self, quote: &SubmittedQuote) -> Result<ApprovalResponse> {
        self.notified.lock().unwrap().push(quote.clone());
        self.notify_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                Ok(ApprovalResponse {
                    status: None,
                    correlation_id: Some(format!("CPQ-{}", quote.number)),
                })
            })
    }
}

// =============================================================================
// Engine fixture
// =============================================================================

pub(crate) fn product(id: &str, list: &str, sale: Option<&str>) -> ProductInfo {
    ProductInfo {
        id: id.to_string(),
        name: format!("Product {}", id),
        sku: None,
        list_price: list.parse().unwrap(),
        sale_price: sale.map(|s| s.parse().unwrap()),
    }
}

pub(crate) fn test_catalog() -> FileCatalog {
    FileCatalog::from_products([
        product("P-100", "12.00", Some("10.00")),
        product("P-200", "3.50", None),
        product("P-300", "1.00", None),
        product("P-HUGE", "100000000000000000000", None),
    ])
}

pub(crate) fn actor(customer_id: &str) -> Actor {
    Actor::new(customer_id, format!("User {}", customer_id))
}

/// An engine wired to in-memory doubles that tests can inspect.
pub(crate) struct EngineFixture {
    pub(crate) engine: QuoteEngine,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) carts: Arc<RecordingCartSink>,
    pub(crate) approvals: Arc<ScriptedApprovalClient>,
}

impl EngineFixture {
    pub(crate) fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let carts = Arc::new(RecordingCartSink::default());
        let approvals = Arc::new(ScriptedApprovalClient::default());
        let engine = QuoteEngine::new(
            store.clone(),
            Arc::new(test_catalog()),
            carts.clone(),
            approvals.clone(),
        );
        Self {
            engine,
            store,
            carts,
            approvals,
        }
    }

    pub(crate) fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.engine = self.engine.with_lock_wait(Some(wait));
        self
    }

    /// Seed a draft owned by `customer_id` directly into the store.
    pub(crate) fn seed_draft(&self, number: &str, customer_id: &str) -> QuoteRecord {
        let record = QuoteRecord::new_draft(number, customer_id, "USD", "en-US");
        self.store.insert(record.clone());
        record
    }
}

// =============================================================================
// Desk home
// =============================================================================

pub(crate) const TEST_CATALOG_YAML: &str = r#"products:
  - id: P-100
    name: Widget
    sku: W-100
    list_price: '12.00'
    sale_price: '10.00'
  - id: P-200
    name: Gadget
    list_price: '3.50'
"#;

/// Temporary desk home with `init` already applied and a catalog present.
pub(crate) fn create_test_desk() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let ctx = crate::context::DeskContext::at(temp_dir.path());
    crate::commands::init::initialize(&ctx).unwrap();
    std::fs::write(ctx.catalog_path(), TEST_CATALOG_YAML).unwrap();
    temp_dir
}
