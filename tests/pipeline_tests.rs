//! Batch delete pipeline tests
//!
//! A recording soft-delete store observes chunking, commit and rollback; the
//! last tests run the pipeline end to end against SQLite.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use urlshortener::config::{DatabaseConfig, StorageBackend};
use urlshortener::errors::{Result, ShortenerError};
use urlshortener::identity::CallerId;
use urlshortener::pipeline::{DEFAULT_CHUNK_SIZE, DeletePipeline, DeleteState};
use urlshortener::storage::{SeaOrmStorage, SoftDeleteStorage, SoftDeleteTxn, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    FailOnChunk(usize),
    PanicOnChunk(usize),
    FailCommit,
}

#[derive(Default)]
struct Journal {
    begun: usize,
    chunks: Vec<(CallerId, Vec<String>)>,
    commits: usize,
    rolled_back: usize,
}

struct RecordingStore {
    journal: Arc<Mutex<Journal>>,
    fault: Fault,
}

impl RecordingStore {
    fn new(fault: Fault) -> (Arc<Self>, Arc<Mutex<Journal>>) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let store = Arc::new(Self {
            journal: journal.clone(),
            fault,
        });
        (store, journal)
    }
}

struct RecordingTxn {
    journal: Arc<Mutex<Journal>>,
    fault: Fault,
    applied: usize,
    committed: bool,
}

impl Drop for RecordingTxn {
    fn drop(&mut self) {
        if !self.committed {
            self.journal.lock().rolled_back += 1;
        }
    }
}

#[async_trait]
impl SoftDeleteTxn for RecordingTxn {
    async fn soft_delete(&mut self, caller: &CallerId, short_urls: &[String]) -> Result<u64> {
        let index = self.applied;
        self.applied += 1;
        match self.fault {
            Fault::FailOnChunk(n) if n == index => {
                return Err(ShortenerError::transaction("chunk rejected"));
            }
            Fault::PanicOnChunk(n) if n == index => panic!("store blew up"),
            _ => {}
        }
        self.journal
            .lock()
            .chunks
            .push((caller.clone(), short_urls.to_vec()));
        Ok(short_urls.len() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fault == Fault::FailCommit {
            return Err(ShortenerError::transaction("commit rejected"));
        }
        let mut this = self;
        this.committed = true;
        this.journal.lock().commits += 1;
        Ok(())
    }
}

#[async_trait]
impl SoftDeleteStorage for RecordingStore {
    async fn begin_soft_delete(&self) -> Result<Box<dyn SoftDeleteTxn>> {
        self.journal.lock().begun += 1;
        Ok(Box::new(RecordingTxn {
            journal: self.journal.clone(),
            fault: self.fault,
            applied: 0,
            committed: false,
        }))
    }
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://x/{:04}", i)).collect()
}

async fn run(fault: Fault, count: usize) -> (DeleteState, Arc<Mutex<Journal>>) {
    let (store, journal) = RecordingStore::new(fault);
    let pipeline = DeletePipeline::new(store, DEFAULT_CHUNK_SIZE);
    let ticket = pipeline.submit(CallerId::from("alice"), ids(count));
    let state = tokio::time::timeout(Duration::from_secs(10), ticket.wait())
        .await
        .expect("pipeline finished");
    (state, journal)
}

#[tokio::test]
async fn test_chunks_1200_into_500_500_200() {
    let (state, journal) = run(Fault::None, 1200).await;
    assert_eq!(state, DeleteState::Committed { rows: 1200 });

    let journal = journal.lock();
    assert_eq!(journal.begun, 1);
    assert_eq!(journal.commits, 1);
    assert_eq!(journal.rolled_back, 0);

    let sizes: Vec<usize> = journal.chunks.iter().map(|(_, c)| c.len()).collect();
    assert_eq!(sizes, vec![500, 500, 200]);

    // Supplied order is preserved across chunks
    let flattened: Vec<String> = journal
        .chunks
        .iter()
        .flat_map(|(_, c)| c.iter().cloned())
        .collect();
    assert_eq!(flattened, ids(1200));
    assert!(
        journal
            .chunks
            .iter()
            .all(|(caller, _)| caller.as_str() == "alice")
    );
}

#[tokio::test]
async fn test_exact_multiple_has_no_trailing_chunk() {
    let (state, journal) = run(Fault::None, 1000).await;
    assert_eq!(state, DeleteState::Committed { rows: 1000 });
    let sizes: Vec<usize> = journal.lock().chunks.iter().map(|(_, c)| c.len()).collect();
    assert_eq!(sizes, vec![500, 500]);
}

#[tokio::test]
async fn test_empty_list_commits_empty_transaction() {
    let (state, journal) = run(Fault::None, 0).await;
    assert_eq!(state, DeleteState::Committed { rows: 0 });
    let journal = journal.lock();
    assert_eq!(journal.begun, 1);
    assert!(journal.chunks.is_empty());
    assert_eq!(journal.commits, 1);
}

#[tokio::test]
async fn test_chunk_failure_aborts_and_rolls_back() {
    let (state, journal) = run(Fault::FailOnChunk(1), 1200).await;
    assert!(matches!(state, DeleteState::Aborted { .. }));

    let journal = journal.lock();
    assert_eq!(journal.chunks.len(), 1);
    assert_eq!(journal.commits, 0);
    assert_eq!(journal.rolled_back, 1);
}

#[tokio::test]
async fn test_panic_is_contained() {
    let (state, journal) = run(Fault::PanicOnChunk(0), 600).await;
    let DeleteState::Aborted { reason } = state else {
        panic!("expected an aborted batch");
    };
    assert!(reason.contains("panicked"));

    let journal = journal.lock();
    assert_eq!(journal.commits, 0);
    assert_eq!(journal.rolled_back, 1);
}

#[tokio::test]
async fn test_commit_failure_aborts() {
    let (state, journal) = run(Fault::FailCommit, 10).await;
    assert!(matches!(state, DeleteState::Aborted { .. }));
    assert_eq!(journal.lock().commits, 0);
}

#[tokio::test]
async fn test_custom_chunk_size() {
    let (store, journal) = RecordingStore::new(Fault::None);
    let pipeline = DeletePipeline::new(store, 3);
    let state = pipeline
        .submit(CallerId::from("alice"), ids(7))
        .wait()
        .await;
    assert_eq!(state, DeleteState::Committed { rows: 7 });
    let sizes: Vec<usize> = journal.lock().chunks.iter().map(|(_, c)| c.len()).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn test_zero_chunk_size_is_clamped() {
    let (store, _journal) = RecordingStore::new(Fault::None);
    assert_eq!(DeletePipeline::new(store, 0).chunk_size(), 1);
}

// =============================================================================
// End to end against SQLite
// =============================================================================

async fn sqlite_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        backend: StorageBackend::Relational,
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("p.db").display()),
        ..DatabaseConfig::default()
    };
    (Arc::new(SeaOrmStorage::connect(&config).await.unwrap()), dir)
}

#[tokio::test]
async fn test_sqlite_batch_delete_only_touches_caller_rows() {
    let (storage, _dir) = sqlite_storage().await;
    let alice = CallerId::from("alice");
    let bob = CallerId::from("bob");

    for i in 0..12 {
        storage
            .save_url(
                &alice,
                &format!("http://x/a{}", i),
                &format!("https://alice.example.com/{}", i),
            )
            .await
            .unwrap();
    }
    storage
        .save_url(&bob, "http://x/b0", "https://bob.example.com/0")
        .await
        .unwrap();

    let pipeline = DeletePipeline::new(storage.clone(), 5);
    let mut targets: Vec<String> = (0..10).map(|i| format!("http://x/a{}", i)).collect();
    targets.push("http://x/b0".to_string());

    let state = pipeline.submit(alice.clone(), targets).wait().await;
    assert_eq!(state, DeleteState::Committed { rows: 10 });

    let remaining = storage.urls_by_user(&alice).await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(matches!(
        storage.resolve_original(&alice, "http://x/a0").await,
        Err(ShortenerError::Deleted(_))
    ));
    assert_eq!(
        storage.resolve_original(&bob, "http://x/b0").await.unwrap(),
        "https://bob.example.com/0"
    );
}
