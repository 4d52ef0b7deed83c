use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::{SessionError, SessionResult};

/// Advisory record of assessment ids this client has already submitted.
/// The server remains the source of truth; this can desync (e.g. the file
/// is deleted), so callers treat `has` as a fast-fail hint, not a law.
#[async_trait]
pub trait SubmissionLedger: Send + Sync {
    async fn has(&self, assessment_id: &str) -> SessionResult<bool>;
    async fn mark(&self, assessment_id: &str) -> SessionResult<()>;
}

/// Ephemeral ledger for tests and one-shot tooling.
pub struct InMemoryLedger {
    submitted: RwLock<HashSet<String>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            submitted: RwLock::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionLedger for InMemoryLedger {
    async fn has(&self, assessment_id: &str) -> SessionResult<bool> {
        Ok(self.submitted.read().await.contains(assessment_id))
    }

    async fn mark(&self, assessment_id: &str) -> SessionResult<()> {
        self.submitted
            .write()
            .await
            .insert(assessment_id.to_string());
        Ok(())
    }
}

/// Ledger persisted as a JSON array of ids. Read once at construction,
/// rewritten on every successful `mark`.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    submitted: RwLock<HashSet<String>>,
}

impl JsonFileLedger {
    pub fn open(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref().to_path_buf();
        let submitted = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<HashSet<String>>(&contents)
                .map_err(|e| SessionError::Ledger(format!("Corrupt ledger file: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(SessionError::Ledger(format!(
                    "Failed to read ledger file: {}",
                    e
                )))
            }
        };

        log::debug!(
            "Opened submission ledger at {:?} ({} entries)",
            path,
            submitted.len()
        );

        Ok(Self {
            path,
            submitted: RwLock::new(submitted),
        })
    }

    fn persist(&self, submitted: &HashSet<String>) -> SessionResult<()> {
        let json = serde_json::to_string(submitted)
            .map_err(|e| SessionError::Ledger(format!("Failed to encode ledger: {}", e)))?;
        std::fs::write(&self.path, json)
            .map_err(|e| SessionError::Ledger(format!("Failed to write ledger file: {}", e)))
    }
}

#[async_trait]
impl SubmissionLedger for JsonFileLedger {
    async fn has(&self, assessment_id: &str) -> SessionResult<bool> {
        Ok(self.submitted.read().await.contains(assessment_id))
    }

    async fn mark(&self, assessment_id: &str) -> SessionResult<()> {
        let mut submitted = self.submitted.write().await;
        if submitted.insert(assessment_id.to_string()) {
            self.persist(&submitted)?;
        }
        Ok(())
    }
}
