use std::{io, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use shared::protocol::SubmissionRecord;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create log directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append to submission log '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode answers: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to encode csv row: {0}")]
    Row(#[from] csv::Error),
}

/// Append-only destination for submission records.
///
/// There is no read side; collected data is consumed offline.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), PersistenceError>;
}

/// CSV file with one row per submission.
///
/// Rows are `timestamp,visitor_id,page,answers` where `answers` is a JSON
/// object. Each append opens the file, writes one whole row and syncs it
/// while holding the lock, so concurrent submissions never share a line.
#[derive(Clone)]
pub struct SubmissionLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl SubmissionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn ensure_parent_dir_exists(&self) -> Result<(), PersistenceError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }

        fs::create_dir_all(parent)
            .await
            .map_err(|source| PersistenceError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl SubmissionStore for SubmissionLog {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), PersistenceError> {
        let row = encode_row(&record.columns()?)?;

        let _guard = self.lock.lock().await;
        self.ensure_parent_dir_exists().await?;

        let write_err = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;
        append_row(&mut file, &row).await.map_err(write_err)?;

        debug!(path = %self.path.display(), bytes = row.len(), "appended submission row");
        Ok(())
    }
}

/// Byte sink a row is appended to, with enough control to undo a failed write.
#[async_trait]
trait AppendTarget: Send {
    async fn len(&mut self) -> io::Result<u64>;
    async fn write_row(&mut self, row: &[u8]) -> io::Result<()>;
    async fn truncate(&mut self, len: u64) -> io::Result<()>;
}

#[async_trait]
impl AppendTarget for fs::File {
    async fn len(&mut self) -> io::Result<u64> {
        Ok(self.metadata().await?.len())
    }

    async fn write_row(&mut self, row: &[u8]) -> io::Result<()> {
        self.write_all(row).await?;
        self.flush().await?;
        self.sync_data().await
    }

    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len).await?;
        self.sync_data().await
    }
}

/// Writes `row` whole or cuts the target back to its previous length.
async fn append_row<T: AppendTarget>(target: &mut T, row: &[u8]) -> io::Result<()> {
    let prior_len = target.len().await?;
    if let Err(err) = target.write_row(row).await {
        if let Err(rollback) = target.truncate(prior_len).await {
            error!(error = %rollback, prior_len, "failed to roll back partial submission row");
        }
        return Err(err);
    }
    Ok(())
}

/// Encodes one CSV row terminated by `\r\n`, quoting only where needed.
pub fn encode_row<S: AsRef<str>>(fields: &[S]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(fields.iter().map(|field| field.as_ref()))?;
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
