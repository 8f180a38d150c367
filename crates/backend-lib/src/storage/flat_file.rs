//! Flat-file identity store: one JSON line per identity in
//! `<root>/identities.jsonl`.
use std::{
    fs,
    io::SeekFrom,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{
    fs as tokio_fs,
    io::{AsyncSeekExt, AsyncWriteExt},
    sync::RwLock,
};
use tracing::warn;

use super::{IdentityFilter, IdentityRecord, IdentityStore};
use crate::error::AppError;

const IDENTITIES_FILE: &str = "identities.jsonl";

/// Append-only flat-file implementation of [`IdentityStore`]
#[derive(Clone)]
pub struct FlatFileStorage {
    path: PathBuf,
    // creates take the write half so the uniqueness check and the append
    // cannot interleave with another create or with a reader
    lock: Arc<RwLock<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            path: root.join(IDENTITIES_FILE),
            lock: Arc::new(RwLock::new(())),
        })
    }

    /// Read all identities. Caller must hold `lock`.
    async fn read_all(&self) -> Result<Vec<IdentityRecord>, AppError> {
        Ok(self.snapshot().await?.records)
    }

    /// Parse the file. Caller must hold `lock`.
    async fn snapshot(&self) -> Result<Snapshot, AppError> {
        if !tokio_fs::try_exists(&self.path).await? {
            return Ok(Snapshot::default());
        }
        let content = tokio_fs::read_to_string(&self.path).await?;
        Snapshot::parse(&content)
    }

    async fn find(&self, filter: IdentityFilter<'_>) -> Result<Option<IdentityRecord>, AppError> {
        let _guard = self.lock.read().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|record| filter.matches(record)))
    }
}

#[async_trait]
impl IdentityStore for FlatFileStorage {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<IdentityRecord>, AppError> {
        self.find(IdentityFilter::Handle(handle)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, AppError> {
        self.find(IdentityFilter::Email(email)).await
    }

    async fn count_where(&self, filter: IdentityFilter<'_>) -> Result<u64, AppError> {
        let _guard = self.lock.read().await;
        let count = self
            .read_all()
            .await?
            .iter()
            .filter(|record| filter.matches(record))
            .count();
        Ok(count as u64)
    }

    async fn create(&self, record: IdentityRecord) -> Result<(), AppError> {
        let _guard = self.lock.write().await;
        let snapshot = self.snapshot().await?;

        if let Some(field) = snapshot
            .records
            .iter()
            .find_map(|existing| record.conflicts_with(existing))
        {
            return Err(AppError::Conflict(field));
        }

        let mut buf = String::new();
        if snapshot.needs_newline {
            buf.push('\n');
        }
        buf.push_str(&serde_json::to_string(&record)?);
        buf.push('\n');

        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .await?;
        if snapshot.intact_len < file.metadata().await?.len() {
            warn!(path = %self.path.display(), "dropping torn trailing record");
            file.set_len(snapshot.intact_len).await?;
        }
        file.seek(SeekFrom::Start(snapshot.intact_len)).await?;

        let written = async {
            file.write_all(buf.as_bytes()).await?;
            file.flush().await
        }
        .await;
        if let Err(err) = written {
            // leave the file as it was before this append
            if let Err(rollback) = file.set_len(snapshot.intact_len).await {
                warn!(error = %rollback, "failed to roll back partial append");
            }
            return Err(err.into());
        }

        tracing::debug!(handle = %record.handle, "identity appended");
        Ok(())
    }
}

/// Parsed file contents
#[derive(Debug, Default)]
struct Snapshot {
    records: Vec<IdentityRecord>,
    // bytes up to the end of the last intact record
    intact_len: u64,
    // the last intact record lacks its terminating newline
    needs_newline: bool,
}

impl Snapshot {
    /// Parse JSON lines. An unparsable final line is the remnant of an
    /// interrupted append and is skipped; corruption anywhere else is an error.
    fn parse(content: &str) -> Result<Self, AppError> {
        let segments: Vec<(usize, &str)> = content
            .split_inclusive('\n')
            .scan(0, |offset, segment| {
                let start = *offset;
                *offset += segment.len();
                Some((start, segment))
            })
            .filter(|(_, segment)| !segment.trim().is_empty())
            .collect();

        let mut snapshot = Snapshot {
            intact_len: content.len() as u64,
            ..Snapshot::default()
        };
        for (index, (start, segment)) in segments.iter().enumerate() {
            match serde_json::from_str(segment.trim()) {
                Ok(record) => snapshot.records.push(record),
                Err(err) if index + 1 == segments.len() => {
                    warn!(error = %err, "skipping torn trailing record");
                    snapshot.intact_len = *start as u64;
                    return Ok(snapshot);
                },
                Err(err) => return Err(err.into()),
            }
        }
        snapshot.needs_newline = !content.is_empty() && !content.ends_with('\n');
        Ok(snapshot)
    }
}
