//! Storage backed by an append-only text log with an in-memory cache.
//!
//! Each line holds one entry as `<id> <owner_id> <url> <is_deleted>`. Inserts
//! append a line; deletes rewrite the whole file through a temporary sibling
//! that is synced and renamed over the original, so a crash leaves either the
//! old or the new contents on disk and never a mix.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::url_index::UrlIndex;
use crate::domain::entities::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats, UrlEntry};
use crate::domain::repositories::{StorageError, StorageResult, UrlStorage};

/// Storage over a line-oriented log file.
///
/// The cache answers every read. The log handle lock serialises writers, so
/// an insert and a delete rewrite never interleave on disk. The cache only
/// changes after the corresponding disk write succeeded.
///
/// User ids are not written to the log. On restart the user counter resumes
/// after the highest owner id found in the file, so a user created without
/// any entries may have its id handed out again.
pub struct FileStorage {
    path: PathBuf,
    log: Mutex<File>,
    cache: RwLock<UrlIndex>,
}

impl FileStorage {
    /// Opens or creates the log at `path` and replays it into the cache.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Corrupt`] if a line cannot be parsed
    /// - [`StorageError::Io`] if the file cannot be read or opened for append
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let cache = replay(&path).await?;
        let log = open_for_append(&path).await?;

        let stats = cache.stats();
        info!(
            path = %path.display(),
            urls = stats.urls,
            users = stats.users,
            "Loaded URL log"
        );

        Ok(Self {
            path,
            log: Mutex::new(log),
            cache: RwLock::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(log: &mut File, entry: &UrlEntry) -> io::Result<()> {
        log.write_all(format_line(entry).as_bytes()).await?;
        log.flush().await
    }

    /// Writes the cache with `deleted` applied to a temp file and renames it
    /// over the log.
    ///
    /// Returns the handle the temp file was written through. After the rename
    /// it refers to the live log, positioned at its end, so it replaces the
    /// append handle without reopening the path.
    async fn rewrite_with(&self, deleted: &[i64]) -> StorageResult<File> {
        let deleted: HashSet<i64> = deleted.iter().copied().collect();
        let contents = {
            let cache = self.cache.read().await;
            let mut contents = String::new();
            for entry in cache.entries() {
                let mut line_entry = entry.clone();
                if deleted.contains(&entry.id) {
                    line_entry.is_deleted = true;
                }
                contents.push_str(&format_line(&line_entry));
            }
            contents
        };

        Ok(replace_log(&self.path, contents.as_bytes()).await?)
    }
}

#[async_trait]
impl UrlStorage for FileStorage {
    async fn create_user(&self) -> StorageResult<i64> {
        Ok(self.cache.write().await.create_user())
    }

    async fn insert_url(&self, url: &str, owner_id: i64) -> StorageResult<i64> {
        ensure_storable(url)?;

        let mut log = self.log.lock().await;
        let id = {
            let cache = self.cache.read().await;
            if cache.contains_url(url) {
                return Err(StorageError::AlreadyExists);
            }
            cache.next_url_id()
        };

        let entry = UrlEntry::new(id, owner_id, url);
        Self::append(&mut log, &entry).await?;
        self.cache.write().await.commit(entry);

        Ok(id)
    }

    async fn get_url_id(&self, url: &str) -> StorageResult<i64> {
        self.cache.read().await.get_id(url)
    }

    async fn get_url(&self, id: i64) -> StorageResult<String> {
        self.cache.read().await.get(id).map(str::to_owned)
    }

    async fn list_user_urls(&self, owner_id: i64) -> StorageResult<BTreeMap<i64, String>> {
        Ok(self.cache.read().await.user_urls(owner_id))
    }

    async fn insert_batch(
        &self,
        urls: Vec<BatchUrl>,
        owner_id: i64,
    ) -> StorageResult<Vec<BatchUrlId>> {
        for item in &urls {
            ensure_storable(&item.original_url)?;
        }

        let mut log = self.log.lock().await;
        let mut inserted = Vec::with_capacity(urls.len());

        for item in urls {
            let id = {
                let cache = self.cache.read().await;
                if cache.contains_url(&item.original_url) {
                    continue;
                }
                cache.next_url_id()
            };

            let entry = UrlEntry::new(id, owner_id, item.original_url);
            Self::append(&mut log, &entry).await?;
            self.cache.write().await.commit(entry);

            inserted.push(BatchUrlId {
                correlation_id: item.correlation_id,
                url_id: id,
            });
        }

        Ok(inserted)
    }

    async fn delete_batch(&self, intents: &[DeletionIntent]) -> StorageResult<()> {
        let mut log = self.log.lock().await;

        let flips = self.cache.read().await.pending_deletes(intents);
        if flips.is_empty() {
            debug!(requested = intents.len(), "Deletion batch changes nothing");
            return Ok(());
        }

        // Nothing below can fail once the log has been replaced.
        *log = self.rewrite_with(&flips).await?;
        self.cache.write().await.mark_deleted(&flips);

        debug!(
            requested = intents.len(),
            applied = flips.len(),
            "Rewrote URL log"
        );
        Ok(())
    }

    async fn stats(&self) -> StorageResult<StorageStats> {
        Ok(self.cache.read().await.stats())
    }

    async fn ping(&self) -> StorageResult<()> {
        fs::metadata(&self.path).await?;
        Ok(())
    }

    async fn close(&self) {
        let log = self.log.lock().await;
        if let Err(e) = log.sync_all().await {
            warn!(path = %self.path.display(), error = %e, "Failed to sync URL log on close");
        }
    }
}

/// The log format is space separated, so URLs with whitespace cannot be
/// stored.
fn ensure_storable(url: &str) -> StorageResult<()> {
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

fn format_line(entry: &UrlEntry) -> String {
    format!(
        "{} {} {} {}\n",
        entry.id, entry.owner_id, entry.original_url, entry.is_deleted
    )
}

fn parse_line(line: &str, number: usize) -> StorageResult<UrlEntry> {
    let corrupt = |reason: String| StorageError::Corrupt {
        line: number,
        reason,
    };

    let fields: Vec<&str> = line.split(' ').collect();
    let [id, owner_id, url, is_deleted] = fields.as_slice() else {
        return Err(corrupt(format!("expected 4 fields, found {}", fields.len())));
    };

    let id = id
        .parse::<i64>()
        .map_err(|e| corrupt(format!("invalid id {id:?}: {e}")))?;
    let owner_id = owner_id
        .parse::<i64>()
        .map_err(|e| corrupt(format!("invalid owner id {owner_id:?}: {e}")))?;
    let is_deleted = is_deleted
        .parse::<bool>()
        .map_err(|e| corrupt(format!("invalid deleted flag {is_deleted:?}: {e}")))?;
    if url.is_empty() {
        return Err(corrupt("empty url".to_string()));
    }

    Ok(UrlEntry {
        id,
        owner_id,
        original_url: (*url).to_string(),
        is_deleted,
    })
}

async fn replay(path: &Path) -> StorageResult<UrlIndex> {
    let mut index = UrlIndex::new();

    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(index),
        Err(e) => return Err(e.into()),
    };

    let mut lines = BufReader::new(file).lines();
    let mut number = 0;
    while let Some(line) = lines.next_line().await? {
        number += 1;
        if line.trim().is_empty() {
            continue;
        }
        index.restore(parse_line(&line, number)?);
    }

    Ok(index)
}

async fn open_for_append(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

/// Atomically replaces the file at `path` with `contents`.
///
/// The data goes to a hidden sibling that is synced and then renamed over
/// `path`; the sibling is removed on failure. The returned handle is the one
/// the data was written through and is positioned at the end of the file.
async fn replace_log(path: &Path, contents: &[u8]) -> io::Result<File> {
    let tmp = temp_path(path);

    let written = async {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
        fs::rename(&tmp, path).await?;
        Ok::<_, io::Error>(file)
    }
    .await;

    if written.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    written
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "urls".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let entry = parse_line("3 7 https://a.example/x?y=1 true", 1).unwrap();

        assert_eq!(entry.id, 3);
        assert_eq!(entry.owner_id, 7);
        assert_eq!(entry.original_url, "https://a.example/x?y=1");
        assert!(entry.is_deleted);
    }

    #[test]
    fn test_parse_line_rejects_bad_fields() {
        for (line, expected_reason) in [
            ("3 7 https://a.example", "expected 4 fields"),
            ("x 7 https://a.example false", "invalid id"),
            ("3 y https://a.example false", "invalid owner id"),
            ("3 7 https://a.example maybe", "invalid deleted flag"),
        ] {
            match parse_line(line, 12) {
                Err(StorageError::Corrupt { line, reason }) => {
                    assert_eq!(line, 12);
                    assert!(reason.contains(expected_reason), "{reason}");
                }
                other => panic!("expected corrupt error for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_format_line_matches_parse() {
        let entry = UrlEntry {
            id: 5,
            owner_id: 2,
            original_url: "https://a.example".to_string(),
            is_deleted: false,
        };

        assert_eq!(format_line(&entry), "5 2 https://a.example false\n");
    }

    #[test]
    fn test_ensure_storable() {
        assert!(ensure_storable("https://a.example").is_ok());
        assert!(matches!(
            ensure_storable("https://a.example/a b"),
            Err(StorageError::InvalidUrl(_))
        ));
        assert!(matches!(ensure_storable(""), Err(StorageError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_replace_log_handle_writes_to_replaced_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.log");
        std::fs::write(&path, "old\n").unwrap();

        let mut handle = replace_log(&path, b"1 1 https://a.example true\n")
            .await
            .unwrap();
        handle.write_all(b"2 1 https://b.example false\n").await.unwrap();
        handle.flush().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1 1 https://a.example true\n2 1 https://b.example false\n"
        );
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_replace_log_failure_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("urls.log");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let result = replace_log(&target, b"1 1 https://a.example false\n").await;

        assert!(result.is_err());
        assert!(!temp_path(&target).exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let tmp = temp_path(Path::new("/var/data/urls.log"));
        assert_eq!(tmp, PathBuf::from("/var/data/.urls.log.tmp"));
    }
}
