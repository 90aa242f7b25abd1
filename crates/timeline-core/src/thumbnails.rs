//! Thumbnail strip loader.
//!
//! Thumbnails are numbered from 1 and requested at most once each: the
//! loader keeps a cursor (`created_up_to`) that only moves forward. Fetches
//! run as tokio tasks and report back over an unbounded channel; the owner
//! drains that channel on its own thread and applies the results to the
//! scene.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clipline_common::config::ThumbnailConfig;
use clipline_common::error::{ClipError, ClipResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// First thumbnail index.
pub const FIRST_THUMBNAIL_INDEX: u32 = 1;

/// Everything except RFC 3986 unreserved characters.
const ASSET_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One thumbnail to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub directory: PathBuf,
    pub index: u32,
}

/// A resolved, loadable thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailImage {
    pub index: u32,
    pub path: PathBuf,
    /// URL a webview can load the image from.
    pub uri: String,
    pub byte_len: u64,
}

/// Result of one fetch, delivered back to the loader's owner.
#[derive(Debug)]
pub struct ThumbnailOutcome {
    pub index: u32,
    pub result: ClipResult<ThumbnailImage>,
}

/// Resolves thumbnail requests into images.
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    async fn fetch(&self, request: &ThumbnailRequest) -> ClipResult<ThumbnailImage>;
}

/// Reads `<directory>/<index>.<extension>` from disk.
#[derive(Debug, Clone)]
pub struct FsThumbnailSource {
    extension: String,
}

impl FsThumbnailSource {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self::new(config.extension.clone())
    }

    pub fn path_for(&self, request: &ThumbnailRequest) -> PathBuf {
        request
            .directory
            .join(format!("{}.{}", request.index, self.extension))
    }
}

impl Default for FsThumbnailSource {
    fn default() -> Self {
        Self::new("bmp")
    }
}

#[async_trait]
impl ThumbnailSource for FsThumbnailSource {
    async fn fetch(&self, request: &ThumbnailRequest) -> ClipResult<ThumbnailImage> {
        let path = self.path_for(request);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipError::FileNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(ClipError::thumbnail(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        Ok(ThumbnailImage {
            index: request.index,
            uri: asset_uri(&path),
            byte_len: metadata.len(),
            path,
        })
    }
}

/// `asset://localhost/<percent-encoded absolute path>`.
pub fn asset_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!(
        "asset://localhost/{}",
        utf8_percent_encode(&raw, ASSET_PATH)
    )
}

/// Issues thumbnail fetches and collects their outcomes.
pub struct ThumbnailLoader {
    source: Arc<dyn ThumbnailSource>,
    runtime: Handle,
    created_up_to: u32,
    in_flight: HashSet<u32>,
    tx: mpsc::UnboundedSender<ThumbnailOutcome>,
    rx: mpsc::UnboundedReceiver<ThumbnailOutcome>,
}

impl ThumbnailLoader {
    pub fn new(source: Arc<dyn ThumbnailSource>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            created_up_to: FIRST_THUMBNAIL_INDEX,
            in_flight: HashSet::new(),
            tx,
            rx,
        }
    }

    /// Loader bound to the runtime of the calling context.
    pub fn on_current_runtime(source: Arc<dyn ThumbnailSource>) -> ClipResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ClipError::thumbnail(format!("no tokio runtime available: {e}")))?;
        Ok(Self::new(source, runtime))
    }

    /// Request every index in `[created_up_to, upto)` that has not been
    /// requested yet. Returns the number of fetches spawned.
    pub fn populate_up_to(&mut self, directory: &Path, upto: u32) -> usize {
        let mut spawned = 0;

        for index in self.created_up_to..upto {
            if !self.in_flight.insert(index) {
                continue;
            }

            let source = Arc::clone(&self.source);
            let tx = self.tx.clone();
            let request = ThumbnailRequest {
                directory: directory.to_path_buf(),
                index,
            };
            self.runtime.spawn(async move {
                let result = source.fetch(&request).await;
                // The receiver lives as long as the loader.
                let _ = tx.send(ThumbnailOutcome { index, result });
            });
            spawned += 1;
        }

        self.created_up_to = self.created_up_to.max(upto);
        tracing::debug!(
            directory = %directory.display(),
            upto,
            spawned,
            created_up_to = self.created_up_to,
            "Requested thumbnails"
        );
        spawned
    }

    /// Outcomes that have arrived so far, without waiting.
    pub fn drain_ready(&mut self) -> Vec<ThumbnailOutcome> {
        let mut ready = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            self.in_flight.remove(&outcome.index);
            ready.push(outcome);
        }
        ready
    }

    /// Wait for the next outcome. `None` when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<ThumbnailOutcome> {
        if self.in_flight.is_empty() {
            return None;
        }
        let outcome = self.rx.recv().await?;
        self.in_flight.remove(&outcome.index);
        Some(outcome)
    }

    /// Wait for every in-flight fetch and return all outcomes.
    pub async fn wait_idle(&mut self) -> Vec<ThumbnailOutcome> {
        let mut outcomes = self.drain_ready();
        while let Some(outcome) = self.next_outcome().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn created_up_to(&self) -> u32 {
        self.created_up_to
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

impl std::fmt::Debug for ThumbnailLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailLoader")
            .field("created_up_to", &self.created_up_to)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        requested: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl ThumbnailSource for RecordingSource {
        async fn fetch(&self, request: &ThumbnailRequest) -> ClipResult<ThumbnailImage> {
            self.requested.lock().unwrap().push(request.index);
            if request.index == 3 {
                return Err(ClipError::thumbnail("decode failed"));
            }
            Ok(ThumbnailImage {
                index: request.index,
                path: request.directory.join(format!("{}.bmp", request.index)),
                uri: String::new(),
                byte_len: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_populate_requests_each_index_once() {
        let source = Arc::new(RecordingSource::default());
        let mut loader = ThumbnailLoader::on_current_runtime(source.clone()).unwrap();
        let dir = Path::new("/thumbs");

        assert_eq!(loader.populate_up_to(dir, 5), 4);
        assert_eq!(loader.populate_up_to(dir, 5), 0);
        assert_eq!(loader.populate_up_to(dir, 2), 0);
        assert_eq!(loader.created_up_to(), 5);

        let outcomes = loader.wait_idle().await;
        assert_eq!(outcomes.len(), 4);
        assert_eq!(loader.in_flight_count(), 0);

        let mut requested = source.requested.lock().unwrap().clone();
        requested.sort_unstable();
        assert_eq!(requested, vec![1, 2, 3, 4]);

        let failed: Vec<u32> = outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.index)
            .collect();
        assert_eq!(failed, vec![3]);
    }

    #[tokio::test]
    async fn test_cursor_only_moves_forward() {
        let mut loader =
            ThumbnailLoader::on_current_runtime(Arc::new(RecordingSource::default())).unwrap();
        let dir = Path::new("/thumbs");

        loader.populate_up_to(dir, 3);
        assert_eq!(loader.populate_up_to(dir, 6), 3);
        assert_eq!(loader.created_up_to(), 6);
        assert_eq!(loader.wait_idle().await.len(), 5);
        assert!(loader.next_outcome().await.is_none());
    }

    #[tokio::test]
    async fn test_fs_source_resolves_existing_files() {
        let dir = std::env::temp_dir().join(format!("clipline-thumbs-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("1.bmp"), b"BM0000").await.unwrap();

        let source = FsThumbnailSource::default();
        let found = source
            .fetch(&ThumbnailRequest {
                directory: dir.clone(),
                index: 1,
            })
            .await
            .unwrap();
        assert_eq!(found.byte_len, 6);
        assert!(found.uri.starts_with("asset://localhost/"));
        assert!(found.uri.ends_with("1.bmp"));

        let missing = source
            .fetch(&ThumbnailRequest {
                directory: dir.clone(),
                index: 2,
            })
            .await;
        assert!(matches!(missing, Err(ClipError::FileNotFound { .. })));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_asset_uri_encodes_path() {
        let uri = asset_uri(Path::new("/tmp/my clips/1.bmp"));
        assert_eq!(uri, "asset://localhost/%2Ftmp%2Fmy%20clips%2F1.bmp");

        let uri = asset_uri(Path::new("/tmp/café~v1/a_b-2.bmp"));
        assert_eq!(uri, "asset://localhost/%2Ftmp%2Fcaf%C3%A9~v1%2Fa_b-2.bmp");
    }

    #[test]
    fn test_loader_requires_runtime() {
        let result = ThumbnailLoader::on_current_runtime(Arc::new(RecordingSource::default()));
        assert!(result.is_err());
    }
}
