//! Serialized writer for the single appended output document.
//!
//! Fetch tasks run concurrently but exactly one task owns the file. Each
//! dispatched document holds a sequence number assigned in crawl order; the
//! writer buffers out-of-order arrivals and appends pages strictly by
//! sequence. A task that produces no page must still release its sequence
//! with [`AppendHandle::skip`] so later pages are not held back.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::pdf::{PageImage, PdfAppender};

const CHANNEL_CAPACITY: usize = 64;

type Reply = oneshot::Sender<Result<u64, io::Error>>;

struct Slot {
    sequence: u64,
    page: Option<PageImage>,
    reply: Option<Reply>,
}

/// Result of a finished append run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Pages in the document.
    pub pages: usize,
    /// Final file length in bytes.
    pub bytes: u64,
}

/// Owner of the append writer task.
#[derive(Debug)]
pub struct AppendWriter {
    task: JoinHandle<io::Result<AppendOutcome>>,
    path: PathBuf,
}

/// Cloneable sender side handed to fetch tasks.
#[derive(Debug, Clone)]
pub struct AppendHandle {
    tx: mpsc::Sender<Slot>,
    path: Arc<PathBuf>,
}

impl AppendWriter {
    /// Creates (or truncates) `path`, writes an empty document and starts the writer task.
    ///
    /// # Errors
    ///
    /// Returns the IO error if the file cannot be created or the initial
    /// document cannot be written.
    pub async fn create(path: impl Into<PathBuf>) -> io::Result<(Self, AppendHandle)> {
        let path = path.into();
        let mut file = File::create(&path).await?;
        let (appender, header) = PdfAppender::start();
        file.write_all(&header).await?;
        file.flush().await?;
        debug!(path = %path.display(), "append document created");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run_writer(file, appender, rx));
        let handle = AppendHandle {
            tx,
            path: Arc::new(path.clone()),
        };
        Ok((Self { task, path }, handle))
    }

    /// Path of the document being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the writer task to flush and exit.
    ///
    /// Every [`AppendHandle`] must have been dropped first, otherwise this
    /// waits forever.
    ///
    /// # Errors
    ///
    /// Returns the final flush error, or an error if the writer task panicked.
    pub async fn finish(self) -> io::Result<AppendOutcome> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(format!("append writer task failed: {e}"))),
        }
    }
}

impl AppendHandle {
    /// Submits the page for `sequence` and waits until it is on disk.
    ///
    /// Returns the number of bytes appended.
    ///
    /// # Errors
    ///
    /// Returns an IO error if this or an earlier append failed, or the writer is gone.
    pub async fn append(&self, sequence: u64, page: PageImage) -> io::Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Slot {
                sequence,
                page: Some(page),
                reply: Some(reply),
            })
            .await
            .map_err(|_| writer_closed())?;
        rx.await.map_err(|_| writer_closed())?
    }

    /// Releases `sequence` without a page.
    pub async fn skip(&self, sequence: u64) {
        let slot = Slot {
            sequence,
            page: None,
            reply: None,
        };
        if self.tx.send(slot).await.is_err() {
            debug!(sequence, "append writer already closed");
        }
    }

    /// Path of the document being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn writer_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "append writer closed")
}

struct WriterState {
    file: File,
    appender: PdfAppender,
    failure: Option<(io::ErrorKind, String)>,
}

async fn run_writer(
    file: File,
    appender: PdfAppender,
    mut rx: mpsc::Receiver<Slot>,
) -> io::Result<AppendOutcome> {
    let mut state = WriterState {
        file,
        appender,
        failure: None,
    };
    let mut pending: BTreeMap<u64, Slot> = BTreeMap::new();
    let mut next = 0u64;

    while let Some(slot) = rx.recv().await {
        pending.insert(slot.sequence, slot);
        while let Some(slot) = pending.remove(&next) {
            next += 1;
            state.write_slot(slot).await;
        }
    }

    if !pending.is_empty() {
        warn!(
            waiting_for = next,
            orphaned = pending.len(),
            "sequence gap at close, appending remaining pages in order"
        );
        for (_, slot) in pending {
            state.write_slot(slot).await;
        }
    }

    state.file.flush().await?;
    if let Some((kind, message)) = state.failure {
        return Err(io::Error::new(kind, message));
    }
    let outcome = AppendOutcome {
        pages: state.appender.page_count(),
        bytes: state.appender.len() as u64,
    };
    info!(pages = outcome.pages, bytes = outcome.bytes, "append document closed");
    Ok(outcome)
}

impl WriterState {
    async fn write_slot(&mut self, slot: Slot) {
        let Some(page) = slot.page else {
            return;
        };
        let result = self.append(&page).await;
        if let Some(reply) = slot.reply {
            // The task may have been dropped; the page is written either way.
            let _ = reply.send(result);
        }
    }

    async fn append(&mut self, page: &PageImage) -> io::Result<u64> {
        if let Some((kind, message)) = &self.failure {
            return Err(io::Error::new(*kind, message.clone()));
        }
        let bytes = self.appender.append_page(page);
        match self.file.write_all(&bytes).await {
            Ok(()) => {
                debug!(page = self.appender.page_count(), bytes = bytes.len(), "page appended");
                Ok(bytes.len() as u64)
            }
            Err(e) => {
                warn!(error = %e, "append failed, rejecting further pages");
                self.failure = Some((e.kind(), e.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn page(width: u32) -> PageImage {
        PageImage {
            width,
            height: 1,
            data: vec![0x78, 0x9c, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01],
        }
    }

    fn count(haystack: &[u8], needle: &str) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle.as_bytes())
            .count()
    }

    #[tokio::test]
    async fn test_pages_written_in_sequence_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        let (writer, handle) = AppendWriter::create(&path).await.unwrap();

        let late = handle.clone();
        let second = tokio::spawn(async move { late.append(1, page(20)).await });
        tokio::task::yield_now().await;
        handle.append(0, page(10)).await.unwrap();
        second.await.unwrap().unwrap();
        drop(handle);

        let outcome = writer.finish().await.unwrap();
        assert_eq!(outcome.pages, 2);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, outcome.bytes);
        let first = bytes
            .windows(17)
            .position(|w| w == b"/MediaBox [0 0 10")
            .unwrap();
        let second = bytes
            .windows(17)
            .position(|w| w == b"/MediaBox [0 0 20")
            .unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_skipped_sequence_does_not_block() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        let (writer, handle) = AppendWriter::create(&path).await.unwrap();

        handle.skip(0).await;
        handle.append(1, page(5)).await.unwrap();
        drop(handle);

        let outcome = writer.finish().await.unwrap();
        assert_eq!(outcome.pages, 1);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(count(&bytes, "%%EOF"), 2);
    }

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, vec![b'x'; 10_000]).unwrap();

        let (writer, handle) = AppendWriter::create(&path).await.unwrap();
        assert_eq!(handle.path(), path.as_path());
        drop(handle);
        let outcome = writer.finish().await.unwrap();

        assert_eq!(outcome.pages, 0);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }
}
