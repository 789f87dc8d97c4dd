//! # Content Store
//!
//! Per-file byte buffer with a single-writer lock and stream adapters.
//!
//! ## Contract
//!
//! - At most one [`ContentWriter`] is open per store. Opening a second one
//!   fails with [`FsError::ContentLocked`] and leaves the first untouched.
//! - An overwrite writer (`append == false`) clears the buffer as soon as it
//!   is leased, before any byte is written.
//! - The lock is released by [`ContentWriter::close`]. Dropping the writer
//!   closes it as well.
//! - A [`ContentReader`] iterates over a snapshot taken when it was opened and
//!   is never blocked by the write lock.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::{FsError, FsResult};

struct ContentState {
    data: Vec<u8>,
    locked: bool,
    modified: SystemTime,
}

struct ContentInner {
    state: Mutex<ContentState>,
    clock: Arc<dyn Clock>,
}

/// Byte buffer owned by a file node.
///
/// Cloning the handle shares the buffer; [`duplicate`](Self::duplicate)
/// produces an independent copy with its own lock.
#[derive(Clone)]
pub(crate) struct ContentStore {
    inner: Arc<ContentInner>,
}

impl ContentStore {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        let modified = clock.now();
        Self {
            inner: Arc::new(ContentInner {
                state: Mutex::new(ContentState {
                    data: Vec::new(),
                    locked: false,
                    modified,
                }),
                clock,
            }),
        }
    }

    pub(crate) fn len(&self) -> u64 {
        self.inner.state.lock().data.len() as u64
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.inner.state.lock().locked
    }

    pub(crate) fn last_modified(&self) -> SystemTime {
        self.inner.state.lock().modified
    }

    /// Independent copy of the current bytes. The copy starts unlocked.
    pub(crate) fn duplicate(&self) -> Self {
        let state = self.inner.state.lock();
        Self {
            inner: Arc::new(ContentInner {
                state: Mutex::new(ContentState {
                    data: state.data.clone(),
                    locked: false,
                    modified: state.modified,
                }),
                clock: Arc::clone(&self.inner.clock),
            }),
        }
    }

    /// Lease the write lock. `path` is only used for error context.
    pub(crate) fn writer(&self, append: bool, path: &str) -> FsResult<ContentWriter> {
        let mut state = self.inner.state.lock();
        if state.locked {
            warn!(path, "write lock already held");
            return Err(FsError::ContentLocked {
                path: path.to_string(),
            });
        }
        state.locked = true;
        if !append {
            state.data.clear();
            state.modified = self.inner.clock.now();
        }
        debug!(path, append, "opened content writer");
        Ok(ContentWriter {
            inner: Arc::clone(&self.inner),
            path: path.to_string(),
            closed: false,
        })
    }

    pub(crate) fn reader(&self, chunk_size: usize) -> ContentReader {
        ContentReader {
            data: self.inner.state.lock().data.clone(),
            position: 0,
            chunk_size: chunk_size.max(1),
        }
    }
}

/// Writable stream over a file's content.
///
/// Holds the file's write lock until [`close`](Self::close) is called or the
/// writer is dropped. Written bytes are appended to the buffer immediately.
///
/// # Example
///
/// ```rust
/// use memtree::Tree;
/// use std::io::Write;
///
/// let mut tree = Tree::new();
/// let file = tree.create_file("notes.txt");
/// tree.add_content(tree.root(), file).unwrap();
///
/// let mut writer = tree.writer(file, false).unwrap();
/// writer.write_all(b"hello").unwrap();
/// assert!(tree.writer(file, true).is_err());
/// writer.close();
///
/// assert_eq!(tree.read_to_string(file).unwrap(), "hello");
/// ```
pub struct ContentWriter {
    inner: Arc<ContentInner>,
    path: String,
    closed: bool,
}

impl ContentWriter {
    /// Path of the file at the time the writer was opened.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Release the write lock.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.inner.state.lock().locked = false;
        debug!(path = %self.path, "closed content writer");
    }
}

impl std::fmt::Debug for ContentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentWriter")
            .field("path", &self.path)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Write for ContentWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.state.lock();
        state.data.extend_from_slice(buf);
        state.modified = self.inner.clock.now();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ContentWriter {
    fn drop(&mut self) {
        self.release();
    }
}

/// Readable stream over a snapshot of a file's content.
///
/// Implements [`Read`] for byte-level consumption and [`Iterator`] for
/// pull-based chunked consumption. Each call to open a reader takes a fresh
/// snapshot; a reader itself is one-shot.
#[derive(Debug, Clone)]
pub struct ContentReader {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
}

impl ContentReader {
    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl Read for ContentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.position..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.position += n;
        Ok(n)
    }
}

impl Iterator for ContentReader {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.data.len() {
            return None;
        }
        let end = (self.position + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        Some(chunk)
    }
}
