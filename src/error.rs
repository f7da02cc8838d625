//! Error types for buffer pool operations.

use thiserror::Error;

use crate::page::PageId;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Error types surfaced by the buffer pool and its page-file store.
#[derive(Debug, Error)]
pub enum Error {
    /// The page file could not be opened because it does not exist.
    #[error("page file not found: {0}")]
    FileNotFound(String),

    /// An operation was attempted against a store with no open file handle.
    #[error("page file handle not initialized")]
    FileHandleNotInit,

    /// A read targeted a page number at or beyond the file's current extent.
    #[error("attempted to read non-existing page {0}")]
    ReadNonExistingPage(PageId),

    /// A write to the page file failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// No unpinned frame was available to satisfy an eviction.
    #[error("no free frame available for eviction")]
    NoFreeFrame,

    /// `shutdown` was called while one or more frames were still pinned.
    #[error("buffer pool has pinned pages")]
    PoolHasPinnedPages,

    /// `unpin` targeted a page that is not resident or already at a zero pin count.
    #[error("page {0} is not pinned")]
    NotPinned(PageId),

    /// An operation targeted a page id with no resident frame.
    #[error("page {0} not found in buffer pool")]
    NotFound(PageId),

    /// An unclassified I/O failure from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
