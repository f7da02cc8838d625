//! Page-file store adapter.
//!
//! A page file is a flat file whose length is always a multiple of
//! [`PAGE_SIZE`]. Page *i* occupies bytes `[i * PAGE_SIZE, (i+1) *
//! PAGE_SIZE)`. This is the external collaborator the buffer pool's core
//! consumes; it has no knowledge of frames, pins, or replacement policy.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};
use crate::page::{PageId, PAGE_SIZE};

/// File-backed store for fixed-size pages.
///
/// Mirrors the legacy `storage_mgr` interface: `open`/`close` manage the
/// file handle; `read_block`/`write_block` move `PAGE_SIZE`-byte blocks;
/// `ensure_capacity`/`append_empty_block` grow the file.
pub struct PageFileStore {
    path: PathBuf,
    file: File,
    total_pages: u64,
}

impl PageFileStore {
    /// Creates a fresh, single-page (all-zero) page file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub fn create(path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        Ok(())
    }

    /// Opens an existing page file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if `path` does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|_| Error::FileNotFound(path.display().to_string()))?;

        let len = file.metadata()?.len();
        let total_pages = len / PAGE_SIZE as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            total_pages,
        })
    }

    /// Closes the store, releasing the underlying file handle.
    pub fn close(self) {
        drop(self);
    }

    /// Path of the underlying page file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages currently in the file.
    #[must_use]
    pub fn num_pages(&self) -> u64 {
        self.total_pages
    }

    /// Reads page `page_id` into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadNonExistingPage`] if `page_id` is negative or
    /// at/beyond the file's current extent (equality is out of range —
    /// the legacy implementation's off-by-one `>` comparison is not
    /// reproduced here). Returns [`Error::Io`] on a short or failed read.
    pub fn read_block(&mut self, page_id: PageId, dst: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() || page_id.as_i64() as u64 >= self.total_pages {
            return Err(Error::ReadNonExistingPage(page_id));
        }

        let offset = page_id.as_i64() as u64 * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(dst)?;
        Ok(())
    }

    /// Writes `src` to page `page_id`, extending the file first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if `page_id` is negative or the
    /// write fails.
    pub fn write_block(&mut self, page_id: PageId, src: &[u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::WriteFailed(format!(
                "cannot write negative page id {page_id}"
            )));
        }

        self.ensure_capacity(page_id.as_i64() as u64 + 1)?;

        let offset = page_id.as_i64() as u64 * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset)).map_err(|e| {
            warn!(%page_id, error = %e, "seek failed during write_block");
            Error::WriteFailed(e.to_string())
        })?;
        self.file.write_all(src).map_err(|e| {
            warn!(%page_id, error = %e, "write_all failed during write_block");
            Error::WriteFailed(e.to_string())
        })?;
        Ok(())
    }

    /// Appends a single zeroed page, growing the file by `PAGE_SIZE` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure.
    pub fn append_empty_block(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.total_pages += 1;
        Ok(())
    }

    /// Extends the file with zeroed pages until it holds at least `n` pages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure.
    pub fn ensure_capacity(&mut self, n: u64) -> Result<()> {
        while self.total_pages < n {
            self.append_empty_block()?;
        }
        Ok(())
    }
}
