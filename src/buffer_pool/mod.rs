//! The buffer pool: a fixed-size frame table backed by a page file, with
//! a pluggable replacement policy.
//!
//! All pool state lives behind a single `parking_lot::Mutex`. The pool
//! does not offer finer-grained locking; concurrent callers serialize
//! behind that one mutex, matching the single-threaded semantics this
//! crate specifies.

mod frame;
mod policy;
mod stats;

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

pub use policy::ReplacementStrategy;
pub use stats::BufferPoolStats;

use crate::buffer_pool::frame::Frame;
use crate::buffer_pool::policy::{apply_access, select_victim, should_bump_tick, AccessEvent};
use crate::error::{Error, Result};
use crate::page::{PageFileStore, PageId, PAGE_SIZE};

/// History length a frame needs for `strategy`: `K` for LRU-K, `0`
/// otherwise.
fn lru_k_depth(strategy: ReplacementStrategy) -> usize {
    match strategy {
        ReplacementStrategy::LruK(k) => k,
        _ => 0,
    }
}

struct Inner {
    frames: Vec<Frame>,
    page_table: HashMap<PageId, usize>,
    strategy: ReplacementStrategy,
    tick: i64,
    clock_hand: usize,
    store: PageFileStore,
    num_read_io: u64,
    num_write_io: u64,
    cache_hits: u64,
    cache_misses: u64,
    evictions: u64,
}

/// A fixed-size pool of page frames backed by a single page file.
pub struct BufferPool {
    inner: Mutex<Inner>,
}

impl BufferPool {
    /// Opens `file_name` and initializes a pool of `num_frames` frames
    /// using `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if `file_name` does not exist.
    pub fn init(
        file_name: impl AsRef<std::path::Path>,
        num_frames: usize,
        strategy: ReplacementStrategy,
    ) -> Result<Self> {
        let store = PageFileStore::open(file_name)?;
        let history_len = lru_k_depth(strategy);
        let frames = (0..num_frames)
            .map(|_| {
                let mut f = Frame::empty();
                f.access_history = vec![0; history_len];
                f
            })
            .collect();

        Ok(Self {
            inner: Mutex::new(Inner {
                frames,
                page_table: HashMap::new(),
                strategy,
                tick: 1,
                clock_hand: 0,
                store,
                num_read_io: 0,
                num_write_io: 0,
                cache_hits: 0,
                cache_misses: 0,
                evictions: 0,
            }),
        })
    }

    /// Pins `page_id`, loading it from the page file if it is not
    /// already resident, evicting an unpinned frame if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFreeFrame`] if every frame is pinned.
    /// Returns [`Error::ReadNonExistingPage`] if `page_id` is out of the
    /// page file's range.
    pub fn pin(&self, page_id: PageId) -> Result<PageHandle<'_>> {
        if !page_id.is_valid() {
            return Err(Error::ReadNonExistingPage(page_id));
        }

        let mut inner = self.inner.lock();

        if let Some(&idx) = inner.page_table.get(&page_id) {
            inner.cache_hits += 1;
            let event = AccessEvent::Hit;
            let strategy = inner.strategy;
            if should_bump_tick(strategy, event) {
                inner.tick += 1;
            }
            let tick = inner.tick;
            let mut clock_hand = inner.clock_hand;
            let frame = &mut inner.frames[idx];
            frame.pin_count += 1;
            apply_access(frame, idx, strategy, tick, &mut clock_hand, event);
            inner.clock_hand = clock_hand;
            debug!(%page_id, frame = idx, "pin hit");
            return Ok(PageHandle {
                pool: self,
                page_id,
            });
        }

        let (idx, event) = if let Some(idx) = inner.frames.iter().position(Frame::is_empty) {
            (idx, AccessEvent::EmptyLoad)
        } else {
            let strategy = inner.strategy;
            let mut clock_hand = inner.clock_hand;
            let victim = select_victim(&mut inner.frames, strategy, &mut clock_hand);
            inner.clock_hand = clock_hand;
            let victim = victim.ok_or(Error::NoFreeFrame)?;
            self.evict_locked(&mut inner, victim)?;
            inner.evictions += 1;
            (victim, AccessEvent::EvictLoad)
        };

        inner.cache_misses += 1;

        inner.store.ensure_capacity(page_id.as_i64() as u64 + 1)?;

        {
            let Inner { frames, store, .. } = &mut *inner;
            store.read_block(page_id, &mut *frames[idx].buffer).map_err(|e| {
                warn!(%page_id, error = %e, "read_block failed during pin");
                e
            })?;
        }
        inner.num_read_io += 1;

        let strategy = inner.strategy;
        if should_bump_tick(strategy, event) {
            inner.tick += 1;
        }
        let tick = inner.tick;
        let mut clock_hand = inner.clock_hand;

        let frame = &mut inner.frames[idx];
        frame.page_id = page_id;
        frame.dirty = false;
        frame.pin_count = 1;
        apply_access(frame, idx, strategy, tick, &mut clock_hand, event);
        inner.clock_hand = clock_hand;
        inner.page_table.insert(page_id, idx);

        debug!(%page_id, frame = idx, ?event, "pin miss");

        Ok(PageHandle {
            pool: self,
            page_id,
        })
    }

    /// Unpins `page_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `page_id` is not resident.
    /// Returns [`Error::NotPinned`] if its pin count is already zero.
    pub fn unpin(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = *inner.page_table.get(&page_id).ok_or(Error::NotFound(page_id))?;
        let frame = &mut inner.frames[idx];
        if frame.pin_count == 0 {
            return Err(Error::NotPinned(page_id));
        }
        frame.pin_count -= 1;
        Ok(())
    }

    /// Marks `page_id`'s frame dirty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `page_id` is not resident.
    pub fn mark_dirty(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = *inner.page_table.get(&page_id).ok_or(Error::NotFound(page_id))?;
        inner.frames[idx].dirty = true;
        Ok(())
    }

    /// Writes `page_id`'s frame back to the page file unconditionally,
    /// clearing its dirty flag and incrementing `num_write_io` whether or
    /// not the frame was dirty beforehand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `page_id` is not resident.
    /// Returns [`Error::WriteFailed`] if the write fails.
    pub fn force_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = *inner.page_table.get(&page_id).ok_or(Error::NotFound(page_id))?;
        self.write_back_locked(&mut inner, idx, true)
    }

    /// Writes every dirty frame back to the page file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if any write fails; frames flushed
    /// before the failing one remain clean.
    pub fn force_flush_pool(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let dirty_indices: Vec<usize> = inner
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.dirty && !f.is_empty())
            .map(|(i, _)| i)
            .collect();
        for idx in dirty_indices {
            self.write_back_locked(&mut inner, idx, false)?;
        }
        Ok(())
    }

    /// Flushes every dirty frame and resets the frame table to empty.
    /// The pool remains usable afterward.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolHasPinnedPages`] if any frame is still
    /// pinned.
    pub fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.frames.iter().any(|f| f.pin_count > 0) {
            return Err(Error::PoolHasPinnedPages);
        }

        let dirty_indices: Vec<usize> = inner
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.dirty && !f.is_empty())
            .map(|(i, _)| i)
            .collect();
        for idx in dirty_indices {
            self.write_back_locked(&mut inner, idx, false)?;
        }

        let history_len = lru_k_depth(inner.strategy);
        for frame in &mut inner.frames {
            frame.reset(history_len);
        }
        inner.page_table.clear();
        inner.tick = 1;
        inner.clock_hand = 0;
        Ok(())
    }

    /// A snapshot of the pool's frame table and I/O counters.
    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        let inner = self.inner.lock();
        stats::snapshot(
            &inner.frames,
            inner.num_read_io,
            inner.num_write_io,
            inner.cache_hits,
            inner.cache_misses,
            inner.evictions,
        )
    }

    /// The pool-content string for the current frame table.
    #[must_use]
    pub fn pool_content_string(&self) -> String {
        self.stats().pool_content_string()
    }

    /// Writes `frames[idx]`'s buffer to disk. If `unconditional` is
    /// `false`, a clean frame is left untouched (used by the
    /// eviction/flush/shutdown paths, which only ever call this on
    /// frames they've already confirmed are dirty); if `true`, the write
    /// happens regardless of the dirty flag (`force_page`'s contract per
    /// spec.md §4.1).
    fn write_back_locked(&self, inner: &mut Inner, idx: usize, unconditional: bool) -> Result<()> {
        if !unconditional && !inner.frames[idx].dirty {
            return Ok(());
        }
        let page_id = inner.frames[idx].page_id;
        let buffer = *inner.frames[idx].buffer;
        inner.store.write_block(page_id, &buffer).map_err(|e| {
            warn!(%page_id, error = %e, "write_block failed during flush");
            e
        })?;
        inner.num_write_io += 1;
        inner.frames[idx].dirty = false;
        Ok(())
    }

    /// Writes the victim frame back if dirty, then resets it to empty.
    /// If the write-back fails, the frame is left untouched (still
    /// resident under its old page id) so no half-evicted frame is ever
    /// observed; if it succeeds but a later step in `pin` fails before
    /// the new page is loaded, the frame is already empty rather than
    /// holding a stale `page_id` with no corresponding `page_table` entry.
    fn evict_locked(&self, inner: &mut Inner, idx: usize) -> Result<()> {
        let victim_page = inner.frames[idx].page_id;
        self.write_back_locked(inner, idx, false)?;
        inner.page_table.remove(&victim_page);
        let history_len = lru_k_depth(inner.strategy);
        inner.frames[idx].reset(history_len);
        debug!(evicted = %victim_page, frame = idx, "evicted frame");
        Ok(())
    }

    fn data_ptr(&self, page_id: PageId) -> Result<*mut u8> {
        let mut inner = self.inner.lock();
        let idx = *inner.page_table.get(&page_id).ok_or(Error::NotFound(page_id))?;
        Ok(inner.frames[idx].buffer.as_mut_ptr())
    }
}

/// A handle to a pinned page.
///
/// Unlike an RAII guard, this handle does not unpin its page on `Drop`.
/// The buffer pool's client API treats `unpin` as its own explicit,
/// fallible operation (see [`BufferPool::unpin`]), so a pin must be
/// balanced by exactly one `unpin` call.
pub struct PageHandle<'a> {
    pool: &'a BufferPool,
    page_id: PageId,
}

impl<'a> PageHandle<'a> {
    /// The pinned page's id.
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// A read-only view of the page's buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the page is no longer resident
    /// (it cannot be, while pinned, but the frame lookup is still
    /// fallible by construction).
    pub fn data(&self) -> Result<&[u8]> {
        let ptr = self.pool.data_ptr(self.page_id)?;
        // SAFETY: this handle represents an active pin on `page_id`'s
        // frame, so the frame cannot be evicted or its buffer replaced
        // while the handle exists. The buffer was allocated once at
        // pool initialization and never moves.
        Ok(unsafe { std::slice::from_raw_parts(ptr, PAGE_SIZE) })
    }

    /// A mutable view of the page's buffer. Does not mark the page
    /// dirty; call [`BufferPool::mark_dirty`] after writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the page is no longer resident.
    pub fn data_mut(&self) -> Result<&mut [u8]> {
        let ptr = self.pool.data_ptr(self.page_id)?;
        // SAFETY: see `data`. Exclusive access is upheld by the client
        // obeying the pin/unpin protocol; the pool itself never aliases
        // a pinned frame's buffer.
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr, PAGE_SIZE) })
    }
}
