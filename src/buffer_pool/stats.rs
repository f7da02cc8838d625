//! Buffer pool statistics and the pool-content string format.

use std::fmt::Write as _;

use crate::buffer_pool::frame::Frame;
use crate::page::PageId;

/// A point-in-time snapshot of a buffer pool's frame table and I/O
/// counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Page id resident in each frame, in frame-index order.
    pub frame_contents: Vec<PageId>,
    /// Dirty flag of each frame, in frame-index order.
    pub dirty_flags: Vec<bool>,
    /// Pin count of each frame, in frame-index order.
    pub fix_counts: Vec<u32>,
    /// Total blocks read from the page file since the pool was
    /// initialized.
    pub num_read_io: u64,
    /// Total blocks written to the page file since the pool was
    /// initialized.
    pub num_write_io: u64,
    /// Count of `pin` calls satisfied by an already-resident frame.
    pub cache_hits: u64,
    /// Count of `pin` calls that required a load from the page file.
    pub cache_misses: u64,
    /// Count of `pin` calls that required evicting a resident frame.
    pub evictions: u64,
}

impl BufferPoolStats {
    /// Fraction of `pin` calls satisfied without touching the page file.
    ///
    /// Returns `0.0` when no pin has been issued yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Total number of `pin` calls this snapshot has seen.
    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.cache_hits + self.cache_misses
    }

    /// Renders the frame table as the pool-content string used by test
    /// assertions: comma-joined, no extra spaces, each frame written as
    /// `[p c]` when clean or `[px c]` when dirty (`p` = page id, `c` =
    /// fix count).
    #[must_use]
    pub fn pool_content_string(&self) -> String {
        let mut out = String::new();
        for (i, page_id) in self.frame_contents.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            fmt_frame(&mut out, *page_id, self.dirty_flags[i], self.fix_counts[i]);
        }
        out
    }
}

/// Writes one frame's entry: `[3 0]` for a clean frame holding page 3
/// with fix count 0, `[5x0]` for the same frame dirty.
fn fmt_frame(out: &mut String, page_id: PageId, dirty: bool, fix_count: u32) {
    if dirty {
        let _ = write!(out, "[{page_id}x{fix_count}]");
    } else {
        let _ = write!(out, "[{page_id} {fix_count}]");
    }
}

/// Builds a [`BufferPoolStats`] snapshot from the live frame table.
pub(crate) fn snapshot(
    frames: &[Frame],
    num_read_io: u64,
    num_write_io: u64,
    cache_hits: u64,
    cache_misses: u64,
    evictions: u64,
) -> BufferPoolStats {
    BufferPoolStats {
        frame_contents: frames.iter().map(|f| f.page_id).collect(),
        dirty_flags: frames.iter().map(|f| f.dirty).collect(),
        fix_counts: frames.iter().map(|f| f.pin_count).collect(),
        num_read_io,
        num_write_io,
        cache_hits,
        cache_misses,
        evictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_frame_renders_with_space() {
        let mut out = String::new();
        fmt_frame(&mut out, PageId::new(3), false, 0);
        assert_eq!(out, "[3 0]");
    }

    #[test]
    fn dirty_frame_renders_with_x() {
        let mut out = String::new();
        fmt_frame(&mut out, PageId::new(5), true, 0);
        assert_eq!(out, "[5x0]");
    }

    #[test]
    fn pool_content_string_is_comma_joined() {
        let stats = BufferPoolStats {
            frame_contents: vec![PageId::new(3), PageId::new(4), PageId::new(5)],
            dirty_flags: vec![false, true, false],
            fix_counts: vec![0, 1, 0],
            num_read_io: 0,
            num_write_io: 0,
            cache_hits: 0,
            cache_misses: 0,
            evictions: 0,
        };
        assert_eq!(stats.pool_content_string(), "[3 0],[4x1],[5 0]");
    }

    #[test]
    fn hit_rate_with_no_accesses_is_zero() {
        let stats = BufferPoolStats {
            frame_contents: vec![],
            dirty_flags: vec![],
            fix_counts: vec![],
            num_read_io: 0,
            num_write_io: 0,
            cache_hits: 0,
            cache_misses: 0,
            evictions: 0,
        };
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_computes_fraction() {
        let stats = BufferPoolStats {
            frame_contents: vec![],
            dirty_flags: vec![],
            fix_counts: vec![],
            num_read_io: 0,
            num_write_io: 0,
            cache_hits: 3,
            cache_misses: 1,
            evictions: 0,
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.total_accesses(), 4);
    }
}
