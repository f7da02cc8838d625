//! Replacement policies and their per-frame/per-pool bookkeeping.
//!
//! Every policy shares the same frame table and the same monotonic
//! `tick` counter; what differs is (a) whether a given access advances
//! `tick` at all, and (b) what a frame's `counter`/`access_history`
//! means and how a victim is chosen from it. Both halves were verified
//! by hand against spec scenarios S1 (FIFO), S2 (LRU), S3 (CLOCK) and S4
//! (LFU) — see `DESIGN.md`.

use crate::buffer_pool::frame::Frame;

/// A pluggable page-replacement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
    /// LRU-K with history depth `K`. `K` must be `>= 1`.
    LruK(usize),
    Lfu,
    Clock,
}

/// The kind of access a frame just received, used to decide whether the
/// pool's shared `tick` should advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessEvent {
    /// The requested page was already resident.
    Hit,
    /// The requested page was loaded into a previously empty frame.
    EmptyLoad,
    /// The requested page was loaded after evicting another page.
    EvictLoad,
}

/// Whether `tick` advances for this `(strategy, event)` pair.
#[must_use]
pub fn should_bump_tick(strategy: ReplacementStrategy, event: AccessEvent) -> bool {
    match strategy {
        ReplacementStrategy::Fifo | ReplacementStrategy::Lfu => event == AccessEvent::EvictLoad,
        ReplacementStrategy::Lru => matches!(event, AccessEvent::Hit | AccessEvent::EvictLoad),
        ReplacementStrategy::LruK(_) => true,
        ReplacementStrategy::Clock => false,
    }
}

/// Updates a frame's ordering bookkeeping after an access.
///
/// `tick` is the pool's shared counter *after* any bump from
/// [`should_bump_tick`] has already been applied by the caller.
pub fn apply_access(
    frame: &mut Frame,
    frame_idx: usize,
    strategy: ReplacementStrategy,
    tick: i64,
    clock_hand: &mut usize,
    event: AccessEvent,
) {
    match strategy {
        ReplacementStrategy::Fifo => {
            if event != AccessEvent::Hit {
                frame.counter = tick;
            }
        }
        ReplacementStrategy::Lru => {
            frame.counter = tick;
        }
        ReplacementStrategy::Lfu => {
            if event == AccessEvent::Hit {
                frame.counter += 1;
            } else {
                frame.counter = tick;
            }
        }
        ReplacementStrategy::Clock => {
            frame.ref_bit = true;
            *clock_hand = frame_idx;
        }
        ReplacementStrategy::LruK(k) => {
            push_history(&mut frame.access_history, tick, k);
        }
    }
}

/// Pushes `tick` to the front of `history`, keeping at most `k` entries.
pub fn push_history(history: &mut Vec<i64>, tick: i64, k: usize) {
    history.insert(0, tick);
    history.truncate(k);
}

/// Selects an eviction victim among `frames`, returning its index.
///
/// Only frames with `pin_count == 0` are eligible. Returns `None` if no
/// frame is evictable.
pub fn select_victim(
    frames: &mut [Frame],
    strategy: ReplacementStrategy,
    clock_hand: &mut usize,
) -> Option<usize> {
    match strategy {
        ReplacementStrategy::Clock => select_victim_clock(frames, clock_hand),
        ReplacementStrategy::LruK(k) => frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_evictable())
            .min_by_key(|(_, f)| lru_k_key(f, k))
            .map(|(idx, _)| idx),
        ReplacementStrategy::Fifo | ReplacementStrategy::Lru | ReplacementStrategy::Lfu => frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_evictable())
            .min_by_key(|(_, f)| f.counter)
            .map(|(idx, _)| idx),
    }
}

/// LRU-K's ordering key: the timestamp of the `K`-th most recent access.
/// Frames are seeded with `K` zero entries at init, so a frame with
/// fewer than `K` real accesses still has a well-defined (zero) value
/// here, which sorts before any real tick and so is preferred as a
/// victim — matching the legacy semantics this policy is modeled on.
fn lru_k_key(frame: &Frame, k: usize) -> i64 {
    debug_assert!(k >= 1, "LRU-K depth must be at least 1");
    frame.access_history[k - 1]
}

/// CLOCK's bounded sweep: starting at `*clock_hand`, examine at most
/// `2 * frames.len()` slots. A frame is skipped if it's pinned or its
/// reference bit is set; in either case its reference bit is cleared
/// before moving on. The first unpinned, unreferenced frame found
/// becomes the victim and the hand is left pointing at it.
fn select_victim_clock(frames: &mut [Frame], clock_hand: &mut usize) -> Option<usize> {
    let n = frames.len();
    if n == 0 {
        return None;
    }

    for step in 0..2 * n {
        let idx = (*clock_hand + step) % n;
        let frame = &mut frames[idx];
        if frame.pin_count == 0 && !frame.ref_bit {
            *clock_hand = idx;
            return Some(idx);
        }
        frame.ref_bit = false;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evictable_frame(page: i64, counter: i64) -> Frame {
        let mut f = Frame::empty();
        f.page_id = crate::page::PageId::new(page);
        f.counter = counter;
        f
    }

    #[test]
    fn fifo_ignores_hits_for_tick_bump() {
        assert!(!should_bump_tick(
            ReplacementStrategy::Fifo,
            AccessEvent::Hit
        ));
        assert!(!should_bump_tick(
            ReplacementStrategy::Fifo,
            AccessEvent::EmptyLoad
        ));
        assert!(should_bump_tick(
            ReplacementStrategy::Fifo,
            AccessEvent::EvictLoad
        ));
    }

    #[test]
    fn lru_bumps_on_hit_and_evict_load() {
        assert!(should_bump_tick(
            ReplacementStrategy::Lru,
            AccessEvent::Hit
        ));
        assert!(!should_bump_tick(
            ReplacementStrategy::Lru,
            AccessEvent::EmptyLoad
        ));
        assert!(should_bump_tick(
            ReplacementStrategy::Lru,
            AccessEvent::EvictLoad
        ));
    }

    #[test]
    fn lru_k_always_bumps() {
        for event in [AccessEvent::Hit, AccessEvent::EmptyLoad, AccessEvent::EvictLoad] {
            assert!(should_bump_tick(ReplacementStrategy::LruK(2), event));
        }
    }

    #[test]
    fn clock_never_bumps() {
        for event in [AccessEvent::Hit, AccessEvent::EmptyLoad, AccessEvent::EvictLoad] {
            assert!(!should_bump_tick(ReplacementStrategy::Clock, event));
        }
    }

    #[test]
    fn min_counter_victim_selection_picks_lowest_index_on_tie() {
        let mut frames = vec![
            evictable_frame(1, 5),
            evictable_frame(2, 3),
            evictable_frame(3, 3),
        ];
        let mut hand = 0;
        let victim = select_victim(&mut frames, ReplacementStrategy::Fifo, &mut hand);
        assert_eq!(victim, Some(1));
    }

    #[test]
    fn pinned_frames_are_never_chosen() {
        let mut frames = vec![evictable_frame(1, 1)];
        frames[0].pin_count = 1;
        let mut hand = 0;
        assert_eq!(select_victim(&mut frames, ReplacementStrategy::Lru, &mut hand), None);
    }

    #[test]
    fn lru_k_prefers_frame_with_fewer_recorded_accesses() {
        let mut frames = vec![evictable_frame(1, 0), evictable_frame(2, 0)];
        frames[0].access_history = vec![10, 5];
        frames[1].access_history = vec![12, 0];
        let mut hand = 0;
        let victim = select_victim(&mut frames, ReplacementStrategy::LruK(2), &mut hand);
        assert_eq!(victim, Some(1));
    }

    #[test]
    fn clock_sweep_clears_ref_bits_and_advances_hand() {
        let mut frames = vec![evictable_frame(1, 0), evictable_frame(2, 0), evictable_frame(3, 0)];
        frames[0].ref_bit = true;
        frames[1].ref_bit = true;
        frames[2].ref_bit = false;
        let mut hand = 0;
        let victim = select_victim(&mut frames, ReplacementStrategy::Clock, &mut hand);
        assert_eq!(victim, Some(2));
        assert_eq!(hand, 2);
        assert!(!frames[0].ref_bit);
        assert!(!frames[1].ref_bit);
    }

    #[test]
    fn clock_sweep_clears_pinned_frames_ref_bits_too() {
        let mut frames = vec![evictable_frame(1, 0), evictable_frame(2, 0)];
        frames[0].ref_bit = true;
        frames[0].pin_count = 1;
        let mut hand = 0;
        let victim = select_victim(&mut frames, ReplacementStrategy::Clock, &mut hand);
        assert_eq!(victim, Some(1));
        assert!(!frames[0].ref_bit);
    }

    #[test]
    fn push_history_keeps_most_recent_k_entries() {
        let mut history = vec![];
        push_history(&mut history, 1, 2);
        push_history(&mut history, 2, 2);
        push_history(&mut history, 3, 2);
        assert_eq!(history, vec![3, 2]);
    }
}
