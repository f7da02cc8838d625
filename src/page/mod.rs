//! Page identity and the page-file store adapter.

mod page_id;
mod store;

pub use page_id::PageId;
pub use store::PageFileStore;

/// Fixed size, in bytes, of every page in a page file.
pub const PAGE_SIZE: usize = 4096;
