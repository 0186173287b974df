//! Read-only operations on the served directory
//!
//! Listing, file sizes and byte-range reads, all confined to one root.

pub mod slice;
pub mod store;

pub use slice::SliceReader;
pub use store::FileStore;
