//! Git access: per-unit handle cache, line diffs and shared repository helpers.

pub mod cache;
pub mod diff;
pub mod repository;

pub use cache::{CachedRepositoryHandle, HandleCache};
