//! Address resolution: parsing, repository discovery and revision validation.

pub mod address;
pub mod locator;
pub mod resolver;

pub use address::{
    build_address, normalize, normalize_path, ParsedAddress, DEFAULT_REVISION, SCHEME,
};
pub use locator::{locate, RepositoryRoot};
pub use resolver::{ContextResolver, ObjectRef, ResolvedContext, ResolvedSummary};
