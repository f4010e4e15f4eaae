//! On-disk header storage.

mod disk;

pub use disk::HeaderStore;

/// Name of the backing file inside the data directory.
pub const HEADERS_FILE_NAME: &str = "blockchain_headers";
