//! Cloud Storage module

pub mod reference;
pub mod types;

/// Core Storage client over REST
pub mod storage;

pub use reference::StorageReference;
pub use storage::Storage;
pub use types::ObjectMetadata;
