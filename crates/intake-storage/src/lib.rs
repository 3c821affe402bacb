//! Intake Storage Library
//!
//! Storage abstraction for registration documents: presigned PUT/GET URLs on an
//! S3-compatible bucket and streamed writes to the local filesystem.
//!
//! # Storage key format
//!
//! All backends share the layout in [`keys`]:
//! `uploads/{registrationId}/{plates|general}/[{discriminator}_]{fileName}`.
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_local_storage, create_signer};
pub use intake_core::StorageBackend;
pub use keys::{parse_key, resolve_key, FileType, ParsedKey};
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
