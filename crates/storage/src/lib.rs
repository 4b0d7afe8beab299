//! Storage abstractions for the genmap service.
//!
//! Provides an upload client for S3-compatible object storage
//! (Cloudflare R2, MinIO, AWS S3).

pub mod object_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig};
