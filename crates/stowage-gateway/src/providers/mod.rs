//! Remote [`ObjectStore`](stowage_core::ObjectStore) backends.

#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "s3")]
pub use s3::S3Store;
