//! Object upload at the backend boundary.

use async_trait::async_trait;

use crate::error::Result;

/// An abstract object store for uploaded media.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `bytes` under `key` in `bucket` and returns the public URL
    /// of the stored object. Rejections (transport, quota, unsupported
    /// type) surface as the `Upload` error variant.
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<String>;
}
