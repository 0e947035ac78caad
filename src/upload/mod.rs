mod blob_client;
mod error;
mod types;

pub use blob_client::{AzureBlobClient, BlobUploader};
pub use error::UploadError;
pub use types::{FileHandle, FileOutcome, UploadedBlob, BLOB_PREFIX};
