//! File storage shim: multipart uploads to the studio backend and public
//! URLs for stored objects.

mod bucket;

pub use bucket::{BucketApi, StorageClient, UploadData, UploadOptions};
