//! Uploader boundary.
//!
//! The network upload client is an external collaborator; this crate only
//! defines the seam it is called through.

use async_trait::async_trait;

use crate::Result;
use crate::database::models::PublishJobDbModel;

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Platform-assigned id of the published video.
    pub platform_video_id: String,
    /// Public URL of the published video.
    pub platform_url: String,
}

/// Synchronous-per-job upload client.
///
/// Invoked once per `uploading` transition; the implementation owns
/// authentication, encoding and transport. A failed attempt returns an
/// error whose message is stored on the job as `last_error`.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, job: &PublishJobDbModel) -> Result<UploadOutcome>;
}
