// Candidate documents in S3: resume uploads/downloads via presigned URLs,
// and free-text reviewer notes stored as one JSON object per candidate.

pub mod notes;
pub mod resume;

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;

use crate::config::Config;
use crate::errors::AppError;

pub(crate) fn presigning_config(config: &Config) -> Result<PresigningConfig, AppError> {
    PresigningConfig::expires_in(Duration::from_secs(config.presign_expiry_secs))
        .map_err(|e| AppError::S3(format!("Invalid presign expiry: {e}")))
}
