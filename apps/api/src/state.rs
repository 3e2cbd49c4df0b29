use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::store::ItemStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Positions and candidates. Postgres in production, in-memory for local runs.
    pub store: Arc<dyn ItemStore>,
    pub s3: S3Client,
    pub config: Config,
}

/// State backed by an in-memory store and an offline S3 client with static credentials.
#[cfg(test)]
pub fn test_state() -> AppState {
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    use crate::config::StoreBackend;
    use crate::store::MemoryItemStore;

    let s3_config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-2"))
        .credentials_provider(Credentials::new("test-key", "test-secret", None, None, "test"))
        .build();

    AppState {
        store: Arc::new(MemoryItemStore::new()),
        s3: S3Client::from_conf(s3_config),
        config: Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            s3_bucket: "resumes-test".to_string(),
            s3_endpoint: None,
            aws_region: "us-east-2".to_string(),
            aws_access_key_id: "test-key".to_string(),
            aws_secret_access_key: "test-secret".to_string(),
            presign_expiry_secs: 3600,
            port: 0,
            rust_log: "info".to_string(),
        },
    }
}
