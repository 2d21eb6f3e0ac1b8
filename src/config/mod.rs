//! Configuration for the storage client.
//!
//! All settings are read once at startup into an explicit struct that is
//! passed to the client's constructor; nothing consults the environment
//! after construction.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Storage domain R2 buckets are served under
const R2_STORAGE_DOMAIN: &str = "r2.cloudflarestorage.com";

/// Read-only credentials and addressing for one R2 bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct R2Config {
    /// R2 access key ID
    pub access_key_id: String,

    /// R2 secret access key
    pub secret_access_key: String,

    /// Cloudflare account ID, used to derive the endpoint hostname
    pub account_id: String,

    /// Bucket name
    pub bucket_name: String,

    /// Base URL uploaded files are publicly served from
    pub public_base_url: String,
}

impl R2Config {
    /// Endpoint hostname: `<account_id>.r2.cloudflarestorage.com`
    pub fn host(&self) -> String {
        format!("{}.{}", self.account_id, R2_STORAGE_DOMAIN)
    }

    /// Full endpoint URL for API calls
    pub fn endpoint_url(&self) -> String {
        format!("https://{}", self.host())
    }

    /// Reject configurations that could only produce unverifiable signatures
    /// or malformed request URLs.
    pub fn validate(&self) -> Result<()> {
        if self.access_key_id.is_empty() {
            anyhow::bail!("access_key_id is empty");
        }
        if self.secret_access_key.is_empty() {
            anyhow::bail!("secret_access_key is empty");
        }
        if self.account_id.is_empty() {
            anyhow::bail!("account_id is empty");
        }
        if self.bucket_name.is_empty() {
            anyhow::bail!("bucket_name is empty");
        }
        if self.public_base_url.is_empty() {
            anyhow::bail!("public_base_url is empty");
        }
        Ok(())
    }
}

/// Load configuration from environment variables.
///
/// Reads `.env` if present (don't fail if it doesn't exist). Required:
/// - `R2_ACCESS_KEY_ID`
/// - `R2_SECRET_ACCESS_KEY`
/// - `CLOUDFLARE_ACCOUNT_ID`
/// - `R2_BUCKET_NAME`
/// - `R2_PUBLIC_URL`
pub fn load_from_env() -> Result<R2Config> {
    let _ = dotenvy::dotenv();

    let config = R2Config {
        access_key_id: std::env::var("R2_ACCESS_KEY_ID")
            .context("R2_ACCESS_KEY_ID environment variable not set")?,
        secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
            .context("R2_SECRET_ACCESS_KEY environment variable not set")?,
        account_id: std::env::var("CLOUDFLARE_ACCOUNT_ID")
            .context("CLOUDFLARE_ACCOUNT_ID environment variable not set")?,
        bucket_name: std::env::var("R2_BUCKET_NAME")
            .context("R2_BUCKET_NAME environment variable not set")?,
        public_base_url: std::env::var("R2_PUBLIC_URL")
            .context("R2_PUBLIC_URL environment variable not set")?,
    };

    config.validate()?;
    Ok(config)
}
