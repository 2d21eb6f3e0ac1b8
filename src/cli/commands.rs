use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::Path;
use tracing::info;

use crate::r2::R2Client;

/// Upload a local file and print its public URL.
pub async fn cmd_put(client: &R2Client, file: &Path, key: &str, content_type: &str) -> Result<()> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    info!(key, bytes = data.len(), "uploading object");
    let url = client.upload(Bytes::from(data), key, content_type).await?;

    println!("{}", url);
    Ok(())
}

/// Delete an object by key.
pub async fn cmd_rm(client: &R2Client, key: &str) -> Result<()> {
    info!(key, "deleting object");
    client.delete(key).await?;

    println!("deleted {}", key);
    Ok(())
}
