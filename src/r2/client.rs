//! R2 storage client
//!
//! Each operation performs exactly one signed HTTP round trip. The client
//! holds read-only configuration and is safe to share across concurrent
//! tasks; timestamps and signatures are computed per call, so concurrent
//! uploads and deletes never race over mutable state.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::Method;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::config::R2Config;
use crate::r2::error::{R2Error, Result, StorageFailure};
use crate::r2::signer::{self, SigV4Signer};
use crate::r2::transport::{HyperTransport, Transport, TransportRequest, TransportResponse};

/// Uploads carry large binary payloads; give them a minutes-scale deadline.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);
/// Deletes carry no body and should fail fast.
const DELETE_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers every signed request must carry.
const REQUIRED_SIGNED_HEADERS: &[&str] = &["host", "x-amz-date", "x-amz-content-sha256"];

/// Client for Cloudflare R2 object storage (S3-compatible).
///
/// Clone is cheap - the transport is shared behind an `Arc`.
#[derive(Clone)]
pub struct R2Client {
    transport: Arc<dyn Transport>,
    signer: SigV4Signer,
    host: String,
    endpoint_url: String,
    bucket: String,
    public_base_url: String,
}

impl R2Client {
    /// Create a client backed by the production hyper transport.
    pub fn new(config: &R2Config) -> Self {
        Self::with_transport(config, Arc::new(HyperTransport::new()))
    }

    /// Create a client with a caller-supplied transport.
    ///
    /// Tests inject a recording fake here; production code uses [`R2Client::new`].
    pub fn with_transport(config: &R2Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            signer: SigV4Signer::new(config.access_key_id.clone(), &config.secret_access_key),
            host: config.host(),
            endpoint_url: config.endpoint_url(),
            bucket: config.bucket_name.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload `data` under `key` and return the public URL it is served from.
    ///
    /// The URL is a deterministic derivation from the configured public base,
    /// not a round-trip confirmation that the object resolves.
    pub async fn upload(&self, data: Bytes, key: &str, content_type: &str) -> Result<String> {
        ensure_key(key)?;

        // One timestamp per call: the x-amz-date header and the credential
        // scope must name the same instant.
        let timestamp = Utc::now();

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), self.host.clone());
        headers.insert("content-type".to_string(), content_type.to_string());
        headers.insert("x-amz-date".to_string(), signer::format_amz_date(timestamp));
        headers.insert(
            "x-amz-content-sha256".to_string(),
            signer::payload_sha256(&data),
        );

        let request =
            self.signed_request(Method::PUT, key, headers, data, timestamp, UPLOAD_TIMEOUT)?;
        self.dispatch(request).await?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    /// Upload from an async reader.
    ///
    /// SigV4 requires the payload hash up front, so the reader is fully
    /// drained to memory before signing; true streaming upload is not
    /// supported by this design.
    pub async fn upload_from_reader<R>(
        &self,
        mut reader: R,
        key: &str,
        content_type: &str,
    ) -> Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        ensure_key(key)?;

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| R2Error::Validation(format!("payload stream failed: {}", e)))?;

        self.upload(Bytes::from(data), key, content_type).await
    }

    /// Delete the object at `key`.
    ///
    /// The backend's verdict on a missing key is passed through untouched;
    /// any 2xx counts as success.
    pub async fn delete(&self, key: &str) -> Result<()> {
        ensure_key(key)?;

        let timestamp = Utc::now();

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), self.host.clone());
        headers.insert("x-amz-date".to_string(), signer::format_amz_date(timestamp));
        headers.insert(
            "x-amz-content-sha256".to_string(),
            signer::EMPTY_PAYLOAD_SHA256.to_string(),
        );

        let request = self.signed_request(
            Method::DELETE,
            key,
            headers,
            Bytes::new(),
            timestamp,
            DELETE_TIMEOUT,
        )?;
        self.dispatch(request).await?;

        Ok(())
    }

    /// Sign the assembled headers and build the outgoing request.
    ///
    /// The canonical URI and the request URL are derived from the same
    /// encoding pass, so the signed bytes always match the wire bytes.
    fn signed_request(
        &self,
        method: Method,
        key: &str,
        mut headers: BTreeMap<String, String>,
        body: Bytes,
        timestamp: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<TransportRequest> {
        for name in REQUIRED_SIGNED_HEADERS {
            if !headers.contains_key(*name) {
                return Err(R2Error::Signing(format!(
                    "required header {} missing from signing set",
                    name
                )));
            }
        }

        let path = format!("/{}/{}", self.bucket, key);
        let authorization =
            self.signer
                .authorization_header(method.as_str(), &path, &headers, &body, timestamp);
        headers.insert("authorization".to_string(), authorization);

        let url = format!("{}{}", self.endpoint_url, signer::uri_encode(&path, false));
        debug!(%method, %url, bytes = body.len(), "sending signed storage request");

        Ok(TransportRequest {
            method,
            url,
            headers,
            body,
            timeout,
        })
    }

    /// Send the request and map any non-2xx status into an error.
    async fn dispatch(&self, request: TransportRequest) -> Result<TransportResponse> {
        let response = self.transport.send(request).await.map_err(R2Error::from)?;

        if !response.status.is_success() {
            return Err(R2Error::Storage(StorageFailure::Response {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }));
        }

        Ok(response)
    }
}

fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(R2Error::Validation("object key cannot be empty".to_string()));
    }
    Ok(())
}
