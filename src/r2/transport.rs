//! HTTP transport seam
//!
//! The client signs requests and hands them to a [`Transport`]; everything
//! network-specific (TLS, connection pooling, deadlines) lives behind this
//! trait so tests can substitute a recording fake.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::r2::error::TransportError;

/// Bound on TCP connection setup, separate from the per-operation deadline
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One fully-signed HTTP request, ready to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// Names are lowercase; hyper's own wire casing does not affect the signature.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    /// Deadline for the whole round trip, chosen per operation by the client.
    pub timeout: Duration,
}

/// Status and collected body of a completed round trip.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Capability to send one signed HTTP request and collect the response.
///
/// Object-safe via `#[async_trait]` so the client can hold `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by hyper with native-tls (OpenSSL).
pub struct HyperTransport {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(CONNECT_TIMEOUT));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = TlsConnector::new().expect("Failed to build TLS connector");
        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .set_host(true)
            .build(https);

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = Request::builder().method(request.method).uri(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let req = builder.body(Full::new(request.body))?;

        let round_trip = async {
            let response = self
                .client
                .request(req)
                .await
                .map_err(TransportError::Connect)?;
            let status = response.status();
            let body = response
                .collect()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
                .to_bytes();
            Ok(TransportResponse { status, body })
        };

        tokio::time::timeout(request.timeout, round_trip)
            .await
            .map_err(|_| TransportError::Timeout(request.timeout))?
    }
}
