//! R2 storage module with AWS SigV4 signing
//!
//! This module provides:
//! - AWS Signature Version 4 signing for R2 requests
//! - Async upload/delete operations with per-operation timeouts
//! - A transport seam for substituting the HTTP layer in tests

pub mod client;
pub mod error;
pub mod signer;
pub mod transport;

// Re-export main types for convenience
pub use client::R2Client;
pub use error::{R2Error, Result, StorageFailure, TransportError};
pub use signer::SigV4Signer;
pub use transport::{HyperTransport, Transport, TransportRequest, TransportResponse};
