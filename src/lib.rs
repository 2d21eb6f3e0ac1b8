//! r2store - Cloudflare R2 storage client with hand-rolled AWS SigV4 signing

pub mod cli;
pub mod config;
pub mod r2;

pub use config::R2Config;
pub use r2::{R2Client, R2Error};
