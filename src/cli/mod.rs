//! Command-line interface: upload and delete objects with the shared client.

pub mod commands;
