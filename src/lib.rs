//! QR mail gateway library.
//!
//! Renders QR codes into inline email attachments and submits input proofs
//! to an on-chain contract, behind a small axum HTTP surface.

pub mod artifacts;
pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mail;
pub mod observability;
pub mod pipeline;
pub mod qr;

pub use config::ServiceConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
