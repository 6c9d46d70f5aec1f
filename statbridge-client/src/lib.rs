//! Client for the local statistics backend.
//!
//! This crate provides:
//! - JSON-over-HTTP calls to `http://{host}:{apiPort}{path}`
//! - Uniform handling of non-2xx responses
//! - Text or JSON response decoding

pub mod client;
pub mod error;

pub use client::{BackendClient, BackendClientBuilder, ResponseFormat};
pub use error::{BackendError, BackendResult};
pub use reqwest::Method;
