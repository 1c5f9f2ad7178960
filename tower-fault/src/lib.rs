//! # Tower Fault
//!
//! `tower-fault` wires a [`fault_bag::Bucket`] into the
//! [Tower](https://github.com/tower-rs/tower) ecosystem.
//!
//! ## How it works
//!
//! The [`FaultLayer`] wraps a service and records the outcome of every call
//! (success or failure) into a shared error bucket. While the bucket
//! reports throttling, `poll_ready` backs off:
//!
//! 1. **Wait** (default): sleep out the bucket's wait hint, then re-check.
//! 2. **Shed** (`with_fail_fast(true)`): resolve immediately with
//!    [`FaultError::Throttled`] so the caller can do its own backoff.
//!
//! The bucket's leak task is owned by the caller: start it with
//! [`fault_bag::Bucket::start`] before putting the layer in a stack,
//! otherwise a saturated bucket never drains and the service backs off
//! forever.
//!
//! ## Feature Flags
//!
//! - `axum`: Enables `IntoResponse` for [`FaultError`], allowing automatic
//!   conversion to HTTP status codes (503, 500).

mod error;
mod layer;
mod service;


pub use error::FaultError;
pub use layer::FaultLayer;
pub use service::FaultService;
