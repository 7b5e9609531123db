//! Object store adapter (cAdapter)
//!
//! Submodules:
//! - `client`: the `ObjectBackend` trait and the `ObjectClient` used by the
//!   striper
//! - `localfs`: one local directory per pool
//! - `memory`: in-process map, for tests
//! - `s3`: S3-compatible adapter (pool = bucket)
pub mod client;
pub mod localfs;
pub mod memory;
pub mod s3;
