//! Library crate for striprados: striped object upload/download/listing over
//! a pluggable object store. The binary in main.rs is a thin CLI on top.

pub mod cadapter;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod sdk;
pub mod striper;

pub use error::{Result, StriperError};
pub use sdk::StripedClient;
pub use striper::layout::LayoutPolicy;
