//! HTTP API module.
//!
//! Server, request/response types, and the log broadcaster the pipeline
//! reports through.

pub mod logs;
pub mod server;
pub mod types;

pub use server::{router, start_server, AppState};
pub use types::*;
pub use logs::*;
