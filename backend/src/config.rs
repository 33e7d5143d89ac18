//! Server configuration from the environment.
//!
//! `.env` is loaded by the binary before this is read.
//!
//! | Variable                   | Default |
//! |----------------------------|---------|
//! | `BCA_MATRIX_PORT`          | 3000    |
//! | `BCA_MATRIX_MAX_UPLOAD_MB` | 25      |

use std::env;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Settings for `bca-matrix serve`
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Multipart body limit in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read from process environment; unset or unparsable values use defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("BCA_MATRIX_PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);

        let max_upload_bytes = lookup("BCA_MATRIX_MAX_UPLOAD_MB")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(defaults.max_upload_bytes);

        Self { port, max_upload_bytes }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}
