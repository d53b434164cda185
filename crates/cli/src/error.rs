//! Structured errors for the rise-edr CLI.
//!
//! Command errors keep their [`ErrorKind`] so the process exit code tells a
//! bad query apart from an unreachable upstream. Setup failures (config,
//! opening the cache) go through `anyhow` in `main` instead.

use rise_core::{Error, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] Error),

    #[error("OUTPUT_ERROR: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Output(_) => 70,
            CliError::Engine(err) => match err.kind() {
                ErrorKind::Query => 65,
                ErrorKind::NoData => 66,
                ErrorKind::Connection => 69,
            },
        }
    }
}
