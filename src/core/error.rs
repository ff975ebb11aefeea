//! Error type for the RCON connector

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RconError {
    #[error("Failed to connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("Authentication rejected by server")]
    Authentication,

    #[error("Command is {len} bytes, the server accepts at most {max}")]
    CommandTooLong { len: usize, max: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RconError>;
