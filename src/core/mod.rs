//! RCON connection components.
//!
//! This module contains the client side of the remote console protocol:
//!
//! - **packet**: framing for the little-endian RCON packet format
//! - **session**: authenticated connection exposing `send` / `disconnect`
//! - **error**: error type shared by both
//!
//! # Architecture
//!
//! ```text
//! RemoteConsole (implements Connector)
//! ├── TcpStream (one persistent connection)
//! └── Packet (request id + type + body)
//! ```

pub mod error;
pub mod packet;
pub mod session;

pub use error::{RconError, Result};
pub use session::{Connector, RemoteConsole, Response, Timeouts};
