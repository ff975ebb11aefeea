//! RCON packet framing
//!
//! Every packet on the wire is laid out little-endian as:
//!
//! ```text
//! i32 length   (bytes that follow this field)
//! i32 request id
//! i32 type
//! [u8] body
//! 0x00 0x00
//! ```

use std::io::{Read, Write};

use super::error::{RconError, Result};

/// Login request carrying the password
pub const SERVERDATA_AUTH: i32 = 3;
/// Server reply to a login request
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
/// Command request
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
/// Command output
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// Request id the server uses to signal a rejected login
pub const AUTH_FAILED_ID: i32 = -1;

/// Longest command body Minecraft servers accept
pub const MAX_COMMAND_LEN: usize = 1446;

/// Upper bound on an incoming packet's length field
const MAX_PACKET_LEN: usize = 64 * 1024;

/// id + type + two terminating NULs
const HEADER_LEN: usize = 4 + 4 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: Vec<u8>,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Serialize into a single buffer, length prefix included
    pub fn encode(&self) -> Vec<u8> {
        let length = (HEADER_LEN + self.body.len()) as i32;
        let mut buf = Vec::with_capacity(4 + HEADER_LEN + self.body.len());
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(&self.body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()?;
        Ok(())
    }

    /// Read exactly one packet, validating the length field and terminator
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let length = i32::from_le_bytes(len_buf);

        let length = usize::try_from(length)
            .ok()
            .filter(|len| (HEADER_LEN..=MAX_PACKET_LEN).contains(len))
            .ok_or_else(|| RconError::Protocol(format!("invalid packet length {}", length)))?;

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload)?;

        if payload[length - 2..] != [0, 0] {
            return Err(RconError::Protocol(
                "packet is missing its NUL terminator".to_string(),
            ));
        }

        let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let kind = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        payload.truncate(length - 2);
        let body = payload.split_off(8);

        Ok(Self { id, kind, body })
    }
}
