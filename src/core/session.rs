//! Session management
//!
//! Owns the authenticated TCP connection to the RCON server and correlates
//! each command with its response by request id. Long output arrives split
//! over several packets sharing the request id; an empty packet sent after
//! each command marks where the response ends.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::{RconError, Result};
use super::packet::{
    Packet, AUTH_FAILED_ID, MAX_COMMAND_LEN, SERVERDATA_AUTH, SERVERDATA_AUTH_RESPONSE,
    SERVERDATA_EXECCOMMAND, SERVERDATA_RESPONSE_VALUE,
};

/// Text returned for one command, with the request id it answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: String,
    pub id: i32,
}

/// The two operations the console needs from a live session
pub trait Connector {
    /// Send one command and wait for its response
    fn send(&mut self, command: &str) -> Result<Response>;

    /// Close the session. Safe to call more than once.
    fn disconnect(&mut self);
}

/// An authenticated RCON connection
pub struct RemoteConsole {
    /// Socket, `None` once disconnected
    stream: Option<TcpStream>,
    /// "host:port" for log lines
    endpoint: String,
    /// Next request id to hand out
    next_id: i32,
}

/// How long a session may wait on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bounds the TCP connect and the login exchange
    pub connect: Duration,
    /// Bounds each command round-trip; `None` waits as long as the server takes
    pub command: Option<Duration>,
}

impl RemoteConsole {
    /// Connect to `host:port` and log in with `password`
    pub fn connect(host: &str, port: u16, password: &str, timeouts: Timeouts) -> Result<Self> {
        let endpoint = format!("{}:{}", host, port);
        info!("Connecting to {}", endpoint);

        let stream = open_stream(host, port, timeouts.connect)
            .and_then(|stream| {
                set_timeouts(&stream, Some(timeouts.connect))?;
                stream.set_nodelay(true)?;
                Ok(stream)
            })
            .map_err(|source| RconError::Connection {
                endpoint: endpoint.clone(),
                source,
            })?;

        let mut console = Self {
            stream: Some(stream),
            endpoint,
            next_id: 1,
        };
        console.authenticate(password)?;
        set_timeouts(console.stream()?, timeouts.command)?;
        info!(
            "Authenticated with {} (command timeout {:?})",
            console.endpoint, timeouts.command
        );
        Ok(console)
    }

    fn authenticate(&mut self, password: &str) -> Result<()> {
        let id = self.allocate_id();
        self.write_packet(&Packet::new(id, SERVERDATA_AUTH, password))?;

        loop {
            let packet = self.read_packet()?;
            match packet.kind {
                // Some servers send an empty response value ahead of the auth reply
                SERVERDATA_RESPONSE_VALUE if packet.body.is_empty() => {
                    debug!("Skipping empty packet before auth reply");
                }
                SERVERDATA_AUTH_RESPONSE if packet.id == AUTH_FAILED_ID => {
                    warn!("Server at {} rejected the password", self.endpoint);
                    return Err(RconError::Authentication);
                }
                SERVERDATA_AUTH_RESPONSE if packet.id == id => return Ok(()),
                kind => {
                    return Err(RconError::Protocol(format!(
                        "unexpected auth reply (id {}, type {})",
                        packet.id, kind
                    )));
                }
            }
        }
    }

    /// Hand out request ids 1, 2, 3, ... wrapping back to 1
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        id
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(|| {
            RconError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "session is disconnected",
            ))
        })
    }

    fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        packet.write_to(self.stream()?)
    }

    fn read_packet(&mut self) -> Result<Packet> {
        Packet::read_from(self.stream()?)
    }
}

impl Connector for RemoteConsole {
    fn send(&mut self, command: &str) -> Result<Response> {
        if command.len() > MAX_COMMAND_LEN {
            return Err(RconError::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_LEN,
            });
        }

        // The server answers packets in order, so the reply to a trailing
        // empty packet marks the end of a response split over several packets
        let id = self.allocate_id();
        let terminator = self.allocate_id();
        self.write_packet(&Packet::new(id, SERVERDATA_EXECCOMMAND, command))?;
        self.write_packet(&Packet::new(terminator, SERVERDATA_RESPONSE_VALUE, ""))?;

        let mut body = Vec::new();
        let mut fragments = 0usize;
        loop {
            let packet = self.read_packet()?;
            match packet.id {
                AUTH_FAILED_ID => return Err(RconError::Authentication),
                reply if reply == id => {
                    body.extend_from_slice(&packet.body);
                    fragments += 1;
                }
                reply if reply == terminator => break,
                reply => {
                    return Err(RconError::Protocol(format!(
                        "response id {} does not match request id {}",
                        reply, id
                    )));
                }
            }
        }

        debug!(
            "Request {} answered with {} bytes in {} packet(s)",
            id,
            body.len(),
            fragments
        );
        Ok(Response {
            text: String::from_utf8_lossy(&body).into_owned(),
            id,
        })
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("Socket shutdown failed: {}", e);
            }
            info!("Disconnected from {}", self.endpoint);
        }
    }
}

fn set_timeouts(stream: &TcpStream, timeout: Option<Duration>) -> io::Result<()> {
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)
}

/// Try every resolved address in turn, keeping the last failure
fn open_stream(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    let mut last_err =
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses");

    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_err = e;
            }
        }
    }
    Err(last_err)
}
