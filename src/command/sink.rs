//! Command sinks: the narrow edge to the outbound message channel.
//!
//! One call, one outbound message, in emission order.  Nothing is buffered
//! and no response is read.

use std::net::TcpStream;

use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::{Alphabet, Command};
use crate::error::ChannelError;

/// Destination for emitted commands.
pub trait CommandSink {
    /// Hand one command to the channel.
    fn send(&mut self, command: Command) -> Result<(), ChannelError>;

    /// Close the channel.  Closing an already closed sink is a no-op.
    fn close(&mut self) -> Result<(), ChannelError>;
}

// ── WebSocket ──────────────────────────────────────────────

/// Sends each command as a one-character WebSocket text message.
pub struct WebSocketSink {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    alphabet: Alphabet,
    endpoint: String,
    sent: u64,
}

impl WebSocketSink {
    /// Open the channel.  Called once at session start.
    pub fn connect(endpoint: &str, alphabet: Alphabet) -> Result<Self, ChannelError> {
        let (socket, response) =
            tungstenite::connect(endpoint).map_err(|e| ChannelError::Connect {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            })?;
        info!(endpoint, status = %response.status(), "command channel connected");
        Ok(Self {
            socket: Some(socket),
            alphabet,
            endpoint: endpoint.to_string(),
            sent: 0,
        })
    }
}

impl CommandSink for WebSocketSink {
    fn send(&mut self, command: Command) -> Result<(), ChannelError> {
        let socket = self.socket.as_mut().ok_or(ChannelError::Closed)?;
        let ch = self.alphabet.encode(command);
        socket
            .send(Message::text(ch.to_string()))
            .map_err(|e| ChannelError::Send(Box::new(e)))?;
        self.sent += 1;
        debug!(command = command.as_str(), ch = ?ch, "command sent");
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        let Some(mut socket) = self.socket.take() else {
            return Ok(());
        };
        let result = socket.close(None).and_then(|()| socket.flush());
        info!(endpoint = %self.endpoint, sent = self.sent, "command channel closed");
        match result {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(ChannelError::Close(Box::new(e))),
        }
    }
}

impl Drop for WebSocketSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("command channel close on drop failed: {}", e);
        }
    }
}

// ── Dry run ────────────────────────────────────────────────

/// Logs commands instead of sending them.
#[derive(Debug, Default)]
pub struct LogSink {
    alphabet: Alphabet,
    sent: u64,
    closed: bool,
}

impl LogSink {
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            sent: 0,
            closed: false,
        }
    }
}

impl CommandSink for LogSink {
    fn send(&mut self, command: Command) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.sent += 1;
        info!(
            command = command.as_str(),
            ch = ?self.alphabet.encode(command),
            "dry-run command"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        if !self.closed {
            self.closed = true;
            info!(sent = self.sent, "dry-run sink closed");
        }
        Ok(())
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Records commands; optionally fails once `fail_after` sends succeeded.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub sent: Vec<Command>,
    pub closed: bool,
    pub fail_after: Option<usize>,
}

#[cfg(test)]
impl CommandSink for RecordingSink {
    fn send(&mut self, command: Command) -> Result<(), ChannelError> {
        if self.closed || self.fail_after.is_some_and(|n| self.sent.len() >= n) {
            return Err(ChannelError::Closed);
        }
        self.sent.push(command);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        Ok(())
    }
}
