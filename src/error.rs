//! Error types for the tracking, capture, and command-channel layers.

use thiserror::Error;

/// Errors raised while turning tracker output into hands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackingError {
    /// The tracker handed over a hand with the wrong number of landmarks.
    #[error("malformed hand: expected {expected} landmarks, got {got}")]
    MalformedInput { expected: usize, got: usize },

    /// A landmark coordinate is NaN or infinite.
    #[error("malformed hand: landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { index: usize },
}

/// Errors raised by a frame source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("frame source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unparseable frame on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Errors raised by the outbound command channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    #[error("failed to send command: {0}")]
    Send(#[source] Box<tungstenite::Error>),

    #[error("failed to close channel: {0}")]
    Close(#[source] Box<tungstenite::Error>),

    #[error("channel already closed")]
    Closed,
}

/// Reasons a control session ended abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
