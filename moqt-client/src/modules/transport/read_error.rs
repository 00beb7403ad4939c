use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The stream has been closed.
    #[error("stream closed by peer")]
    Closed,
    /// The stream has been reset by the peer.
    #[error("stream reset by peer")]
    Reset,
    /// The underlying connection is gone.
    #[error("connection lost")]
    ConnectionLost,
    /// Any other transport-level failure.
    #[error("transport failure: {0}")]
    Other(String),
}
