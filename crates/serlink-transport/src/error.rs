/// Errors that can occur while establishing a link.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The local adapter is missing, disabled, or otherwise unusable.
    #[error("link adapter unavailable: {reason}")]
    AdapterUnavailable { reason: String },

    /// The address does not name a reachable endpoint.
    #[error("cannot resolve link address {address}")]
    Unresolved { address: String },

    /// The remote endpoint refused the connection or the handshake failed.
    #[error("connection to {address} refused: {source}")]
    Refused {
        address: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConnectError>;
