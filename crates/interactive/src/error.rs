use marker_protocol::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the interactive marker client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("unknown marker: {0}")]
    UnknownMarker(String),
    #[error("marker {marker} has no open menu")]
    MenuNotOpen { marker: String },
    #[error("menu entry {entry} of marker {marker} cannot be selected")]
    InvalidMenuSelection { marker: String, entry: u32 },
}

pub type Result<T> = std::result::Result<T, ClientError>;
