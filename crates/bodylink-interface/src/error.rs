use thiserror::Error;

use bodylink_core::error::{ConfigError, MapError};

use crate::backend::{ModelLoadError, TransportError};
use crate::capabilities::Capability;

/// Errors surfaced by [`RobotInterface`](crate::interface::RobotInterface)
/// and [`InterfaceRegistry`](crate::registry::InterfaceRegistry).
///
/// All variants are local, recoverable failures reported to the immediate
/// caller; a failed operation never aborts the process and never corrupts
/// the registry (a failed `store` simply does not insert).
#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error("Joint mapping failed: {0}")]
    Map(#[from] MapError),

    #[error("Joint name discovery failed for group '{group}': {source}")]
    Discovery {
        group: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to open the transport session: {0}")]
    SessionOpen(#[source] TransportError),

    #[error("Transport session is not open; call retain() first")]
    SessionNotOpen,

    #[error("The open transport session does not support {0}")]
    InterfaceUnavailable(Capability),
}
