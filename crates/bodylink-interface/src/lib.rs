//! Robot hardware interface lifetime management.
//!
//! A block-diagram host instantiates many independent blocks that all talk to
//! the same robot. This crate guarantees that one configuration maps to one
//! [`RobotInterface`](interface::RobotInterface) no matter how many blocks
//! register it, and that the transport session inside it opens on the first
//! `retain()` and closes on the last `release()` regardless of the order the
//! blocks initialize and terminate in.
//!
//! The rigid-body model library and the hardware transport layer are external
//! collaborators, reached through the [`backend`] traits; `bodylink-test-utils`
//! provides mock implementations for testing.

pub mod backend;
pub mod capabilities;
pub mod error;
pub mod interface;
pub mod registry;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::backend::{ModelBackend, ModelHandle, TransportBackend, TransportSession};
    pub use crate::capabilities::{Capability, ControlModeKind, PidGains};
    pub use crate::error::InterfaceError;
    pub use crate::interface::RobotInterface;
    pub use crate::registry::InterfaceRegistry;
}
