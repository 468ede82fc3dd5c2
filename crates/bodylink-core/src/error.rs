use thiserror::Error;

/// Configuration validation and loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Controlled joint '{0}' is listed more than once")]
    DuplicateControlledJoint(String),
}

/// Joint map construction errors.
///
/// Clone + PartialEq so callers can match on the failing joint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Joint '{0}' was not found in any hardware group")]
    JointNotFound(String),

    #[error("Joint '{joint}' is exposed by both hardware group '{first}' and '{second}'")]
    AmbiguousJoint {
        joint: String,
        first: String,
        second: String,
    },
}
