//! Error types for the zoom-modal engine

use thiserror::Error;

use crate::session::SessionState;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the zoom-modal engine
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// An element id did not resolve to a live document node
    #[error("Unknown element: {0}")]
    UnknownElement(crate::dom::ElementId),

    /// A session transition the state machine does not allow
    #[error("Illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: SessionState,
        to: SessionState,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
