//! Core error types

use thiserror::Error;

/// Errors raised by the negotiation engine.
///
/// A misbehaving compositor must never crash the client: everything here is
/// recoverable except `CompositorIncompatible`, which is only returned from
/// session construction.
#[derive(Error, Debug, Clone)]
pub enum DecorError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("invalid content limits: min {min:?} exceeds max {max:?}")]
    InvalidLimits { min: (i32, i32), max: (i32, i32) },

    #[error("popup {popup} outlived its parent {parent}")]
    DanglingPopupParent { popup: u32, parent: u32 },

    #[error("buffer allocation failed: {0}")]
    ResourceExhaustion(String),

    #[error("compositor is missing a required capability: {0}")]
    CompositorIncompatible(String),

    #[error("frame {frame} still has {live_popups} live popups")]
    FrameBusy { frame: u32, live_popups: usize },

    #[error("unknown frame id: {0}")]
    UnknownFrame(u32),

    #[error("unknown popup id: {0}")]
    UnknownPopup(u32),

    #[error("unknown buffer id: {0}")]
    UnknownBuffer(u32),
}

impl DecorError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, DecorError>;
