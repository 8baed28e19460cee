//! Error taxonomy for the engine.

use crate::power::PowerStep;

/// Convenience result type used across the engine.
pub type G2dResult<T> = Result<T, G2dError>;

/// Failure reported by a platform clock or reset handle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors surfaced by the engine and its settings layer.
///
/// Every rejected request leaves the engine state as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum G2dError {
    /// Crop/compose rectangle is negative or falls outside the frame.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Pitch alignment is not a power of two in the supported range.
    #[error("invalid alignment {0}: must be a power of two between 1 and 64")]
    InvalidAlignment(u32),

    /// Frame dimensions the mixer cannot address.
    #[error("invalid frame size {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    /// A plane reaches past what the address registers can express.
    #[error("address {address:#X} not reachable with {bits}-bit addressing")]
    AddressOutOfRange { address: u64, bits: u32 },

    /// A control was given a value outside its legal range.
    #[error("invalid value {value} for control {control}")]
    InvalidControlValue { control: &'static str, value: u32 },

    /// A job is already dispatched. Retry after it completes.
    #[error("a job is already running")]
    Busy,

    /// The buffer queue cannot supply what the job needs yet.
    #[error("job not ready: {0}")]
    NotReady(&'static str),

    /// Clock/reset sequencing failed. The device has been fully unwound.
    #[error("failed to activate device at step {step:?}")]
    ActivationFailure {
        step: PowerStep,
        #[source]
        source: PlatformError,
    },
}

impl G2dError {
    /// Build a [`G2dError::InvalidSelection`] value.
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn activation_failure_keeps_source() {
        let err = G2dError::ActivationFailure {
            step: PowerStep::ModuleClock,
            source: PlatformError::new("mod clock stuck"),
        };
        assert!(err.to_string().contains("ModuleClock"));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("mod clock stuck"));
    }

    #[test]
    fn alignment_message_names_value() {
        assert!(G2dError::InvalidAlignment(3).to_string().contains('3'));
    }
}
