//! Simulated G2D platform.
//!
//! A register level model of the mixer block plus the clocks, reset line and
//! buffer queue around it. The model decodes the control registers the way
//! the silicon does and executes jobs against a simulated DRAM window, so the
//! engine can be driven end to end without hardware.

pub mod g2d;
pub mod platform;
pub mod queue;

// Re-export types for convenience
pub use g2d::{SimDram, SimG2d};
pub use platform::{EventLog, PlatformEvent, SimClock, SimPlatform, SimReset};
pub use queue::{DoneBuffer, SimQueue};

/// Engine driving the simulated block
pub type SimEngine = crate::engine::G2d<SimG2d, SimClock, SimReset>;
