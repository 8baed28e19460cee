//! Jobs and their completion events.

use crate::frame::{FrameDescriptor, PlaneAddressSet};
use std::fmt;

/// Operation selected for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Operation {
    /// Solid color fill of the destination selection
    #[default]
    Fill = 0,
    /// Copy of the source selection into the destination selection
    Blit = 1,
}

impl Operation {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Fill),
            1 => Some(Self::Blit),
            _ => None,
        }
    }
}

/// Identity of a dispatched job, unique per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One unit of work for the mixer. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Fill {
        dst: FrameDescriptor,
        dst_addrs: PlaneAddressSet,
        /// ARGB fill color
        color: u32,
        /// Global alpha of the fill layer
        alpha: u8,
    },
    Blit {
        src: FrameDescriptor,
        src_addrs: PlaneAddressSet,
        dst: FrameDescriptor,
        dst_addrs: PlaneAddressSet,
    },
}

impl Job {
    pub fn operation(&self) -> Operation {
        match self {
            Job::Fill { .. } => Operation::Fill,
            Job::Blit { .. } => Operation::Blit,
        }
    }

    pub fn destination(&self) -> &FrameDescriptor {
        match self {
            Job::Fill { dst, .. } | Job::Blit { dst, .. } => dst,
        }
    }
}

/// How a job left the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// The hardware signalled completion
    Success,
    /// The job was dropped by a forced reset
    Aborted,
}

/// Completion event for a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub id: JobId,
    pub operation: Operation,
    pub status: CompletionStatus,
}

/// Result of servicing the completion interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// The running job finished and the engine is idle again
    Completed(Completion),
    /// Nothing was pending. The interrupt was not ours.
    Spurious,
}

/// Observable state of the job state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Dispatched(JobId),
}
