pub mod args;
pub mod context;
pub mod engine;
pub mod error;
pub mod format;
pub mod frame;
pub mod job;
pub mod layout;
pub mod power;
pub mod program;
pub mod regs;
pub mod settings;
pub mod sim;

// Re-export commonly used types
pub use args::Args;
pub use context::{BufferQueue, Context, Endpoint, SelectionTarget};
pub use engine::{EngineConfig, G2d};
pub use error::{G2dError, G2dResult, PlatformError};
pub use format::{FourCc, PixelFormat};
pub use frame::{AlphaBlendMode, FrameDescriptor, PlaneAddressSet, Rect, Selection};
pub use job::{Completion, CompletionStatus, InterruptOutcome, Job, JobId, JobState, Operation};
pub use power::{Clock, PowerController, PowerResources, PowerState, PowerStep, ResetLine};
pub use regs::RegisterFile;
pub use settings::{Control, Settings};
