//! Processing contexts.
//!
//! A context holds what one client has configured: the source and
//! destination frames and the control values. Jobs are built from a context
//! plus the buffers its queue currently holds.

use crate::error::{G2dError, G2dResult};
use crate::format::{FourCc, PixelFormat, SUPPORTED_FORMATS, find_format};
use crate::frame::{FrameDescriptor, PlaneAddressSet, Rect, Selection};
use crate::job::{Completion, Job, Operation};
use crate::settings::{Control, Settings};
use g2d_hw::specs::frame::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH,
};
use tracing::{debug, instrument};

/// Buffers handed to the engine by a client.
///
/// Buffers stay queued until [`BufferQueue::complete_buffers`] is called for
/// the job that used them.
pub trait BufferQueue {
    /// First queued source buffer, left in the queue
    fn next_source_buffer(&self) -> Option<PlaneAddressSet>;

    /// First queued destination buffer, left in the queue
    fn next_destination_buffer(&self) -> Option<PlaneAddressSet>;

    /// Dequeue the buffers used by a finished or aborted job.
    fn complete_buffers(&mut self, completion: &Completion);

    fn is_source_ready(&self) -> bool {
        self.next_source_buffer().is_some()
    }

    fn is_destination_ready(&self) -> bool {
        self.next_destination_buffer().is_some()
    }
}

/// Side of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Buffers read by the engine
    Source,
    /// Buffers written by the engine
    Destination,
}

/// Which selection rectangle to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTarget {
    Current,
    Default,
    Bounds,
}

/// Format actually applied after clamping and fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedFormat {
    pub fourcc: FourCc,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub bytes_per_line: u32,
    pub size_image: u32,
}

#[derive(Debug, Clone)]
pub struct Context {
    src: FrameDescriptor,
    dst: FrameDescriptor,
    settings: Settings,
}

impl Default for Context {
    fn default() -> Self {
        let desc = SUPPORTED_FORMATS[0];
        let src = FrameDescriptor::new(desc.fourcc, desc.format, DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let mut dst = src;
        // Centred quarter of the default frame
        dst.selection = Selection::new(200, 120, 400, 240);

        Self {
            src,
            dst,
            settings: Settings::default(),
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self, endpoint: Endpoint) -> &FrameDescriptor {
        match endpoint {
            Endpoint::Source => &self.src,
            Endpoint::Destination => &self.dst,
        }
    }

    fn frame_mut(&mut self, endpoint: Endpoint) -> &mut FrameDescriptor {
        match endpoint {
            Endpoint::Source => &mut self.src,
            Endpoint::Destination => &mut self.dst,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Adjust a format request to something the engine supports.
    ///
    /// Unknown fourccs fall back to the first supported format and the size
    /// is clamped to the hardware limits.
    pub fn try_format(fourcc: FourCc, width: u32, height: u32) -> AppliedFormat {
        let desc = find_format(fourcc).copied().unwrap_or(SUPPORTED_FORMATS[0]);
        let width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        let height = height.clamp(MIN_HEIGHT, MAX_HEIGHT);
        let bytes_per_line = (width * desc.depth) >> 3;

        AppliedFormat {
            fourcc: desc.fourcc,
            format: desc.format,
            width,
            height,
            bytes_per_line,
            size_image: height * bytes_per_line,
        }
    }

    /// Apply a format to one side. The selection is kept as it is.
    #[instrument(level = "debug", skip(self))]
    pub fn set_format(
        &mut self,
        endpoint: Endpoint,
        fourcc: FourCc,
        width: u32,
        height: u32,
        premultiplied: bool,
    ) -> AppliedFormat {
        let applied = Self::try_format(fourcc, width, height);
        let frame = self.frame_mut(endpoint);
        frame.fourcc = applied.fourcc;
        frame.format = applied.format;
        frame.full_width = applied.width;
        frame.full_height = applied.height;
        frame.premultiplied = premultiplied;
        debug!(
            "{:?} format {} {}x{}",
            endpoint, applied.fourcc, applied.width, applied.height
        );
        applied
    }

    pub fn selection(&self, endpoint: Endpoint, target: SelectionTarget) -> Selection {
        let frame = self.frame(endpoint);
        match target {
            SelectionTarget::Current => frame.selection,
            SelectionTarget::Default | SelectionTarget::Bounds => frame.bounds(),
        }
    }

    pub fn set_selection(&mut self, endpoint: Endpoint, rect: Rect) -> G2dResult<()> {
        self.frame_mut(endpoint).set_selection(rect)?;
        debug!("{:?} selection {}", endpoint, self.frame(endpoint).selection);
        Ok(())
    }

    /// Validate and apply a control value.
    pub fn set_control(&mut self, control: Control, value: u32) -> G2dResult<()> {
        self.settings.set(control, value)?;
        self.src.alpha_mode = self.settings.input_alpha_mode;
        self.src.alignment = self.settings.input_alignment;
        self.dst.alpha_mode = self.settings.output_alpha_mode;
        self.dst.alignment = self.settings.output_alignment;
        Ok(())
    }

    /// Whether `queue` holds the buffers the selected operation needs.
    pub fn job_ready<Q: BufferQueue + ?Sized>(&self, queue: &Q) -> bool {
        match self.settings.operation {
            // A fill writes in place and needs no source
            Operation::Fill => queue.is_destination_ready(),
            Operation::Blit => queue.is_source_ready() && queue.is_destination_ready(),
        }
    }

    /// Build the job for the selected operation from the queued buffers.
    pub fn build_job<Q: BufferQueue + ?Sized>(&self, queue: &Q) -> G2dResult<Job> {
        let dst_addrs = queue
            .next_destination_buffer()
            .ok_or(G2dError::NotReady("no destination buffer queued"))?;

        match self.settings.operation {
            Operation::Fill => Ok(Job::Fill {
                dst: self.dst,
                dst_addrs,
                color: self.settings.fill_color,
                alpha: self.settings.fill_alpha,
            }),
            Operation::Blit => {
                let src_addrs = queue
                    .next_source_buffer()
                    .ok_or(G2dError::NotReady("no source buffer queued"))?;
                Ok(Job::Blit {
                    src: self.src,
                    src_addrs,
                    dst: self.dst,
                    dst_addrs,
                })
            }
        }
    }
}
