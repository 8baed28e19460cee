//! In-memory buffer queue.

use crate::context::BufferQueue;
use crate::frame::PlaneAddressSet;
use crate::job::{Completion, CompletionStatus, Operation};
use std::collections::VecDeque;
use tracing::debug;

/// A buffer returned to the client together with the job outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoneBuffer {
    pub addrs: PlaneAddressSet,
    pub status: CompletionStatus,
}

/// FIFO of source and destination buffers.
#[derive(Debug, Default)]
pub struct SimQueue {
    sources: VecDeque<PlaneAddressSet>,
    destinations: VecDeque<PlaneAddressSet>,
    done: Vec<DoneBuffer>,
}

impl SimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_source(&mut self, addrs: PlaneAddressSet) {
        self.sources.push_back(addrs);
    }

    pub fn queue_destination(&mut self, addrs: PlaneAddressSet) {
        self.destinations.push_back(addrs);
    }

    /// Buffers handed back so far, oldest first
    pub fn done(&self) -> &[DoneBuffer] {
        &self.done
    }
}

impl BufferQueue for SimQueue {
    fn next_source_buffer(&self) -> Option<PlaneAddressSet> {
        self.sources.front().copied()
    }

    fn next_destination_buffer(&self) -> Option<PlaneAddressSet> {
        self.destinations.front().copied()
    }

    fn complete_buffers(&mut self, completion: &Completion) {
        let status = completion.status;
        if completion.operation == Operation::Blit {
            if let Some(addrs) = self.sources.pop_front() {
                self.done.push(DoneBuffer { addrs, status });
            }
        }
        if let Some(addrs) = self.destinations.pop_front() {
            self.done.push(DoneBuffer { addrs, status });
        }
        debug!("Job {} buffers returned: {:?}", completion.id, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;

    #[test]
    fn fill_completion_leaves_sources_queued() {
        let mut queue = SimQueue::new();
        queue.queue_source(PlaneAddressSet::single(0x10));
        queue.queue_destination(PlaneAddressSet::single(0x20));

        queue.complete_buffers(&Completion {
            id: JobId(1),
            operation: Operation::Fill,
            status: CompletionStatus::Success,
        });

        assert_eq!(
            queue.done(),
            &[DoneBuffer {
                addrs: PlaneAddressSet::single(0x20),
                status: CompletionStatus::Success,
            }]
        );
        assert!(queue.is_source_ready());
        assert!(!queue.is_destination_ready());
    }
}
