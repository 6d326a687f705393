//! Deterministic single-threaded event loop.
//!
//! Models the two suspension points the transition depends on: the
//! animation-frame boundary (a style commit deferred past the next
//! paint-eligible point) and fixed-duration timers (teardown after the
//! transition ends). Time is virtual; the host advances it explicitly, so a
//! whole open/close interaction replays identically in tests.
//!
//! Work is queued as typed [`EngineTask`] values rather than closures. Tasks
//! scheduled while a frame is draining land in the *next* frame, matching
//! `requestAnimationFrame` semantics.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// Deferred unit of engine work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTask {
    /// Commit the open transition's end styles (clone to target rect,
    /// backdrop to opaque). Runs on the animation frame after insertion.
    CommitOpen,
    /// Fade the frame to its faint placeholder opacity and register the
    /// close triggers. Runs a short fixed delay after the open commit.
    ArmClose,
    /// Detach the overlays and restore the source image. Runs a full
    /// transition duration after the close commit.
    FinishClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerEntry {
    deadline_ms: u64,
    seq: u64,
    task: EngineTask,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.deadline_ms, self.seq).cmp(&(other.deadline_ms, other.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Task queues plus the virtual clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    frame_queue: VecDeque<EngineTask>,
    timers: BinaryHeap<Reverse<TimerEntry>>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Queue a task for the next animation frame.
    pub fn request_frame(&mut self, task: EngineTask) {
        self.frame_queue.push_back(task);
    }

    /// Queue a task to fire once `delay_ms` of virtual time has elapsed.
    pub fn set_timeout(&mut self, task: EngineTask, delay_ms: u64) {
        let entry = TimerEntry {
            deadline_ms: self.now_ms + delay_ms,
            seq: self.seq,
            task,
        };
        self.seq += 1;
        self.timers.push(Reverse(entry));
    }

    /// Take the batch of frame tasks scheduled before this frame started.
    /// Tasks requested while the batch runs belong to the next frame.
    pub fn take_frame_batch(&mut self) -> Vec<EngineTask> {
        self.frame_queue.drain(..).collect()
    }

    /// Deadline of the nearest pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.peek().map(|Reverse(e)| e.deadline_ms)
    }

    /// Pop the next timer due at or before `limit_ms`, advancing the clock
    /// to its deadline. Timers with equal deadlines fire in FIFO order.
    pub fn pop_due(&mut self, limit_ms: u64) -> Option<EngineTask> {
        let due = matches!(self.timers.peek(), Some(Reverse(e)) if e.deadline_ms <= limit_ms);
        if !due {
            return None;
        }
        let Reverse(entry) = self.timers.pop()?;
        self.now_ms = self.now_ms.max(entry.deadline_ms);
        Some(entry.task)
    }

    /// Move the clock forward to `target_ms` once all due timers have fired.
    pub fn settle_at(&mut self, target_ms: u64) {
        self.now_ms = self.now_ms.max(target_ms);
    }

    pub fn has_frame_work(&self) -> bool {
        !self.frame_queue.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.frame_queue.is_empty() || !self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_batch_excludes_tasks_scheduled_mid_frame() {
        let mut s = Scheduler::new();
        s.request_frame(EngineTask::CommitOpen);
        let batch = s.take_frame_batch();
        assert_eq!(batch, vec![EngineTask::CommitOpen]);

        // A task requested "during" that frame waits for the next batch.
        s.request_frame(EngineTask::ArmClose);
        assert_eq!(s.take_frame_batch(), vec![EngineTask::ArmClose]);
        assert!(s.take_frame_batch().is_empty());
    }

    #[test]
    fn timers_fire_in_deadline_then_fifo_order() {
        let mut s = Scheduler::new();
        s.set_timeout(EngineTask::FinishClose, 350);
        s.set_timeout(EngineTask::ArmClose, 10);
        s.set_timeout(EngineTask::CommitOpen, 10);

        assert_eq!(s.pop_due(1000), Some(EngineTask::ArmClose));
        assert_eq!(s.now(), 10);
        assert_eq!(s.pop_due(1000), Some(EngineTask::CommitOpen));
        assert_eq!(s.pop_due(1000), Some(EngineTask::FinishClose));
        assert_eq!(s.now(), 350);
        assert_eq!(s.pop_due(1000), None);
    }

    #[test]
    fn pop_due_respects_the_limit() {
        let mut s = Scheduler::new();
        s.set_timeout(EngineTask::FinishClose, 350);
        assert_eq!(s.pop_due(349), None);
        s.settle_at(349);
        assert_eq!(s.now(), 349);
        assert_eq!(s.pop_due(350), Some(EngineTask::FinishClose));
        assert_eq!(s.now(), 350);
    }

    #[test]
    fn deadlines_stack_relative_to_the_current_clock() {
        let mut s = Scheduler::new();
        s.set_timeout(EngineTask::ArmClose, 10);
        assert_eq!(s.pop_due(10), Some(EngineTask::ArmClose));
        s.set_timeout(EngineTask::FinishClose, 350);
        assert_eq!(s.next_deadline(), Some(360));
    }
}
