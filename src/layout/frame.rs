//! Animation-frame continuations.
//!
//! The host calls [`FrameScheduler::tick`] once per animation frame; tasks
//! scheduled with a delay of `n` frames come back from the `n`-th tick.
//! A task already queued is not queued again; the earlier deadline wins.

/// Work deferred to a later animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTask {
    /// Run a layout recompute.
    Recompute,
    /// End the in-flight zoom and recompute.
    SettleZoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    task: FrameTask,
    frames_remaining: u32,
}

/// Queue of frame tasks.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    queue: Vec<Scheduled>,
}

impl FrameScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run after `frames` ticks (0 and 1 both mean the
    /// next tick). Returns `false` if the task was already queued.
    pub fn schedule(&mut self, task: FrameTask, frames: u32) -> bool {
        let frames = frames.max(1);
        if let Some(existing) = self.queue.iter_mut().find(|s| s.task == task) {
            existing.frames_remaining = existing.frames_remaining.min(frames);
            return false;
        }
        self.queue.push(Scheduled {
            task,
            frames_remaining: frames,
        });
        true
    }

    /// Advance one frame and return the tasks now due, in scheduling order.
    pub fn tick(&mut self) -> Vec<FrameTask> {
        let mut due = Vec::new();
        self.queue.retain_mut(|s| {
            s.frames_remaining -= 1;
            if s.frames_remaining == 0 {
                due.push(s.task);
                false
            } else {
                true
            }
        });
        due
    }

    /// Remove `task` if queued. Returns whether it was.
    pub fn cancel(&mut self, task: FrameTask) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.task != task);
        self.queue.len() != before
    }

    /// Whether `task` is waiting.
    pub fn is_scheduled(&self, task: FrameTask) -> bool {
        self.queue.iter().any(|s| s.task == task)
    }

    /// Number of waiting tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every waiting task.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
