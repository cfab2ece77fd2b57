//! Live run state shared with progress displays.

use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};

/// Lifecycle of a run.
///
/// `Idle → Crawling ⇄ Fetching → Awaiting → Crawling … → Finalizing → Done`,
/// or `Failed` when the run aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not started.
    Idle,
    /// Fetching index, section or leaf pages.
    Crawling,
    /// Dispatching document tasks for one leaf.
    Fetching,
    /// Waiting for the current leaf's tasks to finish.
    Awaiting,
    /// Closing the append document and running assemblers.
    Finalizing,
    /// Finished with a summary.
    Done,
    /// Aborted.
    Failed,
}

impl RunState {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Crawling => 1,
            Self::Fetching => 2,
            Self::Awaiting => 3,
            Self::Finalizing => 4,
            Self::Done => 5,
            Self::Failed => 6,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Crawling,
            2 => Self::Fetching,
            3 => Self::Awaiting,
            4 => Self::Finalizing,
            5 => Self::Done,
            6 => Self::Failed,
            _ => Self::Idle,
        }
    }

    /// Short label for display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Crawling => "crawling",
            Self::Fetching => "fetching",
            Self::Awaiting => "waiting",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Counters updated by the orchestrator and its tasks.
///
/// Uses atomics so spawned tasks and a progress display can read and
/// update it concurrently.
#[derive(Debug)]
pub struct RunProgress {
    state: AtomicU8,
    leaves: AtomicUsize,
    written: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    bytes: AtomicU64,
}

impl Default for RunProgress {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(RunState::Idle.to_u8()),
            leaves: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
        }
    }
}

impl RunProgress {
    /// Creates a tracker in [`RunState::Idle`] with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn set_state(&self, state: RunState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    /// Leaf-groups reached so far.
    #[must_use]
    pub fn leaves(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }

    /// Documents written so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }

    /// Documents failed so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Documents skipped by the naming policy so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Bytes written so far.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    pub(crate) fn leaf_visited(&self) {
        self.leaves.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn document_written(&self, bytes: u64) {
        self.written.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn document_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn document_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
}
