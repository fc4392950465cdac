use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic tag identifying one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunGeneration(pub u64);

impl fmt::Display for RunGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared source of run generations.
///
/// Clones share the same counter, so a run thread and the thread owning the
/// chart agree on which generation is newest. Generation 0 means "no run
/// started yet".
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every earlier one.
    pub fn advance(&self) -> RunGeneration {
        RunGeneration(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> RunGeneration {
        RunGeneration(self.0.load(Ordering::SeqCst))
    }

    /// True only for the most recently started generation.
    pub fn is_current(&self, generation: RunGeneration) -> bool {
        generation == self.latest()
    }
}
