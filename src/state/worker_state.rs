/// Worker state definitions for the crawl loop
///
/// Each worker cycles `Idle → Fetching → Scoring → Extracting → Enqueuing → Idle`
/// until a stop condition is observed.
use std::fmt;

/// Represents the current phase of a crawl worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting on the frontier or checking stop conditions
    Idle,

    /// Waiting on the politeness gate or the network
    Fetching,

    /// Computing the page relevance score
    Scoring,

    /// Extracting metadata and content blocks, persisting matches
    Extracting,

    /// Pushing discovered links back onto the frontier
    Enqueuing,

    /// Loop exited; terminal
    Stopped,
}

impl WorkerState {
    /// Returns true if the worker loop has exited
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while the worker holds a dequeued entry
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Fetching | Self::Scoring | Self::Extracting | Self::Enqueuing
        )
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// - `Idle` may start a fetch, skip an entry (stay idle) or stop
    /// - `Fetching` ends in scoring, or back to idle on a failed fetch
    /// - `Scoring` goes to extraction, or straight to enqueuing below threshold
    /// - `Extracting` always ends in enqueuing
    /// - `Enqueuing` always returns to idle
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Idle, Idle)
                | (Idle, Fetching)
                | (Idle, Stopped)
                | (Fetching, Scoring)
                | (Fetching, Idle)
                | (Scoring, Extracting)
                | (Scoring, Enqueuing)
                | (Extracting, Enqueuing)
                | (Enqueuing, Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Scoring => "scoring",
            Self::Extracting => "extracting",
            Self::Enqueuing => "enqueuing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
