use scout_model::{Phase, ProgressEvent, Termination};

/// Snapshot produced for every event fed through a [`PhaseMachine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseUpdate {
    pub phase: Phase,
    pub termination: Option<Termination>,
    pub progress: u32,
    pub total: u32,
    pub discovered: u32,
    /// A counter went backwards. Surfaced for display, never rejected.
    pub counters_regressed: bool,
    /// The machine had already seen a terminal phase before this event.
    pub after_terminal: bool,
}

/// Classifies the phase stream of one job.
///
/// Ordering between non-terminal phases is not enforced; the machine only
/// decides terminality and keeps the latest phase and counters around.
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    current: Option<Phase>,
    progress: u32,
    total: u32,
    discovered: u32,
    events_seen: usize,
    terminal: Option<Termination>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure classification; `None` for non-terminal phases.
    pub fn classify(phase: Phase) -> Option<Termination> {
        phase.termination()
    }

    pub fn apply(&mut self, event: &ProgressEvent) -> PhaseUpdate {
        let after_terminal = self.terminal.is_some();
        let same_tick = self.current == Some(event.phase)
            && event.phase.is_progress_tick();
        let counters_regressed = (same_tick
            && (event.progress < self.progress || event.total < self.total))
            || event.discovered < self.discovered;

        let termination = Self::classify(event.phase);
        if self.terminal.is_none() {
            self.terminal = termination;
        }

        self.current = Some(event.phase);
        self.progress = event.progress;
        self.total = event.total;
        self.discovered = self.discovered.max(event.discovered);
        self.events_seen += 1;

        PhaseUpdate {
            phase: event.phase,
            termination,
            progress: event.progress,
            total: event.total,
            discovered: event.discovered,
            counters_regressed,
            after_terminal,
        }
    }

    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    /// First terminal classification seen, if any.
    pub fn terminal(&self) -> Option<Termination> {
        self.terminal
    }

    pub fn events_seen(&self) -> usize {
        self.events_seen
    }

    /// Highest discovered count reported so far.
    pub fn discovered(&self) -> u32 {
        self.discovered
    }
}
