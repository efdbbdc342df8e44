//! Gesture debounce state machine.
//!
//! Turns one [`Observation`] per tick into at most three commands, always in
//! the order confirm, rotate, debounced move.
//!
//! # State Machine
//!
//! - **Confirm detector** (edge-triggered): two thumbs up fires once on
//!   entry; any tick with fewer than two re-arms it.
//! - **Rotate latch** (edge-triggered): double fist fires once per
//!   continuous hold; any tick without it re-arms the latch.
//! - **Debounced move**: `Idle → Pending(candidate, since) → Confirmed`.
//!   A candidate must persist for its hold time before it is confirmed.
//!   While confirmed, its command re-fires no faster than the candidate's
//!   repeat interval.  A `None` candidate drops back to `Idle`; a different
//!   candidate restarts `Pending`.
//!
//! # Invariants
//!
//! 1. Confirmation happens on the first tick with `now - since >= hold`.
//! 2. Two emissions of the same candidate are at least its repeat interval
//!    apart, whatever the tick rate.
//! 3. Exactly one rotate per continuous double-fist interval.
//! 4. Exactly one confirm per continuous two-thumbs-up interval.

use std::time::Duration;

use tracing::debug;

use super::observation::Observation;
use super::pose::Pose;
use crate::command::Command;
use crate::tracking::Timestamp;

// ── Candidates ─────────────────────────────────────────────

/// Instantaneous intent derived from one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureCandidate {
    Left,
    Right,
    Up,
    Down,
    None,
}

impl GestureCandidate {
    /// Candidates that can be confirmed.
    pub const MOVES: [GestureCandidate; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::MOVES.into_iter().find(|c| c.as_str() == s)
    }
}

/// One value per movable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerCandidate<T> {
    pub left: T,
    pub right: T,
    pub up: T,
    pub down: T,
}

impl<T> PerCandidate<T> {
    /// Entry for `candidate`; `None` has no entry.
    pub fn get(&self, candidate: GestureCandidate) -> Option<&T> {
        match candidate {
            GestureCandidate::Left => Some(&self.left),
            GestureCandidate::Right => Some(&self.right),
            GestureCandidate::Up => Some(&self.up),
            GestureCandidate::Down => Some(&self.down),
            GestureCandidate::None => None,
        }
    }

    pub fn get_mut(&mut self, candidate: GestureCandidate) -> Option<&mut T> {
        match candidate {
            GestureCandidate::Left => Some(&mut self.left),
            GestureCandidate::Right => Some(&mut self.right),
            GestureCandidate::Up => Some(&mut self.up),
            GestureCandidate::Down => Some(&mut self.down),
            GestureCandidate::None => None,
        }
    }
}

/// Which two-handed symmetric poses map to vertical candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalMapping {
    /// No vertical candidates.
    #[default]
    None,
    /// Both hands open → `Up`.
    OpenUp,
    /// Both fists → `Down`.
    FistDown,
    /// Both of the above.
    Both,
}

impl VerticalMapping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenUp => "open-up",
            Self::FistDown => "fist-down",
            Self::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" | "nil" => Some(Self::None),
            "open-up" => Some(Self::OpenUp),
            "fist-down" => Some(Self::FistDown),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    fn open_up(self) -> bool {
        matches!(self, Self::OpenUp | Self::Both)
    }

    fn fist_down(self) -> bool {
        matches!(self, Self::FistDown | Self::Both)
    }
}

/// Map an observation to a candidate.
pub fn derive_candidate(obs: &Observation, vertical: VerticalMapping) -> GestureCandidate {
    match (obs.near, obs.far) {
        (Some(Pose::Fist), Some(Pose::Open)) => GestureCandidate::Left,
        (Some(Pose::Open), Some(Pose::Fist)) => GestureCandidate::Right,
        (Some(Pose::Open), Some(Pose::Open)) if vertical.open_up() => GestureCandidate::Up,
        (Some(Pose::Fist), Some(Pose::Fist)) if vertical.fist_down() => GestureCandidate::Down,
        _ => GestureCandidate::None,
    }
}

// ── Config ─────────────────────────────────────────────────

/// Timing and binding configuration for the debounce machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceConfig {
    /// Continuous presence required before a candidate is confirmed.
    pub hold_time: PerCandidate<Duration>,
    /// Minimum spacing between emissions of the same confirmed candidate.
    pub repeat_interval: PerCandidate<Duration>,
    /// Command each confirmed candidate emits.  Unbound candidates still
    /// debounce but emit nothing.
    pub bindings: PerCandidate<Option<Command>>,
    /// Symmetric two-hand poses that count as vertical candidates.
    pub vertical: VerticalMapping,
    /// Emitted by the two-thumbs-up detector.
    pub confirm_command: Command,
    /// Emitted by the double-fist latch.
    pub rotate_command: Command,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            hold_time: PerCandidate {
                left: Duration::from_millis(200),
                right: Duration::from_millis(200),
                up: Duration::from_millis(300),
                down: Duration::from_millis(300),
            },
            repeat_interval: PerCandidate {
                left: Duration::from_millis(250),
                right: Duration::from_millis(250),
                up: Duration::from_millis(400),
                down: Duration::from_millis(400),
            },
            bindings: PerCandidate {
                left: Some(Command::MoveLeft),
                right: Some(Command::MoveRight),
                up: Some(Command::Rotate),
                down: Some(Command::Drop),
            },
            vertical: VerticalMapping::None,
            confirm_command: Command::Confirm,
            rotate_command: Command::Rotate,
        }
    }
}

impl DebounceConfig {
    fn hold(&self, candidate: GestureCandidate) -> Duration {
        self.hold_time.get(candidate).copied().unwrap_or(Duration::ZERO)
    }

    fn repeat(&self, candidate: GestureCandidate) -> Duration {
        self.repeat_interval.get(candidate).copied().unwrap_or(Duration::ZERO)
    }
}

// ── State ──────────────────────────────────────────────────

/// Debounce phase of the move path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Candidate seen continuously since `since`, hold not yet satisfied.
    Pending {
        candidate: GestureCandidate,
        since: Timestamp,
    },
    /// Candidate held long enough to count as intentional.
    Confirmed {
        candidate: GestureCandidate,
        since: Timestamp,
    },
}

/// Everything that persists across ticks.  Owned by the session loop and
/// passed into every [`GestureMachine::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub phase: Phase,
    /// Last emission time per candidate.
    pub last_emit: PerCandidate<Option<Timestamp>>,
    pub rotate_latch_armed: bool,
    pub confirm_armed: bool,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            last_emit: PerCandidate::default(),
            rotate_latch_armed: true,
            confirm_armed: true,
        }
    }
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirmed candidate, or `GestureCandidate::None`.
    pub fn confirmed_gesture(&self) -> GestureCandidate {
        match self.phase {
            Phase::Confirmed { candidate, .. } => candidate,
            _ => GestureCandidate::None,
        }
    }

    /// When the current candidate was first seen in its current run.
    pub fn candidate_since(&self) -> Option<Timestamp> {
        match self.phase {
            Phase::Idle => None,
            Phase::Pending { since, .. } | Phase::Confirmed { since, .. } => Some(since),
        }
    }

    /// Back to the session-start state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// S-expression for diagnostics.
    pub fn status_sexp(&self) -> String {
        let phase = match self.phase {
            Phase::Idle => "(:phase :idle)".to_string(),
            Phase::Pending { candidate, since } => format!(
                "(:phase :pending :candidate :{} :since-ms {})",
                candidate.as_str(),
                since.as_millis()
            ),
            Phase::Confirmed { candidate, since } => format!(
                "(:phase :confirmed :candidate :{} :since-ms {})",
                candidate.as_str(),
                since.as_millis()
            ),
        };
        format!(
            "(:state {} :rotate-armed {} :confirm-armed {})",
            phase,
            if self.rotate_latch_armed { "t" } else { "nil" },
            if self.confirm_armed { "t" } else { "nil" },
        )
    }
}

// ── Machine ────────────────────────────────────────────────

/// The debounce rules.  Stateless itself; all timers live in
/// [`MachineState`].
#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    config: DebounceConfig,
}

impl GestureMachine {
    pub fn new(config: DebounceConfig) -> Self {
        Self { config }
    }

    /// Process one tick.  Returns commands in emission order.
    pub fn step(&self, state: &mut MachineState, obs: &Observation, now: Timestamp) -> Vec<Command> {
        let mut out = Vec::with_capacity(3);

        // Immediate detectors
        if obs.thumbs_up_count >= 2 {
            if state.confirm_armed {
                state.confirm_armed = false;
                debug!("two thumbs up, confirm");
                out.push(self.config.confirm_command);
            }
        } else {
            state.confirm_armed = true;
        }

        if obs.both(Pose::Fist) {
            if state.rotate_latch_armed {
                state.rotate_latch_armed = false;
                debug!("double fist, rotate");
                out.push(self.config.rotate_command);
            }
        } else {
            state.rotate_latch_armed = true;
        }

        // Debounced path
        let candidate = derive_candidate(obs, self.config.vertical);
        self.advance(state, candidate, now);

        if let Phase::Confirmed { candidate, .. } = state.phase {
            if let Some(command) = self.throttle(state, candidate, now) {
                out.push(command);
            }
        }

        out
    }

    /// Phase transition for this tick's candidate.
    fn advance(&self, state: &mut MachineState, candidate: GestureCandidate, now: Timestamp) {
        let next = match (state.phase, candidate) {
            (_, GestureCandidate::None) => Phase::Idle,
            (Phase::Pending { candidate: c, since }, new) if c == new => Phase::Pending { candidate: c, since },
            (confirmed @ Phase::Confirmed { candidate: c, .. }, new) if c == new => confirmed,
            (_, new) => Phase::Pending {
                candidate: new,
                since: now,
            },
        };

        if let Phase::Pending { candidate, since } = next {
            if now.saturating_sub(since) >= self.config.hold(candidate) {
                debug!(
                    candidate = candidate.as_str(),
                    held_ms = now.saturating_sub(since).as_millis() as u64,
                    "gesture confirmed"
                );
                state.phase = Phase::Confirmed { candidate, since };
                return;
            }
        }

        if next != state.phase {
            debug!(from = ?state.phase, to = ?next, "debounce transition");
        }
        state.phase = next;
    }

    /// Bound command for a confirmed candidate if its repeat interval allows.
    fn throttle(
        &self,
        state: &mut MachineState,
        candidate: GestureCandidate,
        now: Timestamp,
    ) -> Option<Command> {
        let command = (*self.config.bindings.get(candidate)?)?;
        let last = state.last_emit.get_mut(candidate)?;
        let due = match *last {
            Some(t) => now.saturating_sub(t) >= self.config.repeat(candidate),
            None => true,
        };
        if !due {
            return None;
        }
        *last = Some(now);
        Some(command)
    }

    /// S-expression of the effective timing configuration.
    pub fn config_sexp(&self) -> String {
        let ms = |t: &PerCandidate<Duration>| {
            format!(
                "(:left {} :right {} :up {} :down {})",
                t.left.as_millis(),
                t.right.as_millis(),
                t.up.as_millis(),
                t.down.as_millis()
            )
        };
        let bind = |c: Option<Command>| c.map(|c| format!(":{}", c.as_str())).unwrap_or_else(|| "nil".into());
        let b = &self.config.bindings;
        format!(
            "(:hold-ms {} :repeat-ms {} :bindings (:left {} :right {} :up {} :down {}) :vertical :{} :confirm :{} :rotate :{})",
            ms(&self.config.hold_time),
            ms(&self.config.repeat_interval),
            bind(b.left),
            bind(b.right),
            bind(b.up),
            bind(b.down),
            self.config.vertical.as_str(),
            self.config.confirm_command.as_str(),
            self.config.rotate_command.as_str(),
        )
    }
}
