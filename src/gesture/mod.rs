//! Gesture layer: pose classification, side assignment, aggregation and
//! debouncing, wired into one per-tick pipeline.

pub mod assign;
pub mod debounce;
pub mod observation;
pub mod pose;

pub use assign::{Side, SideConvention};
pub use debounce::{
    DebounceConfig, GestureCandidate, GestureMachine, MachineState, PerCandidate, Phase,
    VerticalMapping,
};
pub use observation::Observation;
pub use pose::{Pose, ThumbConvention};

use crate::command::Command;
use crate::error::TrackingError;
use crate::tracking::{Hand, RawHand, Timestamp};

/// Geometry settings for classification and side assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    pub thumb: ThumbConvention,
    pub sides: SideConvention,
    /// Vertical midline in landmark coordinates (0.5 for normalized input,
    /// half the frame width for pixel input).
    pub midline: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thumb: ThumbConvention::Mirrored,
            sides: SideConvention::NearLeft,
            midline: 0.5,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub observation: Observation,
    /// Commands in emission order (confirm, rotate, move).
    pub commands: Vec<Command>,
    /// Hands dropped because their side was already occupied.
    pub dropped_hands: usize,
}

/// Classifier → assignment → aggregator → debounce, one tick at a time.
#[derive(Debug, Clone, Default)]
pub struct GesturePipeline {
    classifier: ClassifierConfig,
    machine: GestureMachine,
}

impl GesturePipeline {
    pub fn new(classifier: ClassifierConfig, debounce: DebounceConfig) -> Self {
        Self {
            classifier,
            machine: GestureMachine::new(debounce),
        }
    }

    /// Build the observation for a set of validated hands.
    /// Returns it with the number of hands dropped by side assignment.
    pub fn observe(&self, hands: &[Hand]) -> (Observation, usize) {
        let assignment = assign::assign(hands, self.classifier.midline, self.classifier.sides);
        let obs = observation::aggregate(
            assignment
                .sides()
                .map(|(side, hand)| (side, pose::classify(hand, self.classifier.thumb))),
        );
        (obs, assignment.dropped)
    }

    /// Run one full tick over the tracker's raw hands.
    ///
    /// Fails fast with [`TrackingError::MalformedInput`] before touching
    /// `state` if any hand has the wrong landmark count.
    pub fn tick(
        &self,
        state: &mut MachineState,
        raw_hands: &[RawHand],
        now: Timestamp,
    ) -> Result<TickReport, TrackingError> {
        let hands = raw_hands
            .iter()
            .map(Hand::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let (observation, dropped_hands) = self.observe(&hands);
        let commands = self.machine.step(state, &observation, now);
        Ok(TickReport {
            observation,
            commands,
            dropped_hands,
        })
    }
}
