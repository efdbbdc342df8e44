//! Near/far side assignment against a vertical midline.

use tracing::debug;

use crate::tracking::{Hand, HandLandmark};

/// Side of the midline a hand occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Near,
    Far,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Far => "far",
        }
    }
}

/// Mapping from screen half to [`Side`], fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideConvention {
    /// `x < midline` is `Near`.
    #[default]
    NearLeft,
    /// `x < midline` is `Far`.
    NearRight,
}

impl SideConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearLeft => "near-left",
            Self::NearRight => "near-right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "near-left" => Some(Self::NearLeft),
            "near-right" => Some(Self::NearRight),
            _ => None,
        }
    }
}

/// Side of a single hand, judged by its middle fingertip.
pub fn side_of(hand: &Hand, midline: f32, convention: SideConvention) -> Side {
    let left_half = hand.landmark(HandLandmark::MiddleTip).x < midline;
    match (convention, left_half) {
        (SideConvention::NearLeft, true) | (SideConvention::NearRight, false) => Side::Near,
        _ => Side::Far,
    }
}

/// Hands kept for one tick, at most one per side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Assignment<'a> {
    pub near: Option<&'a Hand>,
    pub far: Option<&'a Hand>,
    /// Hands discarded because their side was already taken.
    pub dropped: usize,
}

impl<'a> Assignment<'a> {
    /// Kept hands with their sides, near first.
    pub fn sides(&self) -> impl Iterator<Item = (Side, &'a Hand)> {
        self.near
            .map(|h| (Side::Near, h))
            .into_iter()
            .chain(self.far.map(|h| (Side::Far, h)))
    }
}

/// Assign each hand a side.  When two hands share a side, the first in
/// tracker order is kept and the rest are dropped for this tick.
pub fn assign(hands: &[Hand], midline: f32, convention: SideConvention) -> Assignment<'_> {
    let mut out = Assignment::default();
    for (i, hand) in hands.iter().enumerate() {
        let side = side_of(hand, midline, convention);
        let slot = match side {
            Side::Near => &mut out.near,
            Side::Far => &mut out.far,
        };
        if slot.is_some() {
            debug!(
                hand = i,
                side = side.as_str(),
                handedness = hand.handedness().map_or("unknown", |h| h.as_str()),
                "side already taken, dropping hand"
            );
            out.dropped += 1;
        } else {
            *slot = Some(hand);
        }
    }
    out
}
