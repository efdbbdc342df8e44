//! Hand landmark data structures.
//!
//! Models the 21 landmarks per hand reported by MediaPipe-style trackers.
//! A [`Hand`] is only ever built from a complete landmark set; everything
//! downstream may index it without bounds checks.

use tracing::debug;

use crate::error::TrackingError;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in tracker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// (tip, mcp) pairs of the four non-thumb fingers.
    pub fn finger_tip_mcp_pairs() -> [(HandLandmark, HandLandmark); 4] {
        [
            (Self::IndexTip, Self::IndexMcp),
            (Self::MiddleTip, Self::MiddleMcp),
            (Self::RingTip, Self::RingMcp),
            (Self::PinkyTip, Self::PinkyMcp),
        ]
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Raw handedness hint as reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Landmark ───────────────────────────────────────────────

/// Position of one landmark. `y` grows downward; `z` is 0 for 2-D trackers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ── Raw and validated hands ────────────────────────────────

/// One hand as reported by the tracker, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawHand {
    pub landmarks: Vec<Landmark>,
    pub handedness: Option<Handedness>,
}

/// A complete, validated hand for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    landmarks: [Landmark; LANDMARK_COUNT],
    handedness: Option<Handedness>,
}

impl Hand {
    /// Build a hand from a landmark list in tracker order.
    ///
    /// Fails with [`TrackingError::MalformedInput`] unless exactly
    /// [`LANDMARK_COUNT`] landmarks are given, and with
    /// [`TrackingError::NonFiniteLandmark`] on a NaN or infinite coordinate.
    pub fn new(
        landmarks: &[Landmark],
        handedness: Option<Handedness>,
    ) -> Result<Self, TrackingError> {
        let landmarks: [Landmark; LANDMARK_COUNT] = landmarks.try_into().map_err(|_| {
            debug!(
                "Hand tracking: expected {} landmarks, got {}",
                LANDMARK_COUNT,
                landmarks.len(),
            );
            TrackingError::MalformedInput {
                expected: LANDMARK_COUNT,
                got: landmarks.len(),
            }
        })?;
        if let Some(index) = landmarks.iter().position(|p| !p.is_finite()) {
            debug!("Hand tracking: landmark {} is not finite", index);
            return Err(TrackingError::NonFiniteLandmark { index });
        }
        Ok(Self {
            landmarks,
            handedness,
        })
    }

    /// Landmark at the given anatomical index.
    pub fn landmark(&self, which: HandLandmark) -> Landmark {
        self.landmarks[which.index()]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    pub fn handedness(&self) -> Option<Handedness> {
        self.handedness
    }
}

impl TryFrom<&RawHand> for Hand {
    type Error = TrackingError;

    fn try_from(raw: &RawHand) -> Result<Self, Self::Error> {
        Hand::new(&raw.landmarks, raw.handedness)
    }
}
