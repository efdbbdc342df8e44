//! Per-hand pose classification from landmark geometry.
//!
//! Pure and total: every [`Hand`] maps to exactly one [`Pose`].  Tracker
//! coordinates grow downward, so "higher in frame" means smaller `y`.

use crate::tracking::{Hand, HandLandmark};

/// Semantic pose of one hand in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pose {
    /// All four fingers extended, thumb open.
    Open,
    /// All four fingers curled, thumb tucked.
    Fist,
    /// All four fingers curled, thumb pointing up.
    ThumbUp,
    /// Anything else.
    Neutral,
}

impl Pose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fist => "fist",
            Self::ThumbUp => "thumb-up",
            Self::Neutral => "neutral",
        }
    }
}

/// Which way an open thumb points along x.
///
/// Selfie-view capture flips frames horizontally, which flips the sign of
/// the thumb test.  Fixed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbConvention {
    /// Frames are mirrored: open ⇔ `THUMB_TIP.x > THUMB_MCP.x`.
    #[default]
    Mirrored,
    /// Frames are raw camera order: open ⇔ `THUMB_TIP.x < THUMB_MCP.x`.
    Unmirrored,
}

impl ThumbConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mirrored => "mirrored",
            Self::Unmirrored => "unmirrored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mirrored" => Some(Self::Mirrored),
            "unmirrored" => Some(Self::Unmirrored),
            _ => None,
        }
    }
}

/// Extension state of a single non-thumb finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerState {
    /// Tip above its MCP joint.
    Extended,
    /// Tip below its MCP joint.
    Curled,
    /// Tip level with its MCP joint; counts as neither.
    Level,
}

/// Extension state of index, middle, ring and pinky, in that order.
pub fn finger_states(hand: &Hand) -> [FingerState; 4] {
    HandLandmark::finger_tip_mcp_pairs().map(|(tip, mcp)| {
        let tip_y = hand.landmark(tip).y;
        let mcp_y = hand.landmark(mcp).y;
        if tip_y < mcp_y {
            FingerState::Extended
        } else if tip_y > mcp_y {
            FingerState::Curled
        } else {
            FingerState::Level
        }
    })
}

/// Whether the thumb tip lies on the outward side of its MCP joint.
pub fn thumb_open(hand: &Hand, convention: ThumbConvention) -> bool {
    let tip_x = hand.landmark(HandLandmark::ThumbTip).x;
    let mcp_x = hand.landmark(HandLandmark::ThumbMcp).x;
    match convention {
        ThumbConvention::Mirrored => tip_x > mcp_x,
        ThumbConvention::Unmirrored => tip_x < mcp_x,
    }
}

/// Whether each thumb joint is strictly higher than the one below it.
pub fn thumb_vertical(hand: &Hand) -> bool {
    let y = |j: HandLandmark| hand.landmark(j).y;
    y(HandLandmark::ThumbTip) < y(HandLandmark::ThumbIp)
        && y(HandLandmark::ThumbIp) < y(HandLandmark::ThumbMcp)
        && y(HandLandmark::ThumbMcp) < y(HandLandmark::ThumbCmc)
}

/// Classify one hand.
///
/// `ThumbUp` is checked before `Fist`: both need four curled fingers, and
/// a vertical thumb wins.
pub fn classify(hand: &Hand, convention: ThumbConvention) -> Pose {
    let fingers = finger_states(hand);
    let all_curled = fingers.iter().all(|f| *f == FingerState::Curled);
    let all_extended = fingers.iter().all(|f| *f == FingerState::Extended);

    if all_curled {
        if thumb_vertical(hand) {
            return Pose::ThumbUp;
        }
        if !thumb_open(hand, convention) {
            return Pose::Fist;
        }
    } else if all_extended && thumb_open(hand, convention) {
        return Pose::Open;
    }

    Pose::Neutral
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::tracking::{Hand, HandLandmark, Landmark, LANDMARK_COUNT};

    /// A hand with every landmark at (`x`, 0.5).
    pub fn blank(x: f32) -> Vec<Landmark> {
        vec![Landmark::new(x, 0.5, 0.0); LANDMARK_COUNT]
    }

    pub fn set(landmarks: &mut [Landmark], which: HandLandmark, x: f32, y: f32) {
        landmarks[which.index()] = Landmark::new(x, y, 0.0);
    }

    /// Move every fingertip above (`extended`) or below its MCP.
    pub fn set_fingers(landmarks: &mut [Landmark], x: f32, extended: bool) {
        let tip_y = if extended { 0.2 } else { 0.7 };
        for (tip, mcp) in HandLandmark::finger_tip_mcp_pairs() {
            set(landmarks, mcp, x, 0.5);
            set(landmarks, tip, x, tip_y);
        }
    }

    /// Open palm centred at `x`, mirrored thumb convention.
    pub fn open_hand(x: f32) -> Hand {
        let mut lm = blank(x);
        set_fingers(&mut lm, x, true);
        set(&mut lm, HandLandmark::ThumbCmc, x - 0.05, 0.6);
        set(&mut lm, HandLandmark::ThumbMcp, x - 0.02, 0.55);
        set(&mut lm, HandLandmark::ThumbIp, x + 0.02, 0.55);
        set(&mut lm, HandLandmark::ThumbTip, x + 0.05, 0.56);
        Hand::new(&lm, None).unwrap()
    }

    /// Fist centred at `x`, thumb tucked across the palm.
    pub fn fist_hand(x: f32) -> Hand {
        let mut lm = blank(x);
        set_fingers(&mut lm, x, false);
        set(&mut lm, HandLandmark::ThumbCmc, x + 0.05, 0.6);
        set(&mut lm, HandLandmark::ThumbMcp, x + 0.02, 0.55);
        set(&mut lm, HandLandmark::ThumbIp, x, 0.58);
        set(&mut lm, HandLandmark::ThumbTip, x - 0.02, 0.6);
        Hand::new(&lm, None).unwrap()
    }

    /// Curled fingers with the thumb stacked straight up.
    pub fn thumb_up_hand(x: f32) -> Hand {
        let mut lm = blank(x);
        set_fingers(&mut lm, x, false);
        set(&mut lm, HandLandmark::ThumbCmc, x, 0.6);
        set(&mut lm, HandLandmark::ThumbMcp, x, 0.45);
        set(&mut lm, HandLandmark::ThumbIp, x, 0.3);
        set(&mut lm, HandLandmark::ThumbTip, x, 0.2);
        Hand::new(&lm, None).unwrap()
    }

    /// Only the index finger raised.
    pub fn pointing_hand(x: f32) -> Hand {
        let mut lm = blank(x);
        set_fingers(&mut lm, x, false);
        set(&mut lm, HandLandmark::IndexTip, x, 0.1);
        Hand::new(&lm, None).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::tracking::{Landmark, LANDMARK_COUNT};
    use proptest::prelude::*;

    #[test]
    fn test_open_palm() {
        assert_eq!(classify(&open_hand(0.3), ThumbConvention::Mirrored), Pose::Open);
    }

    #[test]
    fn test_fist() {
        assert_eq!(classify(&fist_hand(0.3), ThumbConvention::Mirrored), Pose::Fist);
    }

    #[test]
    fn test_thumb_up_beats_fist() {
        let hand = thumb_up_hand(0.3);
        assert!(finger_states(&hand).iter().all(|f| *f == FingerState::Curled));
        assert!(!thumb_open(&hand, ThumbConvention::Mirrored));
        assert_eq!(classify(&hand, ThumbConvention::Mirrored), Pose::ThumbUp);
        assert_eq!(classify(&hand, ThumbConvention::Unmirrored), Pose::ThumbUp);
    }

    #[test]
    fn test_single_finger_is_neutral() {
        assert_eq!(
            classify(&pointing_hand(0.3), ThumbConvention::Mirrored),
            Pose::Neutral
        );
    }

    #[test]
    fn test_convention_flips_thumb_test() {
        // The same open palm reads as neutral when the mirroring assumption
        // is wrong, and the tucked thumb of a fist now reads as open.
        assert_eq!(classify(&open_hand(0.3), ThumbConvention::Unmirrored), Pose::Neutral);
        assert_eq!(classify(&fist_hand(0.3), ThumbConvention::Unmirrored), Pose::Neutral);
    }

    #[test]
    fn test_level_fingertip_is_not_extended() {
        let mut lm = blank(0.3);
        set_fingers(&mut lm, 0.3, true);
        set(&mut lm, HandLandmark::ThumbMcp, 0.28, 0.55);
        set(&mut lm, HandLandmark::ThumbTip, 0.35, 0.55);
        set(&mut lm, HandLandmark::RingTip, 0.3, 0.5); // level with ring MCP
        let hand = Hand::new(&lm, None).unwrap();
        assert_eq!(finger_states(&hand)[2], FingerState::Level);
        assert_eq!(classify(&hand, ThumbConvention::Mirrored), Pose::Neutral);
    }

    #[test]
    fn test_blank_hand_is_neutral() {
        let hand = Hand::new(&blank(0.5), None).unwrap();
        assert_eq!(classify(&hand, ThumbConvention::Mirrored), Pose::Neutral);
    }

    #[test]
    fn test_pose_as_str() {
        assert_eq!(Pose::Open.as_str(), "open");
        assert_eq!(Pose::ThumbUp.as_str(), "thumb-up");
    }

    fn arb_hand() -> impl Strategy<Value = Hand> {
        prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), LANDMARK_COUNT).prop_map(|pts| {
            let lm: Vec<Landmark> = pts.into_iter().map(|(x, y)| Landmark::new(x, y, 0.0)).collect();
            Hand::new(&lm, None).unwrap()
        })
    }

    fn arb_convention() -> impl Strategy<Value = ThumbConvention> {
        prop_oneof![Just(ThumbConvention::Mirrored), Just(ThumbConvention::Unmirrored)]
    }

    proptest! {
        #[test]
        fn open_and_fist_are_exclusive(hand in arb_hand(), convention in arb_convention()) {
            let fingers = finger_states(&hand);
            let open = fingers.iter().all(|f| *f == FingerState::Extended)
                && thumb_open(&hand, convention);
            let fist = fingers.iter().all(|f| *f == FingerState::Curled)
                && !thumb_open(&hand, convention);
            prop_assert!(!(open && fist));
        }

        #[test]
        fn classification_matches_its_predicates(hand in arb_hand(), convention in arb_convention()) {
            let fingers = finger_states(&hand);
            match classify(&hand, convention) {
                Pose::Open => {
                    prop_assert!(fingers.iter().all(|f| *f == FingerState::Extended));
                    prop_assert!(thumb_open(&hand, convention));
                }
                Pose::Fist => {
                    prop_assert!(fingers.iter().all(|f| *f == FingerState::Curled));
                    prop_assert!(!thumb_open(&hand, convention));
                    prop_assert!(!thumb_vertical(&hand));
                }
                Pose::ThumbUp => {
                    prop_assert!(fingers.iter().all(|f| *f == FingerState::Curled));
                    prop_assert!(thumb_vertical(&hand));
                }
                Pose::Neutral => {}
            }
        }

        #[test]
        fn curled_fingers_with_stacked_thumb_is_thumb_up(
            thumb_x in prop::array::uniform4(0.0f32..1.0),
            convention in arb_convention(),
        ) {
            let mut lm = blank(0.5);
            set_fingers(&mut lm, 0.5, false);
            set(&mut lm, HandLandmark::ThumbCmc, thumb_x[0], 0.9);
            set(&mut lm, HandLandmark::ThumbMcp, thumb_x[1], 0.7);
            set(&mut lm, HandLandmark::ThumbIp, thumb_x[2], 0.4);
            set(&mut lm, HandLandmark::ThumbTip, thumb_x[3], 0.1);
            let hand = Hand::new(&lm, None).unwrap();
            prop_assert_eq!(classify(&hand, convention), Pose::ThumbUp);
        }
    }
}
