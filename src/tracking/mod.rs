//! Tracker-facing side: landmark data and frame sources.

pub mod hand;
pub mod source;

pub use hand::{Hand, HandLandmark, Handedness, Landmark, RawHand, LANDMARK_COUNT};
pub use source::{FeedSource, Frame, FrameSource, Timestamp};
