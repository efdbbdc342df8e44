//! Per-tick aggregation of side-assigned poses.

use super::assign::Side;
use super::pose::Pose;

/// Everything the debounce machine needs to know about one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    pub near: Option<Pose>,
    pub far: Option<Pose>,
    /// Kept hands classified as `ThumbUp` (0..=2).
    pub thumbs_up_count: u8,
}

impl Observation {
    /// Both sides hold the given pose.
    pub fn both(&self, pose: Pose) -> bool {
        self.near == Some(pose) && self.far == Some(pose)
    }

    /// No hand on either side.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.near.is_none() && self.far.is_none()
    }

    /// Diagnostic rendering, e.g. `(:near :fist :far nil :thumbs-up 0)`.
    pub fn to_sexp(&self) -> String {
        let pose = |p: Option<Pose>| p.map(|p| format!(":{}", p.as_str())).unwrap_or_else(|| "nil".into());
        format!(
            "(:near {} :far {} :thumbs-up {})",
            pose(self.near),
            pose(self.far),
            self.thumbs_up_count
        )
    }
}

/// Combine the tick's (side, pose) pairs.  A side seen twice keeps its
/// first pose.
pub fn aggregate(pairs: impl IntoIterator<Item = (Side, Pose)>) -> Observation {
    let mut obs = Observation::default();
    for (side, pose) in pairs {
        let slot = match side {
            Side::Near => &mut obs.near,
            Side::Far => &mut obs.far,
        };
        if slot.is_some() {
            continue;
        }
        *slot = Some(pose);
        if pose == Pose::ThumbUp {
            obs.thumbs_up_count += 1;
        }
    }
    obs
}
