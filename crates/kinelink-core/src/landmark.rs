//! The fixed landmark index set streamed by the pose producer
//!
//! Order is significant: the wire format sends a plain array and the
//! aggregator indexes by position.

/// Number of streamed landmark points
pub const LANDMARK_COUNT: usize = 23;

/// Landmark identifier for the streamed skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Nose = 0,
    LeftEar = 1,
    RightEar = 2,
    LeftShoulder = 3,
    RightShoulder = 4,
    LeftElbow = 5,
    RightElbow = 6,
    LeftWrist = 7,
    RightWrist = 8,
    LeftPinky = 9,
    RightPinky = 10,
    LeftIndex = 11,
    RightIndex = 12,
    LeftHip = 13,
    RightHip = 14,
    LeftKnee = 15,
    RightKnee = 16,
    LeftAnkle = 17,
    RightAnkle = 18,
    LeftHeel = 19,
    RightHeel = 20,
    LeftFootIndex = 21,
    RightFootIndex = 22,
}

impl Landmark {
    /// All landmarks in wire order
    pub fn all() -> &'static [Landmark] {
        &[
            Landmark::Nose,
            Landmark::LeftEar,
            Landmark::RightEar,
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftElbow,
            Landmark::RightElbow,
            Landmark::LeftWrist,
            Landmark::RightWrist,
            Landmark::LeftPinky,
            Landmark::RightPinky,
            Landmark::LeftIndex,
            Landmark::RightIndex,
            Landmark::LeftHip,
            Landmark::RightHip,
            Landmark::LeftKnee,
            Landmark::RightKnee,
            Landmark::LeftAnkle,
            Landmark::RightAnkle,
            Landmark::LeftHeel,
            Landmark::RightHeel,
            Landmark::LeftFootIndex,
            Landmark::RightFootIndex,
        ]
    }

    /// Wire index of this landmark
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_wire_order() {
        let all = Landmark::all();
        assert_eq!(all.len(), LANDMARK_COUNT);
        for (i, mark) in all.iter().enumerate() {
            assert_eq!(mark.index(), i);
        }
    }

    #[test]
    fn test_anchor_indices() {
        // Calibration anchors are the hips, virtual head anchors the ears
        assert_eq!(Landmark::LeftHip.index(), 13);
        assert_eq!(Landmark::RightHip.index(), 14);
        assert_eq!(Landmark::LeftEar.index(), 1);
        assert_eq!(Landmark::RightEar.index(), 2);
    }
}
