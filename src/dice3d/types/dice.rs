//! Die-related types and components
//!
//! This module contains the die marker component, the signed-axis face table,
//! pip labels, and the host-facing pose snapshot.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component attached to the single simulated die
#[derive(Component)]
pub struct Die;

/// Marker component for the static floor and wall bodies
#[derive(Component)]
pub struct Boundary;

/// The number of pips printed on a face (1 to 6)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PipLabel(u8);

impl PipLabel {
    pub fn new(value: u8) -> Option<Self> {
        (1..=6).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PipLabel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PipLabel::new(value).ok_or_else(|| format!("pip label {value} is outside 1..=6"))
    }
}

impl From<PipLabel> for u8 {
    fn from(label: PipLabel) -> u8 {
        label.0
    }
}

impl fmt::Display for PipLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the six signed body axes a die face can point along
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceAxis {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl FaceAxis {
    /// Fixed iteration order used when resolving the upward face.
    pub const ALL: [FaceAxis; 6] = [
        FaceAxis::PosX,
        FaceAxis::NegX,
        FaceAxis::PosY,
        FaceAxis::NegY,
        FaceAxis::PosZ,
        FaceAxis::NegZ,
    ];

    pub fn index(self) -> usize {
        match self {
            FaceAxis::PosX => 0,
            FaceAxis::NegX => 1,
            FaceAxis::PosY => 2,
            FaceAxis::NegY => 3,
            FaceAxis::PosZ => 4,
            FaceAxis::NegZ => 5,
        }
    }

    /// Body-local unit vector for this axis
    pub fn unit(self) -> Vec3 {
        match self {
            FaceAxis::PosX => Vec3::X,
            FaceAxis::NegX => Vec3::NEG_X,
            FaceAxis::PosY => Vec3::Y,
            FaceAxis::NegY => Vec3::NEG_Y,
            FaceAxis::PosZ => Vec3::Z,
            FaceAxis::NegZ => Vec3::NEG_Z,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FaceAxis::PosX => "+x",
            FaceAxis::NegX => "-x",
            FaceAxis::PosY => "+y",
            FaceAxis::NegY => "-y",
            FaceAxis::PosZ => "+z",
            FaceAxis::NegZ => "-z",
        }
    }
}

/// Pip label bound to each signed axis, indexed by [`FaceAxis::index`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTable(pub [u8; 6]);

impl Default for FaceTable {
    fn default() -> Self {
        // Opposite faces sum to seven.
        //          +x -x +y -y +z -z
        FaceTable([3, 4, 6, 1, 2, 5])
    }
}

impl FaceTable {
    /// True when the six entries are exactly the labels 1 through 6.
    pub fn is_bijection(&self) -> bool {
        let mut seen = [false; 6];
        for &value in &self.0 {
            if !(1..=6).contains(&value) || seen[(value - 1) as usize] {
                return false;
            }
            seen[(value - 1) as usize] = true;
        }
        true
    }

    pub fn label(&self, axis: FaceAxis) -> Option<PipLabel> {
        PipLabel::new(self.0[axis.index()])
    }

    /// Inverse lookup, used by front ends to place pip decals.
    pub fn axis_of(&self, label: PipLabel) -> Option<FaceAxis> {
        FaceAxis::ALL
            .into_iter()
            .find(|axis| self.0[axis.index()] == label.value())
    }
}

/// Position and orientation snapshot of a body, copied out after every step
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            orientation: transform.rotation,
        }
    }

    pub fn to_transform(self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }
}

/// Resource holding the die pose as of the last completed step
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct DiePose {
    pub pose: Pose,
    pub linvel: Vec3,
    pub angvel: Vec3,
    /// Height of the die center above the floor
    pub elevation: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pip_label_range() {
        assert!(PipLabel::new(0).is_none());
        assert_eq!(PipLabel::new(1).map(PipLabel::value), Some(1));
        assert_eq!(PipLabel::new(6).map(PipLabel::value), Some(6));
        assert!(PipLabel::new(7).is_none());
    }

    #[test]
    fn test_default_face_table_is_bijection() {
        let table = FaceTable::default();
        assert!(table.is_bijection());
        for axis in FaceAxis::ALL {
            let label = table.label(axis).unwrap();
            assert_eq!(table.axis_of(label), Some(axis));
        }
    }

    #[test]
    fn test_face_table_rejects_duplicates_and_out_of_range() {
        assert!(!FaceTable([1, 1, 2, 3, 4, 5]).is_bijection());
        assert!(!FaceTable([0, 1, 2, 3, 4, 5]).is_bijection());
        assert!(!FaceTable([1, 2, 3, 4, 5, 7]).is_bijection());
        assert!(FaceTable([6, 5, 4, 3, 2, 1]).is_bijection());
    }

    #[test]
    fn test_face_axis_units_are_distinct() {
        for (i, a) in FaceAxis::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            assert_eq!(a.unit().length(), 1.0);
            for b in FaceAxis::ALL.iter().skip(i + 1) {
                assert_ne!(a.unit(), b.unit());
            }
        }
    }
}
