//! Face read-out
//!
//! Six indicator points sit on the signed body axes. When the die rests on a
//! face, exactly one of them ends up well above the die center, and its label
//! is the visible face.

use bevy::prelude::*;

use super::dice::{FaceAxis, FaceTable, PipLabel};
use super::settings::{FaceReportMode, SimulationSettings};
use super::stability::Stability;

/// Published whenever the reported face changes; `None` means "no face".
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceChanged(pub Option<PipLabel>);

/// Host callback invoked for every [`FaceChanged`] message
#[derive(Resource)]
pub struct FaceListener(pub Box<dyn FnMut(Option<PipLabel>) + Send + Sync>);

/// Resource mapping the die orientation to a pip label
#[derive(Resource, Clone, Debug)]
pub struct FaceMapper {
    table: FaceTable,
    reach: f32,
    edge_length: f32,
    mode: FaceReportMode,
    current: Option<PipLabel>,
    /// Set once the die has been lifted above one edge length since the last read.
    armed: bool,
}

impl FaceMapper {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            table: settings.die.face_table,
            reach: settings.die.indicator_reach,
            edge_length: settings.die.edge_length,
            mode: settings.face_report_mode,
            current: None,
            armed: true,
        }
    }

    /// World-space indicator positions, in [`FaceAxis::ALL`] order
    pub fn indicator_positions(&self, die: &Transform) -> [Vec3; 6] {
        FaceAxis::ALL.map(|axis| die.translation + die.rotation * (axis.unit() * self.reach))
    }

    /// The first indicator (in fixed axis order) that rises more than one edge
    /// length above the die center.
    pub fn upward_axis(&self, die: &Transform) -> Option<FaceAxis> {
        FaceAxis::ALL
            .into_iter()
            .zip(self.indicator_positions(die))
            .find(|(_, world)| world.y - die.translation.y > self.edge_length)
            .map(|(axis, _)| axis)
    }

    pub fn resolve(&self, die: &Transform) -> Option<PipLabel> {
        self.upward_axis(die)
            .and_then(|axis| self.table.label(axis))
    }

    /// Advance one frame. Returns the new output when it differs from the last one.
    pub fn update(
        &mut self,
        stability: Stability,
        dragging: bool,
        die: &Transform,
        elevation: f32,
    ) -> Option<Option<PipLabel>> {
        if elevation > self.edge_length {
            self.armed = true;
        }

        let next = if dragging {
            None
        } else {
            match self.mode {
                FaceReportMode::Continuous => match stability {
                    Stability::Settled => self.resolve(die),
                    Stability::Unsettled => None,
                },
                FaceReportMode::OncePerSettle => {
                    if stability == Stability::Settled && self.armed {
                        self.armed = false;
                        self.resolve(die)
                    } else {
                        self.current
                    }
                }
            }
        };

        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }

    pub fn current(&self) -> Option<PipLabel> {
        self.current
    }

    pub fn mode(&self) -> FaceReportMode {
        self.mode
    }

    pub fn table(&self) -> &FaceTable {
        &self.table
    }

    /// Allow the next settle to be read even without a lift.
    pub fn rearm(&mut self) {
        self.armed = true;
    }

    /// Forget the last read and re-arm the once-per-settle latch.
    pub fn clear(&mut self) {
        self.current = None;
        self.armed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const RESTING: f32 = 0.1;

    fn mapper(mode: FaceReportMode) -> FaceMapper {
        let mut settings = SimulationSettings::default();
        settings.face_report_mode = mode;
        FaceMapper::new(&settings)
    }

    fn label_of(mapper: &FaceMapper, axis: FaceAxis) -> Option<PipLabel> {
        mapper.table().label(axis)
    }

    #[test]
    fn test_identity_reports_positive_y() {
        let mapper = mapper(FaceReportMode::Continuous);
        let die = Transform::from_xyz(0.0, RESTING, 0.0);
        assert_eq!(mapper.upward_axis(&die), Some(FaceAxis::PosY));
        assert_eq!(mapper.resolve(&die), label_of(&mapper, FaceAxis::PosY));
    }

    #[test]
    fn test_quarter_turn_about_x_reports_negative_z() {
        let mapper = mapper(FaceReportMode::Continuous);
        let die = Transform::from_xyz(0.0, RESTING, 0.0)
            .with_rotation(Quat::from_rotation_x(FRAC_PI_2));
        assert_eq!(mapper.upward_axis(&die), Some(FaceAxis::NegZ));
        assert_eq!(mapper.resolve(&die), label_of(&mapper, FaceAxis::NegZ));
    }

    #[test]
    fn test_every_resting_orientation_maps_to_its_axis() {
        let mapper = mapper(FaceReportMode::Continuous);
        let cases = [
            (Quat::IDENTITY, FaceAxis::PosY),
            (Quat::from_rotation_x(PI), FaceAxis::NegY),
            (Quat::from_rotation_z(FRAC_PI_2), FaceAxis::PosX),
            (Quat::from_rotation_z(-FRAC_PI_2), FaceAxis::NegX),
            (Quat::from_rotation_x(-FRAC_PI_2), FaceAxis::PosZ),
        ];
        for (rotation, axis) in cases {
            let die = Transform::from_xyz(1.0, RESTING, -1.0).with_rotation(rotation);
            assert_eq!(mapper.upward_axis(&die), Some(axis), "rotation {rotation:?}");
        }
    }

    #[test]
    fn test_edge_balanced_uses_first_axis_in_order() {
        let mapper = mapper(FaceReportMode::Continuous);
        // +y and -z both at 45 degrees above the center
        let die = Transform::from_xyz(0.0, RESTING, 0.0)
            .with_rotation(Quat::from_rotation_x(FRAC_PI_4));
        assert_eq!(mapper.upward_axis(&die), Some(FaceAxis::PosY));
    }

    #[test]
    fn test_reports_only_changes() {
        let mut mapper = mapper(FaceReportMode::Continuous);
        let die = Transform::from_xyz(0.0, RESTING, 0.0);
        let top = label_of(&mapper, FaceAxis::PosY);

        assert_eq!(mapper.update(Stability::Settled, false, &die, RESTING), Some(top));
        assert_eq!(mapper.update(Stability::Settled, false, &die, RESTING), None);
        assert_eq!(
            mapper.update(Stability::Unsettled, false, &die, RESTING),
            Some(None)
        );
    }

    #[test]
    fn test_dragging_suppresses_face() {
        let mut mapper = mapper(FaceReportMode::Continuous);
        let die = Transform::from_xyz(0.0, RESTING, 0.0);
        mapper.update(Stability::Settled, false, &die, RESTING);
        assert_eq!(mapper.update(Stability::Settled, true, &die, RESTING), Some(None));
        assert_eq!(mapper.current(), None);
    }

    #[test]
    fn test_once_per_settle_needs_a_lift_before_next_read() {
        let mut mapper = mapper(FaceReportMode::OncePerSettle);
        let flat = Transform::from_xyz(0.0, RESTING, 0.0);
        let turned = flat.with_rotation(Quat::from_rotation_x(PI));

        let first = mapper.update(Stability::Settled, false, &flat, RESTING);
        assert_eq!(first, Some(label_of(&mapper, FaceAxis::PosY)));

        // Same settle event: the held value does not change even if the pose does
        assert_eq!(mapper.update(Stability::Settled, false, &turned, RESTING), None);
        assert_eq!(mapper.update(Stability::Unsettled, false, &turned, RESTING), None);

        // Lifted above one edge length, then settled again
        mapper.update(Stability::Unsettled, false, &turned, 1.0);
        let second = mapper.update(Stability::Settled, false, &turned, RESTING);
        assert_eq!(second, Some(label_of(&mapper, FaceAxis::NegY)));
    }

    #[test]
    fn test_once_per_settle_rereads_after_rearm() {
        let mut mapper = mapper(FaceReportMode::OncePerSettle);
        let flat = Transform::from_xyz(0.0, RESTING, 0.0);
        let rolled = flat.with_rotation(Quat::from_rotation_z(FRAC_PI_2));

        mapper.update(Stability::Settled, false, &flat, RESTING);
        assert_eq!(mapper.current(), label_of(&mapper, FaceAxis::PosY));

        // Tossed along the floor: no lift, but the latch is re-armed
        mapper.rearm();
        assert_eq!(mapper.update(Stability::Unsettled, false, &rolled, RESTING), None);
        let next = mapper.update(Stability::Settled, false, &rolled, RESTING);
        assert_eq!(next, Some(label_of(&mapper, FaceAxis::PosX)));
    }
}
