//! Pick Control State
//!
//! Contains the resources for the pick-and-drag interaction: the pick state
//! machine, the active constraint, and the queue host input is collected in
//! between ticks.

use bevy::prelude::*;
use std::collections::VecDeque;

/// Where the pick interaction currently stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PickState {
    #[default]
    Idle,
    Dragging,
    /// Let go, waiting for the die to settle before the next pick
    Released,
}

/// The point-to-point joint holding the die while it is dragged
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickConstraint {
    /// Kinematic body the joint hangs from; despawning it removes the joint.
    pub anchor: Entity,
    /// Attachment point in the die's body frame, fixed for the whole drag
    pub pivot: Vec3,
    /// World point the die was grabbed at; the drag plane passes through it
    pub plane_origin: Vec3,
    /// Where the anchor should be this tick
    pub anchor_position: Vec3,
}

/// Marker component for the kinematic anchor body of a pick constraint
#[derive(Component)]
pub struct PickAnchor;

/// Resource owning the pick state machine and its constraint
#[derive(Resource, Clone, Debug, Default)]
pub struct PickController {
    state: PickState,
    constraint: Option<PickConstraint>,
}

impl PickController {
    pub fn state(&self) -> PickState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == PickState::Dragging
    }

    pub fn constraint(&self) -> Option<&PickConstraint> {
        self.constraint.as_ref()
    }

    /// Idle -> Dragging. Returns false (and changes nothing) from any other state.
    pub fn begin(&mut self, constraint: PickConstraint) -> bool {
        if self.state != PickState::Idle || self.constraint.is_some() {
            return false;
        }
        self.state = PickState::Dragging;
        self.constraint = Some(constraint);
        true
    }

    /// Move the anchor target; no-op without an active constraint.
    pub fn drag_to(&mut self, position: Vec3) -> bool {
        match self.constraint.as_mut() {
            Some(constraint) => {
                constraint.anchor_position = position;
                true
            }
            None => false,
        }
    }

    /// Dragging -> Released, handing back the constraint to tear down.
    pub fn release(&mut self) -> Option<PickConstraint> {
        let constraint = self.constraint.take()?;
        self.state = PickState::Released;
        Some(constraint)
    }

    /// Released -> Idle once the die has settled again.
    pub fn settle(&mut self) -> bool {
        if self.state != PickState::Released {
            return false;
        }
        self.state = PickState::Idle;
        true
    }

    /// Drop everything and go back to Idle (used by reset).
    pub fn cancel(&mut self) -> Option<PickConstraint> {
        self.state = PickState::Idle;
        self.constraint.take()
    }
}

/// Host input, queued as it arrives and applied at the start of the next tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionEvent {
    /// Pointer or touch pressed, in normalized device coordinates
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
    /// Device acceleration sample
    DeviceMotion(Vec3),
    /// Toss the die with the given velocities
    Throw { linvel: Vec3, angvel: Vec3 },
}

/// Resource collecting host input between ticks
#[derive(Resource, Clone, Debug, Default)]
pub struct InteractionQueue {
    events: VecDeque<InteractionEvent>,
    reset_requested: bool,
}

impl InteractionQueue {
    pub fn push(&mut self, event: InteractionEvent) {
        self.events.push_back(event);
    }

    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InteractionEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint() -> PickConstraint {
        PickConstraint {
            anchor: Entity::PLACEHOLDER,
            pivot: Vec3::new(0.0, 0.1, 0.0),
            plane_origin: Vec3::new(0.0, 0.2, 0.0),
            anchor_position: Vec3::new(0.0, 0.2, 0.0),
        }
    }

    #[test]
    fn test_full_cycle() {
        let mut controller = PickController::default();
        assert_eq!(controller.state(), PickState::Idle);

        assert!(controller.begin(constraint()));
        assert_eq!(controller.state(), PickState::Dragging);

        assert!(controller.drag_to(Vec3::new(1.0, 0.5, 0.0)));
        assert_eq!(
            controller.constraint().map(|c| c.anchor_position),
            Some(Vec3::new(1.0, 0.5, 0.0))
        );

        let released = controller.release().unwrap();
        assert_eq!(released.pivot, constraint().pivot);
        assert_eq!(controller.state(), PickState::Released);
        assert!(controller.constraint().is_none());

        assert!(controller.settle());
        assert_eq!(controller.state(), PickState::Idle);
    }

    #[test]
    fn test_cannot_begin_twice() {
        let mut controller = PickController::default();
        assert!(controller.begin(constraint()));
        assert!(!controller.begin(constraint()));
        assert_eq!(controller.state(), PickState::Dragging);
    }

    #[test]
    fn test_cannot_begin_while_released() {
        let mut controller = PickController::default();
        controller.begin(constraint());
        controller.release();
        assert!(!controller.begin(constraint()));
        assert_eq!(controller.state(), PickState::Released);
    }

    #[test]
    fn test_release_and_move_without_constraint_are_noops() {
        let mut controller = PickController::default();
        assert!(controller.release().is_none());
        assert!(!controller.drag_to(Vec3::ONE));
        assert!(!controller.settle());
        assert_eq!(controller.state(), PickState::Idle);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut controller = PickController::default();
        controller.begin(constraint());
        assert!(controller.cancel().is_some());
        assert_eq!(controller.state(), PickState::Idle);
        assert!(controller.cancel().is_none());
    }

    #[test]
    fn test_queue_preserves_order_and_reset_flag() {
        let mut queue = InteractionQueue::default();
        queue.push(InteractionEvent::PointerDown(Vec2::ZERO));
        queue.push(InteractionEvent::PointerUp(Vec2::ZERO));
        queue.request_reset();

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                InteractionEvent::PointerDown(Vec2::ZERO),
                InteractionEvent::PointerUp(Vec2::ZERO)
            ]
        );
        assert!(queue.is_empty());
        assert!(queue.take_reset());
        assert!(!queue.take_reset());
    }
}
