//! Input normalization
//!
//! Raw pointer and control events are turned into `Command`s here. Which
//! commands mean what depends on the game phase, so routing happens in
//! `Game`; this layer only flips coordinates and maps controls.

use glam::Vec2;

use crate::sim::{Axis, Movement};

/// Discrete controls a platform can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ActionA,
    ActionB,
    ActionX,
    ActionY,
    Menu1,
    Menu2,
}

/// Raw input from the platform. Pointer coordinates are in presentation
/// units with y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    ControlStarted(Control),
    ControlStopped(Control),
}

/// Phase-independent meaning of an input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Pointer pressed at a world point (y up)
    Press(Vec2),
    /// Pointer released at a world point (y up)
    Release(Vec2),
    /// Replace the movement intent for one axis
    Steer { axis: Axis, movement: Movement },
    /// Primary action (jump while playing, play-again on the results screen)
    Primary { pressed: bool },
    TogglePause,
}

impl Control {
    /// Axis and cruise direction for directional controls
    fn direction(self) -> Option<(Axis, Movement)> {
        match self {
            Control::MoveLeft => Some((Axis::Horizontal, Movement::NegativeCruise)),
            Control::MoveRight => Some((Axis::Horizontal, Movement::PositiveCruise)),
            Control::MoveUp => Some((Axis::Vertical, Movement::PositiveCruise)),
            Control::MoveDown => Some((Axis::Vertical, Movement::NegativeCruise)),
            _ => None,
        }
    }
}

/// Map a raw event to a command. Controls with no binding yield `None`.
///
/// `scene_height` is used to flip pointer y into world orientation.
pub fn translate(event: InputEvent, scene_height: f32) -> Option<Command> {
    let flip = |x: f32, y: f32| Vec2::new(x, scene_height - y);

    match event {
        InputEvent::PointerDown { x, y } => Some(Command::Press(flip(x, y))),
        InputEvent::PointerUp { x, y } => Some(Command::Release(flip(x, y))),
        InputEvent::ControlStarted(control) => {
            if let Some((axis, movement)) = control.direction() {
                return Some(Command::Steer { axis, movement });
            }
            match control {
                Control::ActionA => Some(Command::Primary { pressed: true }),
                Control::Menu2 => Some(Command::TogglePause),
                _ => None,
            }
        }
        InputEvent::ControlStopped(control) => {
            // Releasing a direction drifts rather than brakes
            if let Some((axis, _)) = control.direction() {
                return Some(Command::Steer {
                    axis,
                    movement: Movement::Coast,
                });
            }
            match control {
                Control::ActionA => Some(Command::Primary { pressed: false }),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_y_is_flipped() {
        assert_eq!(
            translate(InputEvent::PointerDown { x: 10.0, y: 100.0 }, 600.0),
            Some(Command::Press(Vec2::new(10.0, 500.0)))
        );
        assert_eq!(
            translate(InputEvent::PointerUp { x: 0.0, y: 600.0 }, 600.0),
            Some(Command::Release(Vec2::ZERO))
        );
    }

    #[test]
    fn test_directions_cruise_then_coast() {
        let cases = [
            (Control::MoveLeft, Axis::Horizontal, Movement::NegativeCruise),
            (Control::MoveRight, Axis::Horizontal, Movement::PositiveCruise),
            (Control::MoveUp, Axis::Vertical, Movement::PositiveCruise),
            (Control::MoveDown, Axis::Vertical, Movement::NegativeCruise),
        ];
        for (control, axis, movement) in cases {
            assert_eq!(
                translate(InputEvent::ControlStarted(control), 600.0),
                Some(Command::Steer { axis, movement })
            );
            assert_eq!(
                translate(InputEvent::ControlStopped(control), 600.0),
                Some(Command::Steer {
                    axis,
                    movement: Movement::Coast
                })
            );
        }
    }

    #[test]
    fn test_actions_and_menus() {
        assert_eq!(
            translate(InputEvent::ControlStarted(Control::ActionA), 600.0),
            Some(Command::Primary { pressed: true })
        );
        assert_eq!(
            translate(InputEvent::ControlStopped(Control::ActionA), 600.0),
            Some(Command::Primary { pressed: false })
        );
        assert_eq!(
            translate(InputEvent::ControlStarted(Control::Menu2), 600.0),
            Some(Command::TogglePause)
        );
        assert_eq!(translate(InputEvent::ControlStopped(Control::Menu2), 600.0), None);

        for control in [Control::ActionB, Control::ActionX, Control::ActionY, Control::Menu1] {
            assert_eq!(translate(InputEvent::ControlStarted(control), 600.0), None);
            assert_eq!(translate(InputEvent::ControlStopped(control), 600.0), None);
        }
    }
}
