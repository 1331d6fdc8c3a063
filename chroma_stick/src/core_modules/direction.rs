// THEORY:
// The direction mapper is the "stick" itself. It compares where the marker is now
// against the calibrated origin and reports which directions are being pushed.
//
// Key principles:
// 1.  **Deadzone**: small displacements are hand tremor, not intent. Nothing is
//     reported until the marker leaves a square of +/- deadzone around the origin.
//     The comparison is strict, so a displacement of exactly `deadzone` is neutral.
// 2.  **Independent axes**: vertical and horizontal are decided separately, so
//     diagonals fall out naturally as one vertical plus one horizontal direction.
// 3.  **Screen coordinates**: y grows downward, so a negative dy is UP.
// 4.  **Stateless**: the set is recomputed from scratch every frame.

use crate::core_modules::blob::Point;
use std::fmt;

pub const DEFAULT_DEADZONE: u32 = 40;

/// One of the four stick directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        };
        f.write_str(name)
    }
}

/// Active directions for one frame. Holds at most one vertical and at most one
/// horizontal direction by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionSet {
    vertical: Option<Direction>,
    horizontal: Option<Direction>,
}

impl DirectionSet {
    pub const NEUTRAL: DirectionSet = DirectionSet {
        vertical: None,
        horizontal: None,
    };

    pub fn vertical(&self) -> Option<Direction> {
        self.vertical
    }

    pub fn horizontal(&self) -> Option<Direction> {
        self.horizontal
    }

    pub fn is_empty(&self) -> bool {
        self.vertical.is_none() && self.horizontal.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.vertical == Some(direction) || self.horizontal == Some(direction)
    }

    /// Vertical first, then horizontal.
    pub fn iter(&self) -> impl Iterator<Item = Direction> {
        self.vertical.into_iter().chain(self.horizontal)
    }
}

impl fmt::Display for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NEUTRAL");
        }
        let names: Vec<String> = self.iter().map(|d| d.to_string()).collect();
        f.write_str(&names.join(" "))
    }
}

pub mod direction_mapper {
    use super::*;

    /// Maps a marker position to stick directions relative to `origin`.
    pub fn map(origin: Point, position: Point, deadzone: u32) -> DirectionSet {
        let (dx, dy) = position.offset_from(origin);
        map_displacement(dx, dy, deadzone)
    }

    pub fn map_displacement(dx: i32, dy: i32, deadzone: u32) -> DirectionSet {
        let deadzone = i64::from(deadzone);
        let (dx, dy) = (i64::from(dx), i64::from(dy));

        if dx.abs() <= deadzone && dy.abs() <= deadzone {
            return DirectionSet::NEUTRAL;
        }

        let vertical = if dy < -deadzone {
            Some(Direction::Up)
        } else if dy > deadzone {
            Some(Direction::Down)
        } else {
            None
        };
        let horizontal = if dx < -deadzone {
            Some(Direction::Left)
        } else if dx > deadzone {
            Some(Direction::Right)
        } else {
            None
        };

        DirectionSet { vertical, horizontal }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn resting_on_origin_is_neutral() {
            let set = map(Point::new(100, 100), Point::new(100, 100), 40);
            assert!(set.is_empty());
        }

        #[test]
        fn moving_up_past_deadzone() {
            let set = map(Point::new(100, 100), Point::new(100, 30), 40);
            assert_eq!(set.iter().collect::<Vec<_>>(), vec![Direction::Up]);
        }

        #[test]
        fn diagonal_down_right() {
            let set = map(Point::new(100, 100), Point::new(160, 160), 40);
            assert!(set.contains(Direction::Down));
            assert!(set.contains(Direction::Right));
            assert_eq!(set.len(), 2);
        }

        #[test]
        fn exactly_on_deadzone_is_neutral() {
            assert!(map_displacement(40, -40, 40).is_empty());
            assert!(map_displacement(-40, 40, 40).is_empty());
        }

        #[test]
        fn one_axis_inside_deadzone_contributes_nothing() {
            let set = map_displacement(-41, 40, 40);
            assert_eq!(set.horizontal(), Some(Direction::Left));
            assert_eq!(set.vertical(), None);
        }

        #[test]
        fn extreme_displacements_do_not_overflow() {
            let set = map_displacement(i32::MIN, i32::MAX, u32::MAX);
            assert!(set.is_empty());
            let set = map_displacement(i32::MIN, i32::MAX, 0);
            assert!(set.contains(Direction::Left) && set.contains(Direction::Down));
        }

        #[test]
        fn display_matches_overlay_text() {
            assert_eq!(DirectionSet::NEUTRAL.to_string(), "NEUTRAL");
            assert_eq!(map_displacement(50, -50, 40).to_string(), "UP RIGHT");
        }
    }
}
