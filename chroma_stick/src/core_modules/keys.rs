// THEORY:
// The `keys` module owns the boundary to the input injection service, which is
// stateful: a key stays down until it is explicitly released. The pipeline
// therefore never sends "tap" commands. It keeps the set of symbols it believes
// are held and, each frame, turns the desired set into an ordered list of
// key-up/key-down commands.
//
// Two emission modes:
// - `Diff` (default): release only what is no longer wanted, press only what is
//   newly wanted. Holding a direction produces no traffic at all.
// - `ReleaseAll`: on every active frame release all five symbols, then press the
//   desired set. Noisier, but command-for-command what a naive per-frame
//   loop produces.
//
// Ordering is fixed: all releases first, then all presses, each in symbol order.

use crate::core_modules::direction::{Direction, DirectionSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbols the injection service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySymbol {
    Up,
    Down,
    Left,
    Right,
    Action,
}

impl KeySymbol {
    pub const ALL: [KeySymbol; 5] = [
        KeySymbol::Up,
        KeySymbol::Down,
        KeySymbol::Left,
        KeySymbol::Right,
        KeySymbol::Action,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl From<Direction> for KeySymbol {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => KeySymbol::Up,
            Direction::Down => KeySymbol::Down,
            Direction::Left => KeySymbol::Left,
            Direction::Right => KeySymbol::Right,
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeySymbol::Up => "UP",
            KeySymbol::Down => "DOWN",
            KeySymbol::Left => "LEFT",
            KeySymbol::Right => "RIGHT",
            KeySymbol::Action => "ACTION",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    Down(KeySymbol),
    Up(KeySymbol),
}

impl KeyCommand {
    pub fn symbol(&self) -> KeySymbol {
        match self {
            KeyCommand::Down(symbol) | KeyCommand::Up(symbol) => *symbol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionMode {
    #[default]
    Diff,
    ReleaseAll,
}

/// A small set of key symbols, iterated in `KeySymbol::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySet(u8);

impl KeySet {
    pub const EMPTY: KeySet = KeySet(0);

    pub fn insert(&mut self, symbol: KeySymbol) {
        self.0 |= symbol.bit();
    }

    pub fn remove(&mut self, symbol: KeySymbol) {
        self.0 &= !symbol.bit();
    }

    pub fn contains(&self, symbol: KeySymbol) -> bool {
        self.0 & symbol.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = KeySymbol> + use<> {
        let set = *self;
        KeySymbol::ALL.into_iter().filter(move |s| set.contains(*s))
    }

    /// Directions plus, optionally, the action symbol.
    pub fn from_directions(directions: &DirectionSet, action: bool) -> Self {
        let mut set = KeySet::EMPTY;
        for direction in directions.iter() {
            set.insert(direction.into());
        }
        if action {
            set.insert(KeySymbol::Action);
        }
        set
    }
}

/// The pipeline's belief about which symbols are currently held down.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: KeySet,
}

impl KeyState {
    pub fn held(&self) -> KeySet {
        self.held
    }

    /// Commands that move the service from the held set to `desired`.
    pub fn transition(&mut self, desired: KeySet, mode: EmissionMode) -> Vec<KeyCommand> {
        let mut commands = Vec::new();
        match mode {
            EmissionMode::Diff => {
                for symbol in self.held.iter().filter(|s| !desired.contains(*s)) {
                    commands.push(KeyCommand::Up(symbol));
                }
                for symbol in desired.iter().filter(|s| !self.held.contains(*s)) {
                    commands.push(KeyCommand::Down(symbol));
                }
            }
            EmissionMode::ReleaseAll => {
                commands.extend(KeySymbol::ALL.into_iter().map(KeyCommand::Up));
                commands.extend(desired.iter().map(KeyCommand::Down));
            }
        }
        self.held = desired;
        commands
    }

    /// Key-ups for everything still held. Used on recalibration and shutdown.
    pub fn release_all(&mut self) -> Vec<KeyCommand> {
        let commands = self.held.iter().map(KeyCommand::Up).collect();
        self.held = KeySet::EMPTY;
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::direction::direction_mapper::map_displacement;

    fn keys(symbols: &[KeySymbol]) -> KeySet {
        let mut set = KeySet::EMPTY;
        for s in symbols {
            set.insert(*s);
        }
        set
    }

    #[test]
    fn diff_presses_new_and_releases_stale() {
        let mut state = KeyState::default();
        let first = state.transition(keys(&[KeySymbol::Up]), EmissionMode::Diff);
        assert_eq!(first, vec![KeyCommand::Down(KeySymbol::Up)]);

        let second = state.transition(keys(&[KeySymbol::Up, KeySymbol::Right]), EmissionMode::Diff);
        assert_eq!(second, vec![KeyCommand::Down(KeySymbol::Right)]);

        let third = state.transition(keys(&[KeySymbol::Down]), EmissionMode::Diff);
        assert_eq!(
            third,
            vec![
                KeyCommand::Up(KeySymbol::Up),
                KeyCommand::Up(KeySymbol::Right),
                KeyCommand::Down(KeySymbol::Down),
            ]
        );
    }

    #[test]
    fn diff_is_silent_when_nothing_changes() {
        let mut state = KeyState::default();
        state.transition(keys(&[KeySymbol::Left]), EmissionMode::Diff);
        assert!(state.transition(keys(&[KeySymbol::Left]), EmissionMode::Diff).is_empty());
    }

    #[test]
    fn release_all_mode_releases_every_symbol_first() {
        let mut state = KeyState::default();
        let commands = state.transition(keys(&[KeySymbol::Down, KeySymbol::Right]), EmissionMode::ReleaseAll);
        assert_eq!(commands.len(), 7);
        assert!(commands[..5].iter().all(|c| matches!(c, KeyCommand::Up(_))));
        assert_eq!(
            &commands[5..],
            &[KeyCommand::Down(KeySymbol::Down), KeyCommand::Down(KeySymbol::Right)]
        );
    }

    #[test]
    fn release_all_empties_the_held_set() {
        let mut state = KeyState::default();
        state.transition(keys(&[KeySymbol::Up, KeySymbol::Action]), EmissionMode::Diff);
        let commands = state.release_all();
        assert_eq!(
            commands,
            vec![KeyCommand::Up(KeySymbol::Up), KeyCommand::Up(KeySymbol::Action)]
        );
        assert!(state.held().is_empty());
        assert!(state.release_all().is_empty());
    }

    #[test]
    fn directions_map_onto_symbols() {
        let set = KeySet::from_directions(&map_displacement(60, 60, 40), true);
        let symbols: Vec<KeySymbol> = set.iter().collect();
        assert_eq!(symbols, vec![KeySymbol::Down, KeySymbol::Right, KeySymbol::Action]);
    }
}
