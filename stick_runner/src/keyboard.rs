//! OS keyboard backend for the key injector.

use chroma_stick::config::KeyBindings;
use chroma_stick::core_modules::keys::KeySymbol;
use chroma_stick::error::StickError;
use chroma_stick::injector::KeyBackend;
use enigo::{Enigo, Key, Keyboard, Settings};

pub struct EnigoBackend {
    enigo: Enigo,
    keys: [Key; 5],
}

impl EnigoBackend {
    pub fn new(bindings: &KeyBindings) -> Result<Self, StickError> {
        let mut keys = [Key::Space; 5];
        for (slot, symbol) in keys.iter_mut().zip(KeySymbol::ALL) {
            *slot = parse_key(bindings.binding(symbol)).ok_or_else(|| {
                StickError::Injection(format!(
                    "cannot map key binding `{}` for {symbol}",
                    bindings.binding(symbol)
                ))
            })?;
        }
        let enigo = Enigo::new(&Settings::default())
            .map_err(|err| StickError::Injection(format!("keyboard unavailable: {err}")))?;
        Ok(Self { enigo, keys })
    }

    fn send(&mut self, symbol: KeySymbol, direction: enigo::Direction) -> Result<(), StickError> {
        let key = self.keys[symbol as usize];
        self.enigo
            .key(key, direction)
            .map_err(|err| StickError::Injection(format!("{symbol}: {err}")))
    }
}

/// Named keys first, then any single character.
fn parse_key(name: &str) -> Option<Key> {
    let name = name.trim();
    let named = match name.to_ascii_lowercase().as_str() {
        "space" => Some(Key::Space),
        "up" => Some(Key::UpArrow),
        "down" => Some(Key::DownArrow),
        "left" => Some(Key::LeftArrow),
        "right" => Some(Key::RightArrow),
        "enter" | "return" => Some(Key::Return),
        "shift" => Some(Key::Shift),
        "control" | "ctrl" => Some(Key::Control),
        "alt" => Some(Key::Alt),
        "tab" => Some(Key::Tab),
        "escape" | "esc" => Some(Key::Escape),
        _ => None,
    };
    if named.is_some() {
        return named;
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(Key::Unicode(c.to_ascii_lowercase())),
        _ => None,
    }
}

impl KeyBackend for EnigoBackend {
    fn press(&mut self, symbol: KeySymbol) -> Result<(), StickError> {
        self.send(symbol, enigo::Direction::Press)
    }

    fn release(&mut self, symbol: KeySymbol) -> Result<(), StickError> {
        self.send(symbol, enigo::Direction::Release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_single_character_keys() {
        assert_eq!(parse_key("space"), Some(Key::Space));
        assert_eq!(parse_key("Up"), Some(Key::UpArrow));
        assert_eq!(parse_key("w"), Some(Key::Unicode('w')));
        assert_eq!(parse_key(" D "), Some(Key::Unicode('d')));
        assert_eq!(parse_key("F13x"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn default_bindings_all_parse() {
        let bindings = KeyBindings::default();
        for symbol in KeySymbol::ALL {
            assert!(parse_key(bindings.binding(symbol)).is_some(), "{symbol}");
        }
    }
}
