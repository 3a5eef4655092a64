use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Char(char),
    Backspace,
    Return,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// Primary button press, in canvas coordinates.
    PointerPressed(Vec2),
}

impl Key {
    /// Maps a typed character, treating ASCII digits as `Digit`.
    pub fn from_char(c: char) -> Self {
        match c.to_digit(10) {
            Some(d) => Key::Digit(d as u8),
            None => Key::Char(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_classified() {
        assert_eq!(Key::from_char('7'), Key::Digit(7));
        assert_eq!(Key::from_char('a'), Key::Char('a'));
    }
}
