use KeypadKey::*;

/// Represents the keys on a 4x4 keypad.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeypadKey {
    /// The `1` key.
    Key1,
    /// The `2` key.
    Key2,
    /// The `3` key.
    Key3,
    /// The `4` key.
    Key4,
    /// The `5` key.
    Key5,
    /// The `6` key.
    Key6,
    /// The `7` key.
    Key7,
    /// The `8` key.
    Key8,
    /// The `9` key.
    Key9,
    /// The `0` key.
    Key0,
    /// The `*` key.
    KeyAsterisk,
    /// The `#` key.
    KeyHash,
    /// The `A` key.
    KeyA,
    /// The `B` key.
    KeyB,
    /// The `C` key.
    KeyC,
    /// The `D` key.
    KeyD,
}

/// Key layout, indexed by `[row][column]`.
const KEYS: [[KeypadKey; 4]; 4] = [
    [ Key1, Key2, Key3, KeyA, ],
    [ Key4, Key5, Key6, KeyB, ],
    [ Key7, Key8, Key9, KeyC, ],
    [ KeyAsterisk, Key0, KeyHash, KeyD, ],
];

impl KeypadKey {
    /// Converts a position tuple (row, column) to a [KeypadKey].
    pub fn from_position(pos: (u8, u8)) -> Option<KeypadKey> {
        if pos.0 < 4 && pos.1 < 4 {
            Some(KEYS[pos.0 as usize][pos.1 as usize])
        } else {
            None
        }
    }

    /// The (row, column) position of the key in the matrix.
    pub fn position(self) -> (u8, u8) {
        let index = KEYS
            .iter()
            .flatten()
            .position(|&key| key == self)
            .unwrap_or_default() as u8;
        (index / 4, index % 4)
    }

    /// A non-zero single-byte encoding of the key, suitable for an atomic slot where `0` means empty.
    pub fn code(self) -> u8 {
        let (row, col) = self.position();
        row * 4 + col + 1
    }

    /// Inverse of [KeypadKey::code].
    pub fn from_code(code: u8) -> Option<KeypadKey> {
        let index = code.checked_sub(1)?;
        Self::from_position((index / 4, index % 4))
    }

    /// Converts the [KeypadKey] to its corresponding character.
    pub fn to_char(self) -> char {
        match self {
            Key1 => '1',
            Key2 => '2',
            Key3 => '3',
            Key4 => '4',
            Key5 => '5',
            Key6 => '6',
            Key7 => '7',
            Key8 => '8',
            Key9 => '9',
            Key0 => '0',
            KeyAsterisk => '*',
            KeyHash => '#',
            KeyA => 'A',
            KeyB => 'B',
            KeyC => 'C',
            KeyD => 'D',
        }
    }

    /// Converts a character back to a key. Letters are accepted in either case.
    pub fn from_char(c: char) -> Option<KeypadKey> {
        let c = c.to_ascii_uppercase();
        KEYS.iter().flatten().copied().find(|key| key.to_char() == c)
    }

    /// The digit value of the key, or `None` for `*`, `#` and the letters.
    pub fn digit(self) -> Option<u8> {
        self.to_char().to_digit(10).map(|d| d as u8)
    }

    /// The index of a menu letter (`A` is 0, `D` is 3), or `None` for other keys.
    pub fn menu_index(self) -> Option<usize> {
        match self {
            KeyA => Some(0),
            KeyB => Some(1),
            KeyC => Some(2),
            KeyD => Some(3),
            _ => None,
        }
    }
}
