//! Cash inventory: the notes loaded in the kiosk and the actuator pin that dispenses each of them.

/// A banknote face value with its remaining stock and dispense pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Denomination {
    pub face_value: u64,
    pub notes: u32,
    pub pin: u8,
}

impl Denomination {
    pub const fn new(face_value: u64, notes: u32, pin: u8) -> Self {
        Denomination { face_value, notes, pin }
    }

    pub fn in_stock(&self) -> bool {
        self.notes >= 1
    }
}

#[derive(Clone, Debug)]
pub struct Inventory {
    denominations: Vec<Denomination>,
}

impl Inventory {
    pub fn new(denominations: Vec<Denomination>) -> Self {
        Inventory { denominations }
    }

    pub fn get(&self, index: usize) -> Option<&Denomination> {
        self.denominations.get(index)
    }

    /// Takes one note of the denomination at `index`. Returns `None`, leaving the stock untouched,
    /// if there's no such denomination or it's out of notes.
    pub fn take_note(&mut self, index: usize) -> Option<Denomination> {
        let denomination = self.denominations.get_mut(index)?;
        denomination.notes = denomination.notes.checked_sub(1)?;
        Some(*denomination)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Denomination> {
        self.denominations.iter()
    }

    /// Every pin that drives a dispenser, in inventory order.
    pub fn pins(&self) -> Vec<u8> {
        self.denominations.iter().map(|d| d.pin).collect()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Inventory::new(vec![
            Denomination::new(10_000, 5, 16),
            Denomination::new(20_000, 5, 17),
            Denomination::new(50_000, 5, 18),
            Denomination::new(100_000, 5, 19),
        ])
    }
}
