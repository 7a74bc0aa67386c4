use std::fmt::Debug;
use crate::{GpioBusOutput, GpioResult};
use crate::keypad::KeySource;

/// Drives the keypad rows, one at a time, on every tick of the row-scan timer.
///
/// The row bus is expected to be configured active-low, so the single asserted row is the one pulled
/// low and a pressed key pulls its (pulled-up) column low with it.
#[derive(Debug)]
pub struct RowScanner<'a> {
    rows: &'a dyn GpioBusOutput<4>,
    source: &'a KeySource,
}

impl<'a> RowScanner<'a> {
    pub fn new(rows: &'a dyn GpioBusOutput<4>, source: &'a KeySource) -> Self {
        RowScanner { rows, source }
    }

    /// Asserts the row the source currently points at, without advancing.
    pub fn start(&self) -> GpioResult<()> {
        self.drive(self.source.current_row())
    }

    /// Advances to the next row and asserts it. Returns the newly asserted row.
    ///
    /// The row index is published before the lines change, so an edge caused by the new row can
    /// never be resolved against the previous one.
    pub fn tick(&self) -> GpioResult<u8> {
        let row = self.source.advance_row();
        self.drive(row)?;
        Ok(row)
    }

    fn drive(&self, row: u8) -> GpioResult<()> {
        self.rows.write_nibble(1 << row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct RecordingBus {
        writes: RefCell<Vec<[bool; 4]>>,
    }

    impl GpioBusOutput<4> for RecordingBus {
        fn write(&self, values: &[bool; 4]) -> GpioResult<()> {
            self.writes.borrow_mut().push(*values);
            Ok(())
        }
    }

    #[test]
    fn asserts_exactly_one_row_per_tick() {
        let bus = RecordingBus::default();
        let source = KeySource::default();
        let scanner = RowScanner::new(&bus, &source);

        scanner.start().unwrap();
        for _ in 0..4 {
            scanner.tick().unwrap();
        }

        assert_eq!(
            *bus.writes.borrow(),
            vec![
                [true, false, false, false],
                [false, true, false, false],
                [false, false, true, false],
                [false, false, false, true],
                [true, false, false, false],
            ]
        );
        assert_eq!(source.current_row(), 0);
    }
}
