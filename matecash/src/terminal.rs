//! A 20x4 character display rendered to a terminal.

use std::fmt::Debug;
use std::io::Write;
use log::{debug, warn};
use matecash_gpio::{GpioError, GpioResult};
use crate::effects::{Display, DISPLAY_COLS, DISPLAY_ROWS};
use crate::utils::WithinExt;

/// Keeps a frame of the display contents and redraws it on every flush that changed something.
#[derive(Debug)]
pub struct ConsoleDisplay<W: Write + Debug> {
    frame: [[u8; DISPLAY_COLS]; DISPLAY_ROWS],
    dirty: bool,
    out: W,
}

impl<W: Write + Debug> ConsoleDisplay<W> {
    pub fn new(out: W) -> Self {
        ConsoleDisplay {
            frame: [[b' '; DISPLAY_COLS]; DISPLAY_ROWS],
            dirty: true,
            out,
        }
    }

    /// The text currently on `row`.
    pub fn row(&self, row: usize) -> Option<&str> {
        self.frame
            .get(row)
            .and_then(|line| std::str::from_utf8(line).ok())
    }

    fn render(&mut self) -> std::io::Result<()> {
        let border = format!("+{}+", "-".repeat(DISPLAY_COLS));
        writeln!(self.out, "{}", border)?;
        for row in 0..DISPLAY_ROWS {
            let line = self.row(row).unwrap_or_default().to_string();
            debug!("|{}|", line);
            writeln!(self.out, "|{}|", line)?;
        }
        writeln!(self.out, "{}", border)?;
        self.out.flush()
    }
}

impl<W: Write + Debug> Display for ConsoleDisplay<W> {
    fn display(&mut self, text: &str, row: u8, col: u8) -> GpioResult<()> {
        let (row, col) = (row as usize, col as usize);
        if !row.within(0..DISPLAY_ROWS) || !col.within(0..DISPLAY_COLS) {
            return Err(GpioError::InvalidArgument);
        }

        let line = &mut self.frame[row];
        for (cell, c) in line[col..].iter_mut().zip(text.chars()) {
            let byte = if c.is_ascii() {
                c as u8
            } else {
                warn!("Character {:?} can't be shown, replaced with '?'.", c);
                b'?'
            };
            if *cell != byte {
                *cell = byte;
                self.dirty = true;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> GpioResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        self.render()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn writes_land_at_the_given_cell() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.display("Hello", 1, 3).unwrap();
        assert_eq!(display.row(1), Some("   Hello            "));
        assert_eq!(display.row(0), Some(" ".repeat(20).as_str()));
    }

    #[test]
    fn text_past_the_last_column_is_clipped() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.display("0123456789", 2, 15).unwrap();
        assert_eq!(display.row(2), Some("               01234"));
    }

    #[test]
    fn non_ascii_characters_are_replaced() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.display("Año", 0, 0).unwrap();
        assert_eq!(&display.row(0).unwrap()[..3], "A?o");
    }

    #[rstest]
    #[case(4, 0)]
    #[case(0, 20)]
    #[case(255, 255)]
    fn out_of_range_addresses_are_rejected(#[case] row: u8, #[case] col: u8) {
        let mut display = ConsoleDisplay::new(Vec::new());
        assert_eq!(display.display("x", row, col), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn flush_renders_only_after_changes() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.display("MateCash", 0, 0).unwrap();
        display.flush().unwrap();
        display.display("MateCash", 0, 0).unwrap();
        display.flush().unwrap();

        let rendered = String::from_utf8(display.out).unwrap();
        assert_eq!(rendered.lines().count(), DISPLAY_ROWS + 2);
        assert!(rendered.contains("|MateCash            |"));
    }
}
