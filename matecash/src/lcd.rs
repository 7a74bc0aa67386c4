//! The kiosk's 20x4 HD44780 panel as a [Display].

use log::warn;
use matecash_gpio::lcd::hd44780::driver::HD44780Driver;
use matecash_gpio::{GpioError, GpioResult};
use crate::effects::{Display, DISPLAY_COLS, DISPLAY_ROWS};
use crate::utils::WithinExt;

#[derive(Debug)]
pub struct LcdDisplay<'a> {
    lcd: &'a mut dyn HD44780Driver,
}

impl<'a> LcdDisplay<'a> {
    pub fn new(lcd: &'a mut dyn HD44780Driver) -> Self {
        LcdDisplay { lcd }
    }
}

impl Display for LcdDisplay<'_> {
    /// Text that runs past the last column is clipped. Left alone, the panel controller would
    /// carry it on into another row.
    fn display(&mut self, text: &str, row: u8, col: u8) -> GpioResult<()> {
        let (row, col) = (row as usize, col as usize);
        if !row.within(0..DISPLAY_ROWS) || !col.within(0..DISPLAY_COLS) {
            return Err(GpioError::InvalidArgument);
        }

        self.lcd.set_cursor(row, col)?;
        for c in text.chars().take(DISPLAY_COLS - col) {
            if c.is_ascii() {
                self.lcd.send_data(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.lcd.send_data(b'?')?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Sent {
        Command(u8),
        Data(u8),
    }

    #[derive(Debug, Default)]
    struct RecordingLcd {
        sent: Vec<Sent>,
    }

    impl RecordingLcd {
        fn text(&self) -> String {
            self.sent
                .iter()
                .filter_map(|sent| match sent {
                    Sent::Data(byte) => Some(*byte as char),
                    Sent::Command(_) => None,
                })
                .collect()
        }
    }

    impl HD44780Driver for RecordingLcd {
        fn init(&mut self, _multiline: bool) -> GpioResult<()> {
            Ok(())
        }

        fn send_command(&mut self, command: u8) -> GpioResult<()> {
            self.sent.push(Sent::Command(command));
            Ok(())
        }

        fn send_data(&mut self, data: u8) -> GpioResult<()> {
            self.sent.push(Sent::Data(data));
            Ok(())
        }
    }

    #[test]
    fn rows_start_at_their_ddram_offsets() {
        let mut lcd = RecordingLcd::default();
        let mut display = LcdDisplay::new(&mut lcd);
        for row in 0..4 {
            display.display("x", row, 0).unwrap();
        }

        let commands: Vec<u8> = lcd
            .sent
            .iter()
            .filter_map(|sent| match sent {
                Sent::Command(command) => Some(*command),
                Sent::Data(_) => None,
            })
            .collect();
        assert_eq!(commands, vec![0x80, 0xC0, 0x94, 0xD4]);
    }

    #[test]
    fn text_is_clipped_at_the_last_column() {
        let mut lcd = RecordingLcd::default();
        LcdDisplay::new(&mut lcd).display("Welcome to MateCash!!", 2, 10).unwrap();

        assert_eq!(lcd.sent[0], Sent::Command(0x80 | (0x14 + 10)));
        assert_eq!(lcd.text(), "Welcome to");
    }

    #[test]
    fn non_ascii_characters_are_replaced() {
        let mut lcd = RecordingLcd::default();
        LcdDisplay::new(&mut lcd).display("Año", 0, 0).unwrap();
        assert_eq!(lcd.text(), "A?o");
    }

    #[rstest]
    #[case(4, 0)]
    #[case(0, 20)]
    fn out_of_range_addresses_are_rejected(#[case] row: u8, #[case] col: u8) {
        let mut lcd = RecordingLcd::default();
        let result = LcdDisplay::new(&mut lcd).display("x", row, col);
        assert_eq!(result, Err(GpioError::InvalidArgument));
        assert!(lcd.sent.is_empty());
    }
}
