use crate::lcd::hd44780::driver::{CursorDirection, HD44780Driver};
use crate::{GpioBusOutput, GpioOutput, GpioResult};
use log::trace;
use std::thread::sleep;
use std::time::Duration;

/// HD44780 on GPIO lines: E, RS, an optional RW (held low) and a 4-bit data bus on D4..D7.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a> {
    pin_e: &'a dyn GpioOutput,
    pin_rw: Option<&'a dyn GpioOutput>,
    pin_rs: &'a dyn GpioOutput,
    data_bus: &'a dyn GpioBusOutput<4>,
}

impl<'a> GpioHD44780Driver<'a> {
    pub fn new_4bit(
        pin_e: &'a dyn GpioOutput,
        pin_rw: Option<&'a dyn GpioOutput>,
        pin_rs: &'a dyn GpioOutput,
        data_bus: &'a dyn GpioBusOutput<4>,
    ) -> Self {
        GpioHD44780Driver {
            pin_e,
            pin_rw,
            pin_rs,
            data_bus,
        }
    }

    fn pulse_e(&self) -> GpioResult<()> {
        self.pin_e.write(true)?;
        sleep(Duration::from_micros(1));
        self.pin_e.write(false)?;
        sleep(Duration::from_micros(100));
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        self.pin_rs.write(rs)?;
        if let Some(rw) = self.pin_rw {
            rw.write(false)?;
        }

        // High nibble first.
        self.data_bus.write_nibble((data >> 4) & 0x0F)?;
        self.pulse_e()?;
        self.data_bus.write_nibble(data & 0x0F)?;
        self.pulse_e()
    }
}

impl HD44780Driver for GpioHD44780Driver<'_> {
    fn init(&mut self, multiline: bool) -> GpioResult<()> {
        sleep(Duration::from_millis(50));
        // Synchronize, then switch to 4-bit mode
        self.send(0b00110011, false)?;
        sleep(Duration::from_millis(5));
        self.send(0b00110010, false)?;
        sleep(Duration::from_millis(5));

        self.function_set(multiline, false)?;
        self.set_display_control(true, false, false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.clear_display()?;
        sleep(Duration::from_millis(2));
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Everything written to the panel lines, in order.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    enum Line {
        E(bool),
        Rw(bool),
        Rs(bool),
        Data([bool; 4]),
    }

    #[derive(Debug)]
    struct RecordingLine {
        log: Rc<RefCell<Vec<Line>>>,
        line: fn(bool) -> Line,
    }

    impl GpioOutput for RecordingLine {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.log.borrow_mut().push((self.line)(value));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct DataBus {
        log: Rc<RefCell<Vec<Line>>>,
    }

    impl GpioBusOutput<4> for DataBus {
        fn write(&self, values: &[bool; 4]) -> GpioResult<()> {
            self.log.borrow_mut().push(Line::Data(*values));
            Ok(())
        }
    }

    fn nibble(value: u8) -> Line {
        Line::Data([0, 1, 2, 3].map(|bit| value & (1 << bit) != 0))
    }

    #[test]
    fn data_goes_out_high_nibble_first_with_rs_set() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let e = RecordingLine { log: log.clone(), line: Line::E };
        let rw = RecordingLine { log: log.clone(), line: Line::Rw };
        let rs = RecordingLine { log: log.clone(), line: Line::Rs };
        let bus = DataBus { log: log.clone() };
        let mut lcd = GpioHD44780Driver::new_4bit(&e, Some(&rw), &rs, &bus);

        lcd.send_data(b'M').unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Line::Rs(true),
                Line::Rw(false),
                nibble(0x4),
                Line::E(true),
                Line::E(false),
                nibble(0xD),
                Line::E(true),
                Line::E(false),
            ]
        );
    }

    #[test]
    fn commands_clear_rs() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let e = RecordingLine { log: log.clone(), line: Line::E };
        let rs = RecordingLine { log: log.clone(), line: Line::Rs };
        let bus = DataBus { log: log.clone() };
        let mut lcd = GpioHD44780Driver::new_4bit(&e, None, &rs, &bus);

        lcd.set_cursor(1, 0).unwrap();

        let log = log.borrow();
        assert_eq!(log[0], Line::Rs(false));
        assert_eq!(log[1], nibble(0xC));
        assert_eq!(log[4], nibble(0x0));
    }
}
