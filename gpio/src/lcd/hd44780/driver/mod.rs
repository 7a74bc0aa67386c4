mod gpio;

use crate::{GpioError, GpioResult};
pub use gpio::*;
use std::fmt::Debug;

/// Rows of the panel.
pub const LCD_ROWS: usize = 4;
/// Columns of the panel.
pub const LCD_COLUMNS: usize = 20;

/// DDRAM address of the first cell of each row. Row 2 continues row 0 and row 3 continues row 1.
pub const ROW_OFFSETS: [u8; LCD_ROWS] = [0x00, 0x40, 0x14, 0x54];

pub trait HD44780Driver: Debug {
    /// Initializes the controller: 4-bit mode, display on, cursor off, cursor moving right,
    /// cleared screen.
    fn init(&mut self, multiline: bool) -> GpioResult<()>;

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(0b00000001)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the function set. The bus is always 4 bits wide.
    fn function_set(&mut self, two_lines: bool, font: bool) -> GpioResult<()> {
        let mut command = 0b00100000;
        if two_lines {
            command |= 0b00001000;
        }
        if font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b10000000 | address;
        self.send_command(command)
    }

    /// Moves the cursor to `row`, `col` of the 20x4 panel.
    fn set_cursor(&mut self, row: usize, col: usize) -> GpioResult<()> {
        if row >= LCD_ROWS || col >= LCD_COLUMNS {
            return Err(GpioError::InvalidArgument);
        }
        self.set_ddram_address(ROW_OFFSETS[row] + col as u8)
    }

    // Low-level commands, implemented by the bus driver.

    /// Sends a command to the HD44780 controller.
    /// Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends data to the HD44780 controller.
    /// Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8) -> GpioResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}
