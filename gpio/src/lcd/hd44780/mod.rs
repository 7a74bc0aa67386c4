//! HD44780 character LCD, driven over a 4-bit parallel bus.
//!
//! The kiosk panel is a 20x4 module. Its rows aren't laid out contiguously in DDRAM, see
//! [driver::ROW_OFFSETS].

pub mod driver;
