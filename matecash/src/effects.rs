//! Side effects emitted by the state machine, and the collaborators that carry them out.
//!
//! Transitions never touch hardware. They push [Effect]s into an [Effects] buffer, and the run loop
//! hands the buffer to [apply] together with a [Display] and a [Dispenser].

use std::collections::HashMap;
use std::fmt::Debug;
use log::{debug, info, warn};
use matecash_gpio::{GpioError, GpioResult};
use matecash_gpio::pulse::PulseOutput;
use crate::error::TransactionError;
use crate::utils::pad_line;

/// Rows of the character display.
pub const DISPLAY_ROWS: usize = 4;
/// Columns of the character display.
pub const DISPLAY_COLS: usize = 20;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Write `text` at the given cell of the display.
    Display { text: String, row: u8, col: u8 },
    /// Pulse the dispenser actuator on `pin`.
    Dispense { pin: u8 },
    /// A transaction error that was handled. Reported for the transcript.
    Fault(TransactionError),
}

/// Effects emitted by one transition, in order.
#[derive(Debug, Default)]
pub struct Effects {
    effects: Vec<Effect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a whole display row.
    pub fn line(&mut self, row: u8, text: &str) {
        self.effects.push(Effect::Display {
            text: pad_line(text),
            row,
            col: 0,
        });
    }

    /// Replaces the whole display.
    pub fn screen(&mut self, lines: [&str; DISPLAY_ROWS]) {
        for (row, text) in lines.into_iter().enumerate() {
            self.line(row as u8, text);
        }
    }

    pub fn dispense(&mut self, pin: u8) {
        self.effects.push(Effect::Dispense { pin });
    }

    pub fn fault(&mut self, error: TransactionError) {
        warn!("{}", error);
        self.effects.push(Effect::Fault(error));
    }

    pub fn into_vec(self) -> Vec<Effect> {
        self.effects
    }
}

/// The character display collaborator.
pub trait Display: Debug {
    /// Writes ASCII `text` starting at `row`, `col` of the 20x4 grid.
    fn display(&mut self, text: &str, row: u8, col: u8) -> GpioResult<()>;

    /// Called once all writes of a transition are done.
    fn flush(&mut self) -> GpioResult<()> {
        Ok(())
    }
}

/// The note dispenser collaborator.
pub trait Dispenser: Debug {
    /// Energizes the actuator on `pin` for its pulse, blocking until done.
    fn dispense(&mut self, pin: u8) -> GpioResult<()>;
}

/// Carries out `effects` in order.
pub fn apply(
    effects: Vec<Effect>,
    display: &mut dyn Display,
    dispenser: &mut dyn Dispenser,
) -> GpioResult<()> {
    if effects.is_empty() {
        return Ok(());
    }

    for effect in effects {
        match effect {
            Effect::Display { text, row, col } => display.display(&text, row, col)?,
            Effect::Dispense { pin } => dispenser.dispense(pin)?,
            Effect::Fault(error) => debug!("Fault shown: {}", error),
        }
    }
    display.flush()
}

/// Dispenser that only logs, for running without actuators.
#[derive(Debug, Default)]
pub struct LogDispenser;

impl Dispenser for LogDispenser {
    fn dispense(&mut self, pin: u8) -> GpioResult<()> {
        info!("Dispensing a note from pin {}.", pin);
        Ok(())
    }
}

/// Dispenser backed by one [PulseOutput] per denomination pin.
#[derive(Debug)]
pub struct GpioDispenser<'a> {
    outputs: HashMap<u8, PulseOutput<'a>>,
}

impl<'a> GpioDispenser<'a> {
    pub fn new(outputs: HashMap<u8, PulseOutput<'a>>) -> Self {
        GpioDispenser { outputs }
    }
}

impl Dispenser for GpioDispenser<'_> {
    fn dispense(&mut self, pin: u8) -> GpioResult<()> {
        let output = self.outputs.get(&pin).ok_or(GpioError::InvalidArgument)?;
        info!("Dispensing a note from pin {}.", pin);
        output.fire()
    }
}
