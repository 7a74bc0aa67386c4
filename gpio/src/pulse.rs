//! Fixed-length pulses on an output pin, used to energize the note dispenser actuators.

use std::thread::sleep;
use std::time::Duration;
use log::debug;
use crate::{GpioOutput, GpioResult};

/// An output that gets energized for [PulseOutput::width], then de-energized and left to rest for
/// [PulseOutput::cooldown]. [PulseOutput::fire] blocks for both.
#[derive(Debug)]
pub struct PulseOutput<'a> {
    output: &'a dyn GpioOutput,
    pub width: Duration,
    pub cooldown: Duration,
}

impl<'a> PulseOutput<'a> {
    pub fn new(output: &'a dyn GpioOutput) -> Self {
        Self {
            output,
            width: Duration::from_millis(60),
            cooldown: Duration::from_secs(5),
        }
    }

    pub fn with_width(mut self, width: Duration) -> Self {
        self.width = width;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn fire(&self) -> GpioResult<()> {
        debug!("Pulsing {:?} for {:?}.", self.output, self.width);
        self.output.write(true)?;
        sleep(self.width);
        self.output.write(false)?;
        sleep(self.cooldown);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct RecordingPin {
        writes: RefCell<Vec<bool>>,
    }

    impl GpioOutput for RecordingPin {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.writes.borrow_mut().push(value);
            Ok(())
        }
    }

    #[test]
    fn energizes_then_releases_the_pin() {
        let pin = RecordingPin::default();
        let pulse = PulseOutput::new(&pin)
            .with_width(Duration::ZERO)
            .with_cooldown(Duration::ZERO);

        pulse.fire().unwrap();
        pulse.fire().unwrap();

        assert_eq!(*pin.writes.borrow(), vec![true, false, true, false]);
    }
}
