//! GPIO backend on top of the Linux GPIO character device, through the `gpiod` crate.
//!
//! The kernel timestamps and queues line edges for us, which is what the keypad column "interrupts"
//! are built on: a dedicated thread blocks in [GpioBusEdges::wait_falling_edge] and hands every edge
//! to the key source.
use crate::{
    GpioActiveLevel, GpioBias, GpioBus, GpioBusEdges, GpioBusOutput, GpioDriver, GpioError,
    GpioOutput, GpioPin, GpioResult,
};
use bitvec::vec::BitVec;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines of one chip.
///
/// Each driver keeps its own record of claimed lines. Threads that need their own lines (the row
/// scanner and the column watcher) open their own driver on the same chip.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_pins: bits,
        }
    }

    /// Opens the chip at `path`, e.g. `/dev/gpiochip0`.
    pub fn open(path: impl AsRef<Path>) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path.as_ref())?;
        Ok(Self::new(chip))
    }

    fn claim(&self, indices: &[usize]) -> GpioResult<()> {
        let n = self.count()?;

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

        if indices.iter().any(|&index| self.used_pins[index]) {
            return Err(GpioError::AlreadyInUse);
        }

        for &index in indices {
            self.used_pins.set_aliased(index, true);
        }
        Ok(())
    }

    fn release(&self, indices: &[usize]) {
        for &index in indices {
            self.used_pins.set_aliased(index, false);
        }
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        self.claim(&[index])?;

        Ok(Box::new(GpiodPin {
            driver: self,
            pin_index: index,
        }))
    }

    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>> {
        self.claim(&indices)?;

        Ok(Box::new(GpiodBus {
            driver: self,
            pin_indices: indices,
            active_level: GpioActiveLevel::High,
            bias: GpioBias::None,
        }))
    }
}

impl From<GpioActiveLevel> for gpiod::Active {
    fn from(level: GpioActiveLevel) -> Self {
        match level {
            GpioActiveLevel::High => gpiod::Active::High,
            GpioActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

impl From<GpioBias> for gpiod::Bias {
    fn from(bias: GpioBias) -> Self {
        match bias {
            GpioBias::None => gpiod::Bias::Disable,
            GpioBias::PullUp => gpiod::Bias::PullUp,
            GpioBias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

struct GpiodPin<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
}

impl Debug for GpiodPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for GpiodPin<'_> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        let line = self.driver.chip.request_lines(
            gpiod::Options::output([self.pin_index as u32])
                .consumer(env!("CARGO_PKG_NAME")),
        )?;
        let output = GpiodOutput { pin: self, line };
        Ok(Box::new(output))
    }
}

impl Drop for GpiodPin<'_> {
    fn drop(&mut self) {
        self.driver.release(&[self.pin_index]);
    }
}

struct GpiodOutput<'a> {
    pin: &'a GpiodPin<'a>,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.pin.driver, self.pin.pin_index)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.line.set_values([value])?;
        Ok(())
    }
}

struct GpiodBus<'a, const N: usize> {
    driver: &'a GpiodDriver,
    pin_indices: [usize; N],
    active_level: GpioActiveLevel,
    bias: GpioBias,
}

impl<const N: usize> GpiodBus<'_, N> {
    fn offsets(&self) -> Vec<u32> {
        self.pin_indices.iter().map(|&index| index as u32).collect()
    }
}

impl<const N: usize> Debug for GpiodBus<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}", self.driver, self.pin_indices)
    }
}

impl<const N: usize> GpioBus<N> for GpiodBus<'_, N> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        let line = self.driver.chip.request_lines(
            gpiod::Options::output(self.offsets())
                .consumer(env!("CARGO_PKG_NAME"))
                .active(self.active_level.into())
                .bias(self.bias.into()),
        )?;
        let output = GpiodBusOutput { bus: self, line };
        Ok(Box::new(output))
    }

    fn as_falling_edges(&mut self) -> GpioResult<Box<dyn GpioBusEdges<N> + '_>> {
        // Edges are reported on the physical level, so the active level is left alone here.
        let line = self.driver.chip.request_lines(
            gpiod::Options::input(self.offsets())
                .consumer(env!("CARGO_PKG_NAME"))
                .bias(self.bias.into())
                .edge(gpiod::EdgeDetect::Falling),
        )?;
        let edges = GpiodBusEdges { bus: self, line };
        Ok(Box::new(edges))
    }

    fn set_active_level(&mut self, level: GpioActiveLevel) -> GpioResult<()> {
        self.active_level = level;
        Ok(())
    }

    fn set_bias(&mut self, bias: GpioBias) -> GpioResult<()> {
        self.bias = bias;
        Ok(())
    }
}

impl<const N: usize> Drop for GpiodBus<'_, N> {
    fn drop(&mut self) {
        self.driver.release(&self.pin_indices);
    }
}

struct GpiodBusOutput<'a, const N: usize> {
    bus: &'a GpiodBus<'a, N>,
    line: gpiod::Lines<gpiod::Output>,
}

impl<const N: usize> Debug for GpiodBusOutput<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}[output]", self.bus.driver, self.bus.pin_indices)
    }
}

impl<const N: usize> GpioBusOutput<N> for GpiodBusOutput<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        self.line.set_values(*values)?;
        Ok(())
    }
}

struct GpiodBusEdges<'a, const N: usize> {
    bus: &'a GpiodBus<'a, N>,
    line: gpiod::Lines<gpiod::Input>,
}

impl<const N: usize> Debug for GpiodBusEdges<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}[edges]", self.bus.driver, self.bus.pin_indices)
    }
}

impl<const N: usize> GpiodBusEdges<'_, N> {
    /// Maps the line reported by an event to its position in the bus. The event carries either
    /// the chip offset or the index within the request, depending on the kernel ABI in use.
    fn position_of(&self, line: usize) -> Option<usize> {
        self.bus
            .pin_indices
            .iter()
            .position(|&index| index == line)
            .or_else(|| (line < N).then_some(line))
    }
}

impl<const N: usize> GpioBusEdges<N> for GpiodBusEdges<'_, N> {
    fn wait_falling_edge(&mut self) -> GpioResult<usize> {
        loop {
            let event = self.line.read_event()?;
            if !matches!(event.edge, gpiod::Edge::Falling) {
                continue;
            }

            match self.position_of(event.line as usize) {
                Some(position) => return Ok(position),
                None => trace!("Edge on unexpected line {} ignored.", event.line),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_missing_chip_fails() {
        let result = GpiodDriver::open("/dev/gpiochip-matecash-missing");
        assert!(matches!(result, Err(GpioError::Io(_))));
    }
}
