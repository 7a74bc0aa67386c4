//! Runs the kiosk on real GPIO lines: a row-scan thread, a column-edge thread and the poll loop.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, sleep, JoinHandle};
use std::time::{Duration, Instant};
use eyre::eyre;
use log::{debug, error, info};
use matecash_gpio::gpiod::GpiodDriver;
use matecash_gpio::keypad::{EdgeOutcome, KeySource, RowScanner};
use matecash_gpio::lcd::hd44780::driver::{GpioHD44780Driver, HD44780Driver};
use matecash_gpio::pulse::PulseOutput;
use matecash_gpio::{GpioActiveLevel, GpioBias, GpioDriver, GpioResult};
use crate::app::App;
use crate::config::Config;
use crate::controller::Controller;
use crate::effects::GpioDispenser;
use crate::lcd::LcdDisplay;
use crate::terminal::ConsoleDisplay;

/// Where the keypad and the panel are wired.
#[derive(Clone, Debug)]
pub struct Wiring {
    pub chip: PathBuf,
    pub rows: [usize; 4],
    pub cols: [usize; 4],
    /// Without a panel, screens are drawn on the terminal.
    pub lcd: Option<LcdWiring>,
}

/// HD44780 lines: E, RS, optionally RW, and D4..D7.
#[derive(Clone, Debug)]
pub struct LcdWiring {
    pub e: usize,
    pub rw: Option<usize>,
    pub rs: usize,
    pub data: [usize; 4],
}

pub fn run(config: &Config, controller: Controller, wiring: &Wiring) -> eyre::Result<()> {
    let source = Arc::new(KeySource::new(config.debounce()));

    let scanner = spawn("row-scan", {
        let (chip, rows, period) = (wiring.chip.clone(), wiring.rows, config.scan_period());
        let source = Arc::clone(&source);
        move || scan_rows(&chip, rows, period, &source)
    })?;
    let watcher = spawn("column-edges", {
        let (chip, cols) = (wiring.chip.clone(), wiring.cols);
        let source = Arc::clone(&source);
        move || watch_columns(&chip, cols, &source)
    })?;

    debug!("Initializing dispensers...");
    let gpio = GpiodDriver::open(&wiring.chip)?;
    let dispense_pins = controller.inventory().pins();
    let mut pins = dispense_pins
        .iter()
        .map(|&pin| gpio.get_pin(pin as usize))
        .collect::<GpioResult<Vec<_>>>()?;
    let outputs = pins
        .iter_mut()
        .map(|pin| pin.as_output())
        .collect::<GpioResult<Vec<_>>>()?;
    let pulses = dispense_pins
        .iter()
        .zip(&outputs)
        .map(|(&pin, output)| {
            let pulse = PulseOutput::new(&**output)
                .with_width(config.dispense_pulse())
                .with_cooldown(config.dispense_cooldown());
            (pin, pulse)
        })
        .collect::<HashMap<_, _>>();
    let mut dispenser = GpioDispenser::new(pulses);
    debug!("{:?} initialized.", dispenser);

    let Some(lcd_wiring) = &wiring.lcd else {
        let mut display = ConsoleDisplay::new(std::io::stdout());
        let app = App::new(controller, &mut display, &mut dispenser);
        return poll(app, config, &source, [&scanner, &watcher]);
    };

    debug!("Initializing LCD driver...");
    let mut e_pin = gpio.get_pin(lcd_wiring.e)?;
    let e_out = e_pin.as_output()?;
    let mut rw_pin = lcd_wiring.rw.map(|pin| gpio.get_pin(pin)).transpose()?;
    let rw_out = rw_pin.as_mut().map(|pin| pin.as_output()).transpose()?;
    let mut rs_pin = gpio.get_pin(lcd_wiring.rs)?;
    let rs_out = rs_pin.as_output()?;
    let mut data_bus = gpio.get_pin_bus(lcd_wiring.data)?;
    let data_out = data_bus.as_output()?;

    let mut lcd = GpioHD44780Driver::new_4bit(&*e_out, rw_out.as_deref(), &*rs_out, &*data_out);
    lcd.init(true)?;
    debug!("{:?} initialized.", lcd);

    let mut display = LcdDisplay::new(&mut lcd);
    let app = App::new(controller, &mut display, &mut dispenser);
    poll(app, config, &source, [&scanner, &watcher])
}

/// The poll loop. Only returns on error, including a keypad thread that stopped.
fn poll(
    mut app: App,
    config: &Config,
    source: &KeySource,
    keypad_threads: [&JoinHandle<()>; 2],
) -> eyre::Result<()> {
    info!("Starting main loop...");
    app.start(Instant::now())?;
    loop {
        if keypad_threads.iter().any(|thread| thread.is_finished()) {
            return Err(eyre!("Keypad thread stopped, see the log above."));
        }

        app.update(source, Instant::now())?;
        sleep(config.poll_interval());
    }
}

fn spawn(
    name: &str,
    task: impl FnOnce() -> GpioResult<()> + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    let thread_name = name.to_string();
    thread::Builder::new().name(thread_name.clone()).spawn(move || {
        if let Err(e) = task() {
            error!("The {} thread failed: {}", thread_name, e);
        }
    })
}

/// The row-scan timer.
fn scan_rows(chip: &Path, pins: [usize; 4], period: Duration, source: &KeySource) -> GpioResult<()> {
    let gpio = GpiodDriver::open(chip)?;
    let mut bus = gpio.get_pin_bus(pins)?;
    bus.set_active_level(GpioActiveLevel::Low)?;
    let rows = bus.as_output()?;

    let scanner = RowScanner::new(&*rows, source);
    debug!("{:?} initialized.", scanner);
    scanner.start()?;
    loop {
        sleep(period);
        scanner.tick()?;
    }
}

/// The column "interrupt": blocks on edge events and hands each one to the key source.
fn watch_columns(chip: &Path, pins: [usize; 4], source: &KeySource) -> GpioResult<()> {
    let gpio = GpiodDriver::open(chip)?;
    let mut bus = gpio.get_pin_bus(pins)?;
    bus.set_bias(GpioBias::PullUp)?;
    let mut edges = bus.as_falling_edges()?;
    debug!("{:?} initialized.", edges);

    loop {
        let column = edges.wait_falling_edge()?;
        if let EdgeOutcome::Accepted(key) = source.on_column_edge(column as u8, Instant::now()) {
            debug!("Key {} accepted.", key.to_char());
        }
    }
}
