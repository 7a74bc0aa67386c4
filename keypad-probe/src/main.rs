use matecash_gpio::gpiod::GpiodDriver;
use matecash_gpio::keypad::{EdgeOutcome, KeySource, RowScanner, DEBOUNCE_WINDOW, SCAN_PERIOD};
use matecash_gpio::{GpioActiveLevel, GpioBias, GpioDriver, GpioResult};
use dotenv::{dotenv, var};
use log::{debug, info, trace};
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::Instant;
use sysinfo::System;

fn parse_pin_bus(pin_str: &str) -> eyre::Result<[usize; 4]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Invalid number of pins, expected 4"))
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    let chip = var("MATECASH_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let row_pins = parse_pin_bus(&var("MATECASH_KEYPAD_PINS_ROWS").unwrap_or_else(|_| "2,3,4,5".into()))?;
    let col_pins = parse_pin_bus(&var("MATECASH_KEYPAD_PINS_COLS").unwrap_or_else(|_| "6,7,8,9".into()))?;
    info!("Keypad @ {}, Rows: {:?}, Cols: {:?}", chip, row_pins, col_pins);

    let source = Arc::new(KeySource::new(DEBOUNCE_WINDOW));
    debug!("{:?} initialized.", source);

    // Rows and columns are each driven from their own thread, each with its own driver.
    let scanner_thread = spawn({
        let (chip, source) = (chip.clone(), Arc::clone(&source));
        move || -> GpioResult<()> {
            let gpio = GpiodDriver::open(&chip)?;
            let mut bus = gpio.get_pin_bus(row_pins)?;
            bus.set_active_level(GpioActiveLevel::Low)?;
            let rows = bus.as_output()?;
            let scanner = RowScanner::new(&*rows, &source);
            scanner.start()?;
            loop {
                sleep(SCAN_PERIOD);
                scanner.tick()?;
            }
        }
    });

    let edge_thread = spawn({
        let (chip, source) = (chip.clone(), Arc::clone(&source));
        move || -> GpioResult<()> {
            let gpio = GpiodDriver::open(&chip)?;
            let mut bus = gpio.get_pin_bus(col_pins)?;
            bus.set_bias(GpioBias::PullUp)?;
            let mut edges = bus.as_falling_edges()?;
            loop {
                let column = edges.wait_falling_edge()?;
                match source.on_column_edge(column as u8, Instant::now()) {
                    EdgeOutcome::Accepted(_) => {}
                    outcome => trace!("Edge on column {}: {:?}", column, outcome),
                }
            }
        }
    });

    info!("Press keys, Ctrl+C to quit.");
    let mut previous: Option<Instant> = None;
    while !scanner_thread.is_finished() && !edge_thread.is_finished() {
        for event in source.keys() {
            match previous {
                Some(at) => info!("Key {} (+{:?})", event.key.to_char(), event.at - at),
                None => info!("Key {}", event.key.to_char()),
            }
            previous = Some(event.at);
        }
        sleep(SCAN_PERIOD);
    }

    let finished = if scanner_thread.is_finished() { scanner_thread } else { edge_thread };
    finished.join().map_err(|_| eyre::eyre!("Keypad thread panicked"))??;
    Ok(())
}
