//! Runs the kiosk without hardware. Keys typed on stdin are pressed on the same [KeySource] the
//! hardware uses, so debouncing and the pending slot behave exactly as they do on the keypad.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::{self, sleep};
use std::time::{Duration, Instant};
use log::{error, info, warn};
use matecash_gpio::keypad::{EdgeOutcome, KeySource, KeypadKey, SCAN_PERIOD};
use crate::app::App;
use crate::config::Config;
use crate::controller::Controller;
use crate::effects::LogDispenser;
use crate::terminal::ConsoleDisplay;

pub fn run(config: &Config, controller: Controller) -> eyre::Result<()> {
    let source = Arc::new(KeySource::new(config.debounce()));

    let feeder = thread::Builder::new().name("stdin-keys".to_string()).spawn({
        let source = Arc::clone(&source);
        move || feed_keys(io::stdin().lock(), &source)
    })?;

    let mut display = ConsoleDisplay::new(io::stdout());
    let mut dispenser = LogDispenser;
    let mut app = App::new(controller, &mut display, &mut dispenser);

    info!("Simulating the keypad, type keys (0-9, A-D, * and #) and press enter.");
    app.start(Instant::now())?;
    loop {
        let done = feeder.is_finished();
        app.update(&source, Instant::now())?;
        if done && !source.is_pending() {
            break;
        }
        sleep(config.poll_interval());
    }

    match feeder.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Reading stdin failed: {}", e),
        Err(_) => error!("The stdin thread panicked."),
    }
    info!("End of input, session left in {}.", app.controller().state().name());
    Ok(())
}

/// Presses every keypad character read from `input` on `source`, waiting for each key to be
/// consumed and for the debounce window to pass before pressing the next one.
fn feed_keys(input: impl BufRead, source: &KeySource) -> io::Result<()> {
    for line in input.lines() {
        for c in line?.chars().filter(|c| !c.is_whitespace()) {
            let Some(key) = KeypadKey::from_char(c) else {
                warn!("{:?} is not a keypad key.", c);
                continue;
            };

            while source.is_pending() {
                sleep(SCAN_PERIOD);
            }
            press(source, key);
            sleep(source.debounce_window() + SCAN_PERIOD);
        }
    }
    Ok(())
}

/// Scans until the key's row is driven, then fires its column edge.
fn press(source: &KeySource, key: KeypadKey) {
    let (row, column) = key.position();
    while source.current_row() != row {
        source.advance_row();
    }
    match source.on_column_edge(column, Instant::now()) {
        EdgeOutcome::Accepted(_) => {}
        outcome => warn!("Key {} was not accepted: {:?}", key.to_char(), outcome),
    }
}
