//! The module for the main app state and logic.

use std::time::Instant;
use log::debug;
use matecash_gpio::GpioResult;
use matecash_gpio::keypad::KeySource;
use crate::controller::Controller;
use crate::effects::{apply, Display, Dispenser};

/// The kiosk: the transaction controller wired to its display and dispenser.
#[derive(Debug)]
pub struct App<'a> {
    controller: Controller,
    /// Where the screens go.
    display: &'a mut dyn Display,
    /// The note dispenser actuators.
    dispenser: &'a mut dyn Dispenser,
}

impl<'a> App<'a> {
    pub fn new(
        controller: Controller,
        display: &'a mut dyn Display,
        dispenser: &'a mut dyn Dispenser,
    ) -> App<'a> {
        App { controller, display, dispenser }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Draws the welcome screen.
    pub fn start(&mut self, now: Instant) -> GpioResult<()> {
        let effects = self.controller.start(now);
        apply(effects, &mut *self.display, &mut *self.dispenser)
    }

    /// One poll cycle: feeds every pending key to the controller, then checks the stage deadline.
    /// Keys are judged at the instant they were accepted, not when the loop got to them.
    pub fn update(&mut self, keys: &KeySource, now: Instant) -> GpioResult<()> {
        for event in keys.keys() {
            debug!("Key {} pressed.", event.key.to_char());
            let effects = self.controller.handle_key(event.key, event.at);
            apply(effects, &mut *self.display, &mut *self.dispenser)?;
        }

        let effects = self.controller.poll(now);
        apply(effects, &mut *self.display, &mut *self.dispenser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Directory;
    use crate::inventory::Inventory;
    use crate::session::{SessionTimer, State};
    use crate::terminal::ConsoleDisplay;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct RecordingDispenser {
        pins: Vec<u8>,
    }

    impl Dispenser for RecordingDispenser {
        fn dispense(&mut self, pin: u8) -> GpioResult<()> {
            self.pins.push(pin);
            Ok(())
        }
    }

    /// Presses `keys` on `source`, one update per key, the way the simulator does.
    fn type_keys(app: &mut App, source: &KeySource, keys: &str, now: &mut Instant) {
        for c in keys.chars() {
            *now += Duration::from_millis(250);
            let (row, col) = matecash_gpio::keypad::KeypadKey::from_char(c).unwrap().position();
            while source.current_row() != row {
                source.advance_row();
            }
            source.on_column_edge(col, *now);
            app.update(source, *now).unwrap();
        }
    }

    #[test]
    fn keys_flow_from_the_source_to_the_screen() {
        let start = Instant::now();
        let source = KeySource::with_epoch(start, Duration::from_millis(200));
        let controller = Controller::new(
            Directory::default(),
            Inventory::default(),
            SessionTimer::default(),
            start,
        );
        let mut display = ConsoleDisplay::new(Vec::new());
        let mut dispenser = RecordingDispenser::default();
        let mut app = App::new(controller, &mut display, &mut dispenser);
        app.start(start).unwrap();

        let mut now = start;
        type_keys(&mut app, &source, "1234561234AA", &mut now);

        assert_eq!(app.controller().state(), &State::CheckBalance);
        drop(app);
        assert_eq!(dispenser.pins, vec![16]);
        assert_eq!(display.row(0), Some("Your balance is:    "));
        assert_eq!(display.row(1), Some("$ 210.000           "));
    }

    #[test]
    fn update_without_keys_still_times_out() {
        let start = Instant::now();
        let source = KeySource::with_epoch(start, Duration::from_millis(200));
        let controller = Controller::new(
            Directory::default(),
            Inventory::default(),
            SessionTimer::default(),
            start,
        );
        let mut display = ConsoleDisplay::new(Vec::new());
        let mut dispenser = RecordingDispenser::default();
        let mut app = App::new(controller, &mut display, &mut dispenser);
        app.start(start).unwrap();

        let mut now = start;
        type_keys(&mut app, &source, "123456", &mut now);
        assert_eq!(app.controller().state(), &State::EnterPassword);

        app.update(&source, now + Duration::from_secs(21)).unwrap();
        assert_eq!(app.controller().state(), &State::EnterId);
        drop(app);
        assert_eq!(display.row(1), Some("Time exceeded       "));
    }

    #[test]
    fn key_accepted_before_the_deadline_counts_even_if_polled_late() {
        let start = Instant::now();
        let source = KeySource::with_epoch(start, Duration::from_millis(200));
        let controller = Controller::new(
            Directory::default(),
            Inventory::default(),
            SessionTimer::default(),
            start,
        );
        let mut display = ConsoleDisplay::new(Vec::new());
        let mut dispenser = RecordingDispenser::default();
        let mut app = App::new(controller, &mut display, &mut dispenser);
        app.start(start).unwrap();

        let mut now = start;
        type_keys(&mut app, &source, "123456", &mut now);
        let stage = now;
        type_keys(&mut app, &source, "123", &mut now);

        // The last digit lands 10 ms before the deadline, the loop only sees it 40 ms after.
        let (row, col) = matecash_gpio::keypad::KeypadKey::Key4.position();
        while source.current_row() != row {
            source.advance_row();
        }
        source.on_column_edge(col, stage + Duration::from_millis(19_990));
        app.update(&source, stage + Duration::from_millis(20_040)).unwrap();

        assert_eq!(app.controller().state(), &State::LoggedIn);
    }
}
