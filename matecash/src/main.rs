mod accounts;
mod app;
mod config;
mod controller;
mod effects;
mod error;
mod hardware;
mod inventory;
mod lcd;
mod session;
mod sim;
mod terminal;
mod utils;

use std::env::var;
use std::path::PathBuf;
use std::time::Instant;
use dotenv::dotenv;
use log::{debug, info};
use crate::accounts::Directory;
use crate::config::Config;
use crate::controller::Controller;
use crate::hardware::{LcdWiring, Wiring};
use crate::inventory::Inventory;

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

/// The panel is optional: it's only used when `MATECASH_LCD_PIN_E` is set.
fn lcd_wiring() -> eyre::Result<Option<LcdWiring>> {
    let Ok(e) = var("MATECASH_LCD_PIN_E") else {
        return Ok(None);
    };
    Ok(Some(LcdWiring {
        e: e.parse()?,
        rw: var("MATECASH_LCD_PIN_RW").ok().map(|rw| rw.parse()).transpose()?,
        rs: var("MATECASH_LCD_PIN_RS")?.parse()?,
        data: parse_pin_bus(&var("MATECASH_LCD_PINS_DATA")?)?,
    }))
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|_| default.to_string())
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("MateCash v{} starting...", env!("CARGO_PKG_VERSION"));

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    debug!("{:?}", config);

    let directory = Directory::default();
    let inventory = Inventory::default();
    if directory.is_empty() {
        return Err(eyre::eyre!("No accounts configured"));
    }
    info!(
        "{} accounts, {} denominations loaded.",
        directory.len(),
        inventory.iter().count(),
    );
    let controller = Controller::new(directory, inventory, config.session_timer(), Instant::now());

    if var("MATECASH_SIMULATE").is_ok() {
        return sim::run(&config, controller);
    }

    let wiring = Wiring {
        chip: PathBuf::from(var_or("MATECASH_GPIO_CHIP", "/dev/gpiochip0")),
        rows: parse_pin_bus(&var_or("MATECASH_KEYPAD_PINS_ROWS", "2,3,4,5"))?,
        cols: parse_pin_bus(&var_or("MATECASH_KEYPAD_PINS_COLS", "6,7,8,9"))?,
        lcd: lcd_wiring()?,
    };
    info!(
        "Keypad @ {}, Rows: {:?}, Cols: {:?}",
        wiring.chip.display(),
        wiring.rows,
        wiring.cols,
    );
    match &wiring.lcd {
        Some(lcd) => info!(
            "LCD @ E: {}, RW: {:?}, RS: {}, Data: {:?}",
            lcd.e, lcd.rw, lcd.rs, lcd.data,
        ),
        None => info!("No LCD configured, drawing screens on the terminal."),
    }

    hardware::run(&config, controller, &wiring)
}
