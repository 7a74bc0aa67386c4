use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use dotenv::var;
use serde::{Serialize, Deserialize};
use crate::session::SessionTimer;

/// Runtime tunables, loaded from the JSON file named by `CONFIG_FILE`. Missing fields take their
/// defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub debounce_ms: u64,
    pub scan_period_ms: u64,
    pub input_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub dispense_pulse_ms: u64,
    pub dispense_cooldown_ms: u64,
    /// Also time identifier entry and password change, not only password entry.
    pub timeout_all_input_stages: bool,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dispense_pulse(&self) -> Duration {
        Duration::from_millis(self.dispense_pulse_ms)
    }

    pub fn dispense_cooldown(&self) -> Duration {
        Duration::from_millis(self.dispense_cooldown_ms)
    }

    pub fn session_timer(&self) -> SessionTimer {
        SessionTimer::new(
            Duration::from_secs(self.input_timeout_secs),
            self.timeout_all_input_stages,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debounce_ms: 200,
            scan_period_ms: 5,
            input_timeout_secs: 20,
            poll_interval_ms: 50,
            dispense_pulse_ms: 60,
            dispense_cooldown_ms: 5000,
            timeout_all_input_stages: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "debounce_ms": 150 }"#).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert_eq!(config.scan_period(), Duration::from_millis(5));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert!(!config.timeout_all_input_stages);
    }

    #[test]
    fn defaults_match_the_firmware_constants() {
        let config = Config::default();
        let timer = config.session_timer();
        assert_eq!(timer.timeout, Duration::from_secs(20));
        assert!(!timer.all_input_stages);
        assert_eq!(config.dispense_pulse(), Duration::from_millis(60));
        assert_eq!(config.dispense_cooldown(), Duration::from_secs(5));
    }

    #[test]
    fn survives_a_json_round_trip() {
        let config = Config {
            timeout_all_input_stages: true,
            input_timeout_secs: 30,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
