use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "microbit_bridge".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// TCP port the block server listens on.
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    // BLE settings
    #[serde(default)]
    pub last_ble_address: Option<String>,
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,
    /// Optional accelerometer/magnetometer report interval in ms.
    /// The device accepts 1, 2, 5, 10, 20, 80, 160 and 640.
    #[serde(default)]
    pub sensor_period_ms: Option<u16>,

    // Serial settings
    #[serde(default = "default_serial_port")]
    pub serial_port: String,
    #[serde(default = "default_serial_baud")]
    pub serial_baud: u32,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_port: default_server_port(),
            last_ble_address: None,
            scan_timeout_secs: default_scan_timeout_secs(),
            sensor_period_ms: None,
            serial_port: default_serial_port(),
            serial_baud: default_serial_baud(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_server_port() -> u16 {
    12345
}
fn default_scan_timeout_secs() -> u64 {
    10
}
fn default_serial_port() -> String {
    if cfg!(windows) {
        "COM7".to_string()
    } else {
        "/dev/ttyACM0".to_string()
    }
}
fn default_serial_baud() -> u32 {
    115200
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("MicrobitBlockBridge");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Remember the address of the device we last connected to, so the
    /// next `ble` run can omit the argument.
    pub fn remember_address(&mut self, address: &str) -> anyhow::Result<()> {
        if self.settings.last_ble_address.as_deref() != Some(address) {
            self.settings.last_ble_address = Some(address.to_string());
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_and_serial_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server_port, 12345);
        assert_eq!(settings.serial_baud, 115200);
        if cfg!(windows) {
            assert_eq!(settings.serial_port, "COM7");
        } else {
            assert_eq!(settings.serial_port, "/dev/ttyACM0");
        }
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.server_port, 12345);
        assert!(settings.last_ble_address.is_none());
        assert_eq!(settings.log_settings.level, "info");
    }
}
