//! System configuration parameters
//!
//! All tunable parameters for the PWM light daemon, with defaults for a
//! Raspberry Pi with a dimmer on pwmchip0. Values come from an optional TOML
//! file, then `PWMLIGHT_*` environment overrides, then validation.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::controller::FadeConfig;
use crate::drivers::pwm::{DEFAULT_EXPORT_VALUE, DEFAULT_PERIOD, DEFAULT_STARTUP_BRIGHTNESS};

/// Environment variable overriding `channel.chip`.
pub const ENV_CHIP: &str = "PWMLIGHT_CHIP";

/// Environment variable overriding `accessory.bind`.
pub const ENV_BIND: &str = "PWMLIGHT_BIND";

// ───────────────────────────────────────────────────────────────
// Sections
// ───────────────────────────────────────────────────────────────

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub channel: ChannelConfig,
    pub fade: FadeSettings,
    pub accessory: AccessoryConfig,
}

/// Which PWM output to drive and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// PWM chip directory, e.g. `/sys/class/pwm/pwmchip0`
    pub chip: PathBuf,
    /// Channel number; attributes live in `<chip>/pwm<index>`
    pub index: u32,
    /// String written to `<chip>/export`
    pub export_value: String,
    /// Duty-cycle denominator in device units
    pub period: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            index: 0,
            export_value: DEFAULT_EXPORT_VALUE.to_owned(),
            period: DEFAULT_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSettings {
    /// Wait after each one-percent step (milliseconds)
    pub step_delay_ms: u64,
    /// Turning off fades to this brightness (0-100%)
    pub min_active_brightness: u8,
    /// Brightness programmed while enabling the channel (0-100%)
    pub startup_brightness: u8,
    /// Target before the first command (0-100%)
    pub initial_target: u8,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: 10,
            min_active_brightness: 10,
            startup_brightness: DEFAULT_STARTUP_BRIGHTNESS,
            initial_target: 100,
        }
    }
}

/// Accessory identity and the local control bridge endpoint.
///
/// Identity fields are published by the accessory framework; the
/// daemon only logs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryConfig {
    pub name: String,
    pub service_name: String,
    /// Setup username, MAC-address shaped
    pub username: String,
    /// Setup code, `DDD-DD-DDD`
    pub pincode: String,
    pub port: u16,
    pub category: String,
    /// Listen address of the line-protocol bridge
    pub bind: SocketAddr,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: "Raspberry Pi".to_owned(),
            service_name: "PWM0 Light".to_owned(),
            username: "17:51:07:F4:BC:0F".to_owned(),
            pincode: "678-90-842".to_owned(),
            port: 47128,
            category: "lightbulb".to_owned(),
            bind: SocketAddr::from(([127, 0, 0, 1], 47128)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("{var}={value:?} is not valid")]
    Env { var: &'static str, value: String },

    /// A field failed range validation. The message names the field.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),
}

// ───────────────────────────────────────────────────────────────
// Loading
// ───────────────────────────────────────────────────────────────

impl SystemConfig {
    /// Load from `path` (defaults when `None`), apply environment
    /// overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `PWMLIGHT_*` overrides using `lookup` to read variables.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(chip) = lookup(ENV_CHIP) {
            self.channel.chip = PathBuf::from(chip);
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.accessory.bind = bind.parse().map_err(|_| ConfigError::Env {
                var: ENV_BIND,
                value: bind,
            })?;
        }
        Ok(())
    }

    /// Reject values that would make the light uncontrollable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg| Err(ConfigError::ValidationFailed(msg));

        if self.channel.period == 0 {
            return fail("channel.period must be positive");
        }
        if self.channel.export_value.trim().is_empty() {
            return fail("channel.export_value must not be empty");
        }
        if self.fade.step_delay_ms == 0 {
            return fail("fade.step_delay_ms must be positive");
        }
        if self.fade.min_active_brightness > 100 {
            return fail("fade.min_active_brightness must be 0-100");
        }
        if self.fade.startup_brightness > 100 {
            return fail("fade.startup_brightness must be 0-100");
        }
        if self.fade.initial_target > 100 {
            return fail("fade.initial_target must be 0-100");
        }
        if self.accessory.name.trim().is_empty() {
            return fail("accessory.name must not be empty");
        }
        if !is_pincode(&self.accessory.pincode) {
            return fail("accessory.pincode must look like 123-45-678");
        }
        if !is_mac_like(&self.accessory.username) {
            return fail("accessory.username must look like AA:BB:CC:DD:EE:FF");
        }
        Ok(())
    }

    pub fn fade_config(&self) -> FadeConfig {
        FadeConfig {
            step_delay: Duration::from_millis(self.fade.step_delay_ms),
            min_active_brightness: self.fade.min_active_brightness,
            initial_target: self.fade.initial_target,
        }
    }
}

fn is_pincode(code: &str) -> bool {
    let groups: Vec<&str> = code.split('-').collect();
    groups.len() == 3
        && groups
            .iter()
            .zip([3, 2, 3])
            .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_digit()))
}

fn is_mac_like(username: &str) -> bool {
    let octets: Vec<&str> = username.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.bytes().all(|b| b.is_ascii_hexdigit()))
}
