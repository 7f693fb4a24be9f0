//! Sysfs PWM channel driver.
//!
//! Turns percentages into duty-cycle values and drives the attribute
//! files through a [`PwmAttributes`] backend.
//!
//! ## Setup sequence
//!
//! 1. `export`  ← export value (failure tolerated: already exported)
//! 2. `period`  ← period (fatal on failure)
//! 3. `duty_cycle` ← startup brightness (logged on failure)
//! 4. `enable`  ← `1` (fatal on failure)
//!
//! ## Dual-target design
//!
//! On a Raspberry Pi the backend is [`SysfsAttributes`](crate::adapters::sysfs::SysfsAttributes).
//! On host/test it is [`MemoryAttributes`](crate::adapters::memory::MemoryAttributes).

use log::{info, warn};

use crate::app::ports::{Attribute, LightChannel, PwmAttributes};
use crate::error::{Error, ReadFailure, Result};

/// Default duty-cycle denominator.
pub const DEFAULT_PERIOD: u64 = 50_000;

/// Value written to `export` to allocate the channel.
pub const DEFAULT_EXPORT_VALUE: &str = "1";

/// Brightness programmed once while enabling.
pub const DEFAULT_STARTUP_BRIGHTNESS: u8 = 100;

/// Duty value for `percent` of the period, floor division.
pub const fn duty_for(period: u64, percent: u8) -> u64 {
    let percent = if percent > 100 { 100 } else { percent };
    (period as u128 * percent as u128 / 100) as u64
}

pub struct PwmChannel<A> {
    attrs: A,
    period: u64,
    export_value: String,
    startup_brightness: u8,
}

impl<A: PwmAttributes> PwmChannel<A> {
    pub fn new(attrs: A, period: u64) -> Self {
        Self {
            attrs,
            period,
            export_value: DEFAULT_EXPORT_VALUE.to_owned(),
            startup_brightness: DEFAULT_STARTUP_BRIGHTNESS,
        }
    }

    #[must_use]
    pub fn with_export_value(mut self, value: impl Into<String>) -> Self {
        self.export_value = value.into();
        self
    }

    #[must_use]
    pub fn with_startup_brightness(mut self, percent: u8) -> Self {
        self.startup_brightness = percent.min(100);
        self
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn attributes(&self) -> &A {
        &self.attrs
    }

    pub fn attributes_mut(&mut self) -> &mut A {
        &mut self.attrs
    }

    fn configure(&mut self, attribute: Attribute, value: &str) -> Result<()> {
        self.attrs
            .write(attribute, value)
            .map_err(|source| Error::ChannelConfiguration { attribute, source })
    }

    fn read_number(&self, attribute: Attribute) -> Result<u64> {
        let raw = self
            .attrs
            .read(attribute)
            .map_err(|e| Error::read(attribute, e))?;
        let trimmed = raw.trim();
        trimmed
            .parse::<u64>()
            .map_err(|_| Error::read(attribute, ReadFailure::NotNumeric(trimmed.to_owned())))
    }
}

impl<A: PwmAttributes> LightChannel for PwmChannel<A> {
    fn enable(&mut self) -> Result<()> {
        if let Err(e) = self.attrs.write(Attribute::Export, &self.export_value) {
            let err = Error::ChannelAllocation(e);
            warn!("{}; assuming the channel is already exported", err);
        }

        let period = self.period.to_string();
        self.configure(Attribute::Period, &period)?;

        if let Err(e) = self.write_duty_cycle(self.startup_brightness) {
            warn!("Startup duty cycle not applied: {}", e);
        }

        self.configure(Attribute::Enable, "1")?;
        info!(
            "PWM channel configured: period={} startup={}%",
            self.period, self.startup_brightness
        );
        Ok(())
    }

    fn write_duty_cycle(&mut self, percent: u8) -> Result<u64> {
        let duty = duty_for(self.period, percent);
        self.attrs
            .write(Attribute::DutyCycle, &duty.to_string())
            .map_err(|source| Error::DeviceWrite { duty, source })?;
        Ok(duty)
    }

    fn read_period(&self) -> Result<u64> {
        self.read_number(Attribute::Period)
    }

    fn read_duty_cycle(&self) -> Result<u64> {
        self.read_number(Attribute::DutyCycle)
    }
}
