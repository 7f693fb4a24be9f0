//! Port traits: the hexagonal boundary between the brightness controller
//! and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BrightnessController (domain)
//! ```
//!
//! Driven adapters (sysfs files, timers, event sinks) implement these
//! traits. The [`BrightnessController`](super::controller::BrightnessController)
//! consumes them via generics, so the domain core never touches the
//! filesystem directly.

use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::io;

use crate::error::{Error, ReadFailure, Result};

// ───────────────────────────────────────────────────────────────
// Raw attribute port (driven adapter: sysfs files ↔ driver)
// ───────────────────────────────────────────────────────────────

/// The four device attributes of a sysfs PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Chip-level export control; allocates the channel.
    Export,
    /// Cycle length in device units.
    Period,
    /// Active portion of the cycle, `0..=period`.
    DutyCycle,
    /// `1` energises the output.
    Enable,
}

impl Attribute {
    /// File name of the attribute inside its sysfs directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Period => "period",
            Self::DutyCycle => "duty_cycle",
            Self::Enable => "enable",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Byte-oriented access to the attribute files.
///
/// Values are plain-text numbers. Implementations do no parsing and no
/// retrying; every call maps to exactly one file operation.
pub trait PwmAttributes {
    fn write(&mut self, attribute: Attribute, value: &str) -> io::Result<()>;

    fn read(&self, attribute: Attribute) -> io::Result<String>;
}

// ───────────────────────────────────────────────────────────────
// Light channel port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Hardware channel interface used by the controller.
pub trait LightChannel {
    /// Allocate, configure and energise the channel.
    ///
    /// An allocation failure is tolerated; period and enable failures
    /// are returned as [`Error::ChannelConfiguration`].
    fn enable(&mut self) -> Result<()>;

    /// Persist `period * percent / 100` (floor) as the duty cycle.
    ///
    /// Returns the raw duty value that was written.
    fn write_duty_cycle(&mut self, percent: u8) -> Result<u64>;

    fn read_period(&self) -> Result<u64>;

    fn read_duty_cycle(&self) -> Result<u64>;

    /// Current duty cycle as a percentage of the period. Not rounded.
    fn read_brightness_percent(&self) -> Result<f64> {
        let period = self.read_period()?;
        let duty = self.read_duty_cycle()?;
        if period == 0 {
            return Err(Error::read(Attribute::Period, ReadFailure::ZeroPeriod));
        }
        Ok(duty as f64 / period as f64 * 100.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Step delay port (driven adapter: domain → timer)
// ───────────────────────────────────────────────────────────────

/// Suspends a fade between two steps.
///
/// This is the only suspension point of a fade. Other callbacks run on
/// the same executor while the returned future is pending.
pub trait StepDelay {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`LightEvent`](super::events::LightEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LightEvent);
}
