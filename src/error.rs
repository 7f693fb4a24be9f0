//! Unified error types for the PWM light daemon.
//!
//! A single [`Error`] enum that every subsystem converts into. Which
//! variants are recoverable is decided by the caller:
//!
//! | Variant                | Raised by                 | Handling              |
//! |------------------------|---------------------------|-----------------------|
//! | `ChannelAllocation`    | export write              | logged, ignored       |
//! | `ChannelConfiguration` | period / enable write     | fatal at startup      |
//! | `DeviceWrite`          | duty-cycle write          | logged, loop goes on  |
//! | `DeviceRead`           | period / duty-cycle read  | fails the one query   |
//! | `Config`               | configuration loading     | fatal at startup      |
//! | `Encode`               | status serialization      | fails the one query   |

use std::io;

use crate::app::ports::Attribute;
use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The export write failed; usually the channel is already exported.
    #[error("channel allocation failed: {0}")]
    ChannelAllocation(#[source] io::Error),

    /// Programming the period or enabling the channel failed.
    #[error("channel configuration failed writing {attribute}: {source}")]
    ChannelConfiguration {
        attribute: Attribute,
        #[source]
        source: io::Error,
    },

    /// A duty-cycle write failed.
    #[error("duty cycle write of {duty} failed: {source}")]
    DeviceWrite {
        duty: u64,
        #[source]
        source: io::Error,
    },

    /// An attribute could not be read or did not hold a usable number.
    #[error("{attribute} read failed: {reason}")]
    DeviceRead {
        attribute: Attribute,
        reason: ReadFailure,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("status encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Read failures
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReadFailure {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("not a number: {0:?}")]
    NotNumeric(String),

    /// Brightness is undefined for a zero period.
    #[error("period is zero")]
    ZeroPeriod,
}

impl Error {
    pub(crate) fn read(attribute: Attribute, reason: impl Into<ReadFailure>) -> Self {
        Self::DeviceRead {
            attribute,
            reason: reason.into(),
        }
    }

    /// Whether the daemon can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ChannelAllocation(_) | Self::DeviceWrite { .. } | Self::DeviceRead { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
