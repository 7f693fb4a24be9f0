//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to
//! the `log` facade (`env_logger` on the daemon). A future telemetry
//! adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::LightEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`LightEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LightEvent) {
        match event {
            LightEvent::ChannelEnabled { period } => {
                info!("START | channel enabled, period={}", period);
            }
            LightEvent::FadeStarted {
                generation,
                start,
                target,
            } => {
                info!("FADE  | #{} {}% -> {}%", generation, start, target);
            }
            LightEvent::FadeCompleted {
                generation,
                target,
                steps,
            } => {
                debug!("FADE  | #{} done at {}% ({} steps)", generation, target, steps);
            }
            LightEvent::FadeSuperseded {
                generation,
                written,
            } => {
                debug!("FADE  | #{} superseded after {} steps", generation, written);
            }
            LightEvent::WriteFailed { percent, reason } => {
                warn!("FAULT | step {}% not written: {}", percent, reason);
            }
        }
    }
}
