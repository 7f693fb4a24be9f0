//! Lightbulb accessory with "On" and "Brightness" characteristics.
//!
//! Maps characteristic reads and writes onto the controller. A write
//! parks its fade in a one-slot mailbox and returns at once;
//! [`LightAccessory::drive_fades`] runs whatever is parked. Parking a
//! fade over one that never started retires the older one, so a burst
//! of writes costs a single fade.

use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use log::{info, trace, warn};
use serde::Serialize;

use super::protocol::{Characteristic, Request, Response};
use crate::app::commands::LightCommand;
use crate::app::controller::{BrightnessController, FadeStats};
use crate::app::fade::Fade;
use crate::app::ports::{EventSink, LightChannel, StepDelay};
use crate::config::AccessoryConfig;
use crate::error::Result;

/// Snapshot returned by the `STATUS` request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightStatus {
    pub on: bool,
    pub brightness: u8,
    pub target: u8,
    pub generation: u64,
    pub stats: FadeStats,
}

pub struct LightAccessory<C, D, S> {
    controller: Rc<BrightnessController<C, D, S>>,
    /// Latest fade not yet picked up by the driver.
    pending: Signal<NoopRawMutex, Fade<C, D, S>>,
    info: AccessoryConfig,
}

impl<C, D, S> LightAccessory<C, D, S>
where
    C: LightChannel + 'static,
    D: StepDelay + 'static,
    S: EventSink + 'static,
{
    pub fn new(controller: Rc<BrightnessController<C, D, S>>, info: AccessoryConfig) -> Self {
        Self {
            controller,
            pending: Signal::new(),
            info,
        }
    }

    pub fn info(&self) -> &AccessoryConfig {
        &self.info
    }

    pub fn controller(&self) -> &Rc<BrightnessController<C, D, S>> {
        &self.controller
    }

    /// Log the identity the accessory framework advertises.
    pub fn publish(&self) {
        info!(
            "Publishing accessory '{}' ({}) as {} on port {}",
            self.info.name, self.info.service_name, self.info.username, self.info.port
        );
        info!("  category={} pincode={}", self.info.category, self.info.pincode);
    }

    // ── Characteristics ───────────────────────────────────────

    pub fn get_on(&self) -> Result<bool> {
        self.controller.is_on()
    }

    /// `false` queues a fade to the off floor and returns its
    /// generation. `true` is acknowledged and queues nothing.
    pub fn set_on(&self, on: bool) -> Result<Option<u64>> {
        info!("Set On -> {}", on);
        let fade = self.controller.handle_command(LightCommand::SetOn(on))?;
        Ok(fade.map(|fade| self.queue(fade)))
    }

    /// Instantaneous brightness rounded to a whole percent.
    pub fn get_brightness(&self) -> Result<u8> {
        let percent = self.controller.brightness()?;
        Ok(percent.round().clamp(0.0, 100.0) as u8)
    }

    /// Queue a fade and return its generation. Out-of-range values
    /// clamp into 0-100.
    pub fn set_brightness(&self, value: i64) -> Result<u64> {
        let percent = value.clamp(0, 100) as u8;
        info!("Set Brightness -> {}", percent);
        let fade = self.controller.set_target(percent)?;
        Ok(self.queue(fade))
    }

    pub fn status(&self) -> Result<LightStatus> {
        Ok(LightStatus {
            on: self.get_on()?,
            brightness: self.get_brightness()?,
            target: self.controller.target(),
            generation: self.controller.generation(),
            stats: self.controller.stats(),
        })
    }

    // ── Fade driver ───────────────────────────────────────────

    fn queue(&self, fade: Fade<C, D, S>) -> u64 {
        let generation = fade.generation();
        if let Some(stale) = self.pending.try_take() {
            stale.abandon();
        }
        self.pending.signal(fade);
        generation
    }

    /// Run queued fades one at a time. Never returns.
    ///
    /// The running fade stops at its next step once a newer one is
    /// queued, and the driver moves straight on to the newer one.
    pub async fn drive_fades(&self) {
        loop {
            let fade = self.pending.wait().await;
            let generation = fade.generation();
            let outcome = fade.run().await;
            trace!("Fade driver: #{} ended {:?}", generation, outcome);
        }
    }

    // ── Requests ──────────────────────────────────────────────

    /// Answer one bridge request. Sets respond once the fade is
    /// queued, before it runs.
    pub fn handle(&self, request: Request) -> Response {
        let result = match request {
            Request::Get(Characteristic::On) => self.get_on().map(Response::On),
            Request::Get(Characteristic::Brightness) => {
                self.get_brightness().map(Response::Brightness)
            }
            Request::SetOn(on) => self.set_on(on).map(|_| Response::Ok),
            Request::SetBrightness(value) => self.set_brightness(value).map(|_| Response::Ok),
            Request::Status => self
                .status()
                .and_then(|status| Ok(Response::Status(serde_json::to_string(&status)?))),
        };
        result.unwrap_or_else(|e| {
            warn!("Request {:?} failed: {}", request, e);
            Response::error(e)
        })
    }

    /// Parse and answer one protocol line.
    pub fn handle_line(&self, line: &str) -> Response {
        match line.parse::<Request>() {
            Ok(request) => self.handle(request),
            Err(e) => Response::error(e),
        }
    }
}
