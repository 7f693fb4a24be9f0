//! Brightness controller, the hexagonal core.
//!
//! [`BrightnessController`] owns the target brightness and the fade
//! generation counter. Current brightness is never cached: every query
//! reads the duty cycle back from the channel, so a query during a fade
//! sees the instantaneous value.
//!
//! ```text
//!  set_target / turn_off ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                            │   BrightnessController   │
//!        LightChannel ◀──────│ target · generation     │
//!                            └────────────┬─────────────┘
//!                                         ▼
//!                                  Fade (one per request)
//! ```
//!
//! The controller is shared through `Rc` and mutated through `Cell` /
//! `RefCell`; everything runs on one cooperative executor and no borrow
//! is held across an `.await`.

use core::cell::{Cell, Ref, RefCell, RefMut};
use core::time::Duration;
use std::rc::Rc;

use log::{debug, info, trace, warn};
use serde::Serialize;

use super::commands::LightCommand;
use super::events::LightEvent;
use super::fade::{Fade, FadeOutcome, FadePlan};
use super::ports::{EventSink, LightChannel, StepDelay};
use crate::error::Result;

/// Fade parameters, fixed for the lifetime of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeConfig {
    /// Wait after every step write.
    pub step_delay: Duration,
    /// Turning off fades to this brightness instead of zero.
    pub min_active_brightness: u8,
    /// Target reported before the first command arrives.
    pub initial_target: u8,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(10),
            min_active_brightness: 10,
            initial_target: 100,
        }
    }
}

/// Running counters, reported through the status query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FadeStats {
    pub fades_started: u64,
    pub fades_completed: u64,
    pub fades_superseded: u64,
    pub write_failures: u64,
}

pub struct BrightnessController<C, D, S> {
    channel: RefCell<C>,
    delay: D,
    sink: RefCell<S>,
    config: FadeConfig,
    target: Cell<u8>,
    generation: Cell<u64>,
    stats: Cell<FadeStats>,
}

impl<C, D, S> BrightnessController<C, D, S>
where
    C: LightChannel,
    D: StepDelay,
    S: EventSink,
{
    /// Build the controller. Does **not** touch the hardware; call
    /// [`start`](Self::start) next.
    pub fn new(channel: C, delay: D, sink: S, config: FadeConfig) -> Rc<Self> {
        Rc::new(Self {
            channel: RefCell::new(channel),
            delay,
            sink: RefCell::new(sink),
            target: Cell::new(config.initial_target.min(100)),
            config,
            generation: Cell::new(0),
            stats: Cell::new(FadeStats::default()),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Allocate, configure and energise the channel.
    pub fn start(&self) -> Result<()> {
        self.channel.borrow_mut().enable()?;
        let period = self.channel.borrow().read_period()?;
        self.emit(&LightEvent::ChannelEnabled { period });
        info!("Channel enabled (period={})", period);
        Ok(())
    }

    // ── Commands ──────────────────────────────────────────────

    /// Store a new target and return the fade toward it.
    ///
    /// The returned fade starts from the brightness read right now and
    /// supersedes any fade still in flight.
    pub fn set_target(self: &Rc<Self>, percent: u8) -> Result<Fade<C, D, S>> {
        self.begin_fade(percent.min(100))
    }

    /// Fade to the off floor. Never fades toward a literal 0.
    pub fn turn_off(self: &Rc<Self>) -> Result<Fade<C, D, S>> {
        let target = self.config.min_active_brightness.min(100);
        self.begin_fade(target)
    }

    /// "On" is derived from the duty cycle, so there is nothing to do.
    pub fn turn_on(&self) {
        debug!("On=true acknowledged, brightness unchanged");
    }

    /// Dispatch a bridge command. `SetOn(true)` produces no fade.
    pub fn handle_command(self: &Rc<Self>, command: LightCommand) -> Result<Option<Fade<C, D, S>>> {
        match command {
            LightCommand::SetOn(false) => self.turn_off().map(Some),
            LightCommand::SetOn(true) => {
                self.turn_on();
                Ok(None)
            }
            LightCommand::SetBrightness(percent) => self.set_target(percent).map(Some),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Instantaneous brightness in percent, read from the channel.
    pub fn brightness(&self) -> Result<f64> {
        self.channel.borrow().read_brightness_percent()
    }

    /// "On" means any non-zero duty cycle.
    pub fn is_on(&self) -> Result<bool> {
        Ok(self.brightness()? > 0.0)
    }

    pub fn target(&self) -> u8 {
        self.target.get()
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn stats(&self) -> FadeStats {
        self.stats.get()
    }

    pub fn config(&self) -> &FadeConfig {
        &self.config
    }

    /// Borrow the channel, e.g. to inspect a simulated device.
    pub fn channel(&self) -> Ref<'_, C> {
        self.channel.borrow()
    }

    /// Mutable channel access for fault injection. Never hold the
    /// guard across an `.await`.
    pub fn channel_mut(&self) -> RefMut<'_, C> {
        self.channel.borrow_mut()
    }

    pub fn sink(&self) -> Ref<'_, S> {
        self.sink.borrow()
    }

    // ── Fade plumbing ─────────────────────────────────────────

    fn begin_fade(self: &Rc<Self>, target: u8) -> Result<Fade<C, D, S>> {
        // Snapshot first: a failed read must leave the in-flight fade alone.
        let start = self.current_percent()?;

        self.target.set(target);
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.update_stats(|s| s.fades_started += 1);

        self.emit(&LightEvent::FadeStarted {
            generation,
            start,
            target,
        });
        debug!("Fade #{} planned: {}% -> {}%", generation, start, target);

        Ok(Fade::new(
            Rc::clone(self),
            generation,
            FadePlan::new(start, target),
        ))
    }

    fn current_percent(&self) -> Result<u8> {
        let percent = self.brightness()?;
        Ok(percent.round().clamp(0.0, 100.0) as u8)
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    pub(crate) fn delay(&self) -> &D {
        &self.delay
    }

    pub(crate) fn step_delay(&self) -> Duration {
        self.config.step_delay
    }

    /// Best-effort step write; failures are reported, never returned.
    pub(crate) fn write_step(&self, percent: u8) {
        let result = self.channel.borrow_mut().write_duty_cycle(percent);
        match result {
            Ok(duty) => trace!("Setting pwm level to: {} ({}%)", duty, percent),
            Err(e) => {
                warn!("Step write {}% failed: {}", percent, e);
                self.update_stats(|s| s.write_failures += 1);
                self.emit(&LightEvent::WriteFailed {
                    percent,
                    reason: e.to_string(),
                });
            }
        }
    }

    pub(crate) fn fade_completed(&self, generation: u64, target: u8, steps: u32) -> FadeOutcome {
        self.update_stats(|s| s.fades_completed += 1);
        self.emit(&LightEvent::FadeCompleted {
            generation,
            target,
            steps,
        });
        debug!("Fade #{} reached {}% in {} steps", generation, target, steps);
        FadeOutcome::Completed { target, steps }
    }

    pub(crate) fn fade_superseded(&self, generation: u64, written: u32) -> FadeOutcome {
        self.update_stats(|s| s.fades_superseded += 1);
        self.emit(&LightEvent::FadeSuperseded {
            generation,
            written,
        });
        debug!("Fade #{} superseded after {} steps", generation, written);
        FadeOutcome::Superseded {
            generation,
            written,
        }
    }

    fn update_stats(&self, f: impl FnOnce(&mut FadeStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn emit(&self, event: &LightEvent) {
        self.sink.borrow_mut().emit(event);
    }
}
