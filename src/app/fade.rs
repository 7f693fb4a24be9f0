//! Fade task: one-point brightness steps paced by a fixed delay.
//!
//! ```text
//!  start ─▶ write ─▶ wait ─▶ write ─▶ wait ─▶ … ─▶ write(target) ─▶ wait
//!            ▲                 ▲                        ▲
//!            └── generation still current? (else stop) ─┘
//! ```
//!
//! Direction is decided once from the start snapshot. A fade never
//! re-reads the target; a newer request bumps the controller's
//! generation and the stale fade stops before its next write.

use std::rc::Rc;

use super::controller::BrightnessController;
use super::ports::{EventSink, LightChannel, StepDelay};

// ───────────────────────────────────────────────────────────────
// Plan
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Hold,
}

/// The percentages a fade will write, from `start` to `target` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadePlan {
    pub start: u8,
    pub target: u8,
}

impl FadePlan {
    pub const fn new(start: u8, target: u8) -> Self {
        Self { start, target }
    }

    pub const fn direction(&self) -> Direction {
        if self.target < self.start {
            Direction::Down
        } else if self.target > self.start {
            Direction::Up
        } else {
            Direction::Hold
        }
    }

    /// Number of writes. Zero when start and target already agree.
    pub const fn len(&self) -> u32 {
        if self.start == self.target {
            0
        } else {
            self.start.abs_diff(self.target) as u32 + 1
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn steps(&self) -> FadeSteps {
        FadeSteps {
            next: if self.start == self.target {
                None
            } else {
                Some(self.start)
            },
            target: self.target,
            descending: self.target < self.start,
        }
    }
}

/// Iterator over the percentages of a [`FadePlan`].
#[derive(Debug, Clone)]
pub struct FadeSteps {
    next: Option<u8>,
    target: u8,
    descending: bool,
}

impl Iterator for FadeSteps {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let current = self.next?;
        self.next = if current == self.target {
            None
        } else if self.descending {
            Some(current - 1)
        } else {
            Some(current + 1)
        };
        Some(current)
    }
}

// ───────────────────────────────────────────────────────────────
// Task
// ───────────────────────────────────────────────────────────────

/// How a fade ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// Every step was written (write failures included).
    Completed { target: u8, steps: u32 },
    /// A newer request took over after `written` steps.
    Superseded { generation: u64, written: u32 },
}

/// A fade bound to one controller generation.
///
/// Created by [`BrightnessController::set_target`] and
/// [`BrightnessController::turn_off`]; nothing happens until
/// [`run`](Self::run) is polled.
pub struct Fade<C, D, S> {
    controller: Rc<BrightnessController<C, D, S>>,
    generation: u64,
    plan: FadePlan,
}

impl<C, D, S> Fade<C, D, S>
where
    C: LightChannel,
    D: StepDelay,
    S: EventSink,
{
    pub(crate) fn new(
        controller: Rc<BrightnessController<C, D, S>>,
        generation: u64,
        plan: FadePlan,
    ) -> Self {
        Self {
            controller,
            generation,
            plan,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn plan(&self) -> FadePlan {
        self.plan
    }

    pub async fn run(self) -> FadeOutcome {
        let controller = self.controller;
        let step_delay = controller.step_delay();
        let mut written = 0u32;

        for percent in self.plan.steps() {
            if !controller.is_current(self.generation) {
                return controller.fade_superseded(self.generation, written);
            }
            controller.write_step(percent);
            written += 1;
            controller.delay().wait(step_delay).await;
        }

        // A request may land during the final wait.
        if !controller.is_current(self.generation) {
            return controller.fade_superseded(self.generation, written);
        }
        controller.fade_completed(self.generation, self.plan.target, written)
    }

    /// Retire a fade that was replaced before its first poll.
    pub(crate) fn abandon(self) -> FadeOutcome {
        self.controller.fade_superseded(self.generation, 0)
    }
}
