//! Inbound commands to the brightness controller.
//!
//! These represent the two property setters of the accessory. The
//! bridge layer builds them from whatever transport it speaks.

/// Commands that the accessory bridge can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    /// "On" property set. `false` fades to the off floor; `true` is
    /// acknowledged without a fade.
    SetOn(bool),

    /// "Brightness" property set, already clamped to `0..=100`.
    SetBrightness(u8),
}
