//! Outbound controller events.
//!
//! The [`BrightnessController`](super::controller::BrightnessController)
//! emits these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

/// Structured events emitted by the brightness controller.
#[derive(Debug, Clone, PartialEq)]
pub enum LightEvent {
    /// The channel was configured and energised.
    ChannelEnabled { period: u64 },

    /// A fade was created for a new target.
    FadeStarted {
        generation: u64,
        start: u8,
        target: u8,
    },

    /// A fade wrote its final step (or had nothing to do).
    FadeCompleted {
        generation: u64,
        target: u8,
        steps: u32,
    },

    /// A fade stopped because a newer request took over.
    FadeSuperseded { generation: u64, written: u32 },

    /// A step write failed; the fade carried on.
    WriteFailed { percent: u8, reason: String },
}
