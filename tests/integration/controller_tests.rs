//! BrightnessController and Fade behaviour against the mock channel.

use std::time::Duration;

use futures_lite::future::{block_on, poll_once};
use pwmlight::app::commands::LightCommand;
use pwmlight::app::events::LightEvent;
use pwmlight::app::fade::FadeOutcome;
use pwmlight::error::Error;

use crate::mock_hw::{MOCK_PERIOD, rig};

#[test]
fn start_enables_and_reports_the_period() {
    let r = rig(100);
    r.controller.start().unwrap();
    assert!(r.controller.channel().enabled);
    assert_eq!(
        r.sink.events.borrow()[0],
        LightEvent::ChannelEnabled {
            period: MOCK_PERIOD
        }
    );
}

#[test]
fn fade_down_writes_every_step_with_a_delay_after_each() {
    let r = rig(100);
    let outcome = block_on(r.controller.set_target(30).unwrap().run());

    assert_eq!(
        outcome,
        FadeOutcome::Completed {
            target: 30,
            steps: 71
        }
    );
    let writes = r.controller.channel().writes.clone();
    assert_eq!(writes, (30..=100).rev().collect::<Vec<u8>>());
    let waits = r.delay.waits.borrow();
    assert_eq!(waits.len(), 71);
    assert!(waits.iter().all(|d| *d == Duration::from_millis(10)));
    assert!((r.controller.brightness().unwrap() - 30.0).abs() < 1e-9);
}

#[test]
fn fade_up_is_inclusive() {
    let r = rig(10);
    block_on(r.controller.set_target(14).unwrap().run());
    assert_eq!(r.controller.channel().writes, vec![10, 11, 12, 13, 14]);
}

#[test]
fn target_equal_to_current_writes_nothing() {
    let r = rig(42);
    let outcome = block_on(r.controller.set_target(42).unwrap().run());
    assert_eq!(
        outcome,
        FadeOutcome::Completed {
            target: 42,
            steps: 0
        }
    );
    assert!(r.controller.channel().attempts.is_empty());
    assert!(r.delay.waits.borrow().is_empty());
}

#[test]
fn set_target_may_go_below_the_off_floor() {
    let r = rig(8);
    block_on(r.controller.set_target(0).unwrap().run());
    assert_eq!(r.controller.channel().writes, (0..=8).rev().collect::<Vec<u8>>());
    assert!(!r.controller.is_on().unwrap());
}

#[test]
fn turn_off_fades_to_the_floor() {
    let r = rig(50);
    block_on(r.controller.turn_off().unwrap().run());
    assert_eq!(r.controller.target(), 10);
    let writes = r.controller.channel().writes.clone();
    assert_eq!(writes.len(), 41);
    assert_eq!(writes.first(), Some(&50));
    assert_eq!(writes.last(), Some(&10));
    assert!(r.controller.is_on().unwrap());
}

#[test]
fn turn_off_below_the_floor_fades_up() {
    let r = rig(5);
    block_on(r.controller.turn_off().unwrap().run());
    assert_eq!(r.controller.channel().writes, vec![5, 6, 7, 8, 9, 10]);
}

#[test]
fn set_on_true_is_a_no_op() {
    let r = rig(60);
    let fade = r.controller.handle_command(LightCommand::SetOn(true)).unwrap();
    assert!(fade.is_none());
    assert_eq!(r.controller.generation(), 0);
    assert!(r.sink.events.borrow().is_empty());
}

#[test]
fn commands_dispatch_to_fades() {
    let r = rig(60);
    let off = r.controller.handle_command(LightCommand::SetOn(false)).unwrap();
    assert_eq!(off.map(|f| f.plan().target), Some(10));
    let bright = r
        .controller
        .handle_command(LightCommand::SetBrightness(75))
        .unwrap();
    assert_eq!(bright.map(|f| f.generation()), Some(2));
}

#[test]
fn query_during_a_fade_sees_the_instantaneous_value() {
    let r = rig(100);
    let mut fade = Box::pin(r.controller.set_target(30).unwrap().run());
    for _ in 0..10 {
        assert!(block_on(poll_once(&mut fade)).is_none());
    }
    assert!((r.controller.brightness().unwrap() - 91.0).abs() < 1e-9);
    assert_eq!(r.controller.target(), 30);
    assert!(r.controller.is_on().unwrap());
}

#[test]
fn newer_request_supersedes_the_running_fade() {
    let r = rig(100);
    let mut first = Box::pin(r.controller.set_target(80).unwrap().run());
    for _ in 0..5 {
        assert!(block_on(poll_once(&mut first)).is_none());
    }
    assert_eq!(r.controller.channel().writes, vec![100, 99, 98, 97, 96]);

    let second = r.controller.set_target(20).unwrap();
    assert_eq!(second.plan().start, 96);
    assert_eq!(second.plan().len(), 77);

    assert_eq!(
        block_on(poll_once(&mut first)),
        Some(FadeOutcome::Superseded {
            generation: 1,
            written: 5
        })
    );
    assert_eq!(r.controller.channel().writes.len(), 5);

    let outcome = block_on(second.run());
    assert_eq!(
        outcome,
        FadeOutcome::Completed {
            target: 20,
            steps: 77
        }
    );
    assert!((r.controller.brightness().unwrap() - 20.0).abs() < 1e-9);

    let stats = r.controller.stats();
    assert_eq!(stats.fades_started, 2);
    assert_eq!(stats.fades_superseded, 1);
    assert_eq!(stats.fades_completed, 1);
}

#[test]
fn request_during_the_final_wait_supersedes() {
    let r = rig(20);
    let mut first = Box::pin(r.controller.set_target(22).unwrap().run());
    for _ in 0..3 {
        assert!(block_on(poll_once(&mut first)).is_none());
    }
    assert_eq!(r.controller.channel().writes, vec![20, 21, 22]);

    let _second = r.controller.set_target(50).unwrap();
    assert_eq!(
        block_on(poll_once(&mut first)),
        Some(FadeOutcome::Superseded {
            generation: 1,
            written: 3
        })
    );

    let stats = r.controller.stats();
    assert_eq!(stats.fades_superseded, 1);
    assert_eq!(stats.fades_completed, 0);
    assert_eq!(
        r.sink.count(|e| matches!(e, LightEvent::FadeCompleted { .. })),
        0
    );
}

#[test]
fn failed_writes_do_not_stop_the_fade() {
    let r = rig(100);
    r.controller.channel_mut().fail_writes = true;
    let outcome = block_on(r.controller.set_target(90).unwrap().run());

    assert_eq!(
        outcome,
        FadeOutcome::Completed {
            target: 90,
            steps: 11
        }
    );
    assert_eq!(r.controller.channel().attempts.len(), 11);
    assert!(r.controller.channel().writes.is_empty());
    assert_eq!(r.delay.waits.borrow().len(), 11);
    assert_eq!(r.controller.stats().write_failures, 11);
    assert_eq!(
        r.sink
            .count(|e| matches!(e, LightEvent::WriteFailed { .. })),
        11
    );
}

#[test]
fn read_failure_rejects_the_request_and_keeps_state() {
    let r = rig(70);
    r.controller.channel_mut().fail_reads = true;
    let err = r.controller.set_target(20).err().unwrap();
    assert!(matches!(err, Error::DeviceRead { .. }));
    assert!(err.is_recoverable());
    assert_eq!(r.controller.target(), 100);
    assert_eq!(r.controller.generation(), 0);
    assert!(r.controller.is_on().is_err());
}

#[test]
fn read_failure_leaves_the_running_fade_alone() {
    let r = rig(50);
    let mut fade = Box::pin(r.controller.set_target(40).unwrap().run());
    assert!(block_on(poll_once(&mut fade)).is_none());

    r.controller.channel_mut().fail_reads = true;
    assert!(r.controller.turn_off().is_err());
    r.controller.channel_mut().fail_reads = false;

    assert_eq!(
        block_on(fade),
        FadeOutcome::Completed {
            target: 40,
            steps: 11
        }
    );
}

#[test]
fn events_trace_the_fade_lifecycle() {
    let r = rig(20);
    block_on(r.controller.set_target(22).unwrap().run());
    assert_eq!(
        *r.sink.events.borrow(),
        vec![
            LightEvent::FadeStarted {
                generation: 1,
                start: 20,
                target: 22
            },
            LightEvent::FadeCompleted {
                generation: 1,
                target: 22,
                steps: 3
            },
        ]
    );
}
