//! LightAccessory and its fade driver, one driver poll per step.

use std::future::Future;
use std::pin::Pin;

use futures_lite::future::{block_on, poll_once};
use pwmlight::app::controller::{BrightnessController, FadeConfig};
use pwmlight::app::events::LightEvent;
use pwmlight::bridge::accessory::LightAccessory;
use pwmlight::bridge::protocol::Response;
use pwmlight::config::AccessoryConfig;

use crate::mock_hw::{MockChannel, RecordingSink, YieldDelay};

type Accessory = LightAccessory<MockChannel, YieldDelay, RecordingSink>;

fn accessory(percent: u8) -> (Accessory, RecordingSink) {
    let sink = RecordingSink::default();
    let controller = BrightnessController::new(
        MockChannel::at(percent),
        YieldDelay::default(),
        sink.clone(),
        FadeConfig::default(),
    );
    controller.start().unwrap();
    (LightAccessory::new(controller, AccessoryConfig::default()), sink)
}

/// Poll the driver until every started fade has ended.
fn settle(acc: &Accessory, driver: &mut Pin<Box<impl Future<Output = ()>>>) {
    for _ in 0..1000 {
        let stats = acc.controller().stats();
        if stats.fades_completed + stats.fades_superseded == stats.fades_started {
            return;
        }
        assert!(block_on(poll_once(&mut *driver)).is_none());
    }
    panic!("fades did not settle");
}

#[test]
fn last_write_wins_through_the_driver() {
    let (acc, sink) = accessory(100);
    let mut driver = Box::pin(acc.drive_fades());
    assert_eq!(acc.set_brightness(0).unwrap(), 1);
    assert_eq!(acc.set_brightness(20).unwrap(), 2);
    settle(&acc, &mut driver);

    assert_eq!(
        sink.count(|e| *e
            == LightEvent::FadeSuperseded {
                generation: 1,
                written: 0
            }),
        1
    );
    assert_eq!(acc.get_brightness().unwrap(), 20);
    assert_eq!(
        acc.controller().channel().writes,
        (20..=100).rev().collect::<Vec<u8>>()
    );
    let stats = acc.controller().stats();
    assert_eq!(stats.fades_superseded, 1);
    assert_eq!(stats.fades_completed, 1);
}

#[test]
fn request_mid_fade_hands_over_at_the_next_step() {
    let (acc, sink) = accessory(100);
    let mut driver = Box::pin(acc.drive_fades());
    acc.set_brightness(0).unwrap();
    for _ in 0..5 {
        assert!(block_on(poll_once(&mut driver)).is_none());
    }
    assert_eq!(acc.controller().channel().writes, vec![100, 99, 98, 97, 96]);

    acc.set_brightness(20).unwrap();
    settle(&acc, &mut driver);

    assert_eq!(
        sink.count(|e| *e
            == LightEvent::FadeSuperseded {
                generation: 1,
                written: 5
            }),
        1
    );
    // The second fade starts from the level the first one left,
    // so 96 is written twice.
    let writes = acc.controller().channel().writes.clone();
    let mut expected = vec![100, 99, 98, 97, 96];
    expected.extend((20..=96).rev());
    assert_eq!(writes, expected);
    assert_eq!(acc.get_brightness().unwrap(), 20);
}

#[test]
fn flood_of_sets_runs_one_fade() {
    let (acc, sink) = accessory(100);
    let mut driver = Box::pin(acc.drive_fades());
    for percent in 0..100 {
        assert_eq!(
            acc.handle_line(&format!("SET Brightness {percent}")),
            Response::Ok
        );
    }
    settle(&acc, &mut driver);

    let stats = acc.controller().stats();
    assert_eq!(stats.fades_started, 100);
    assert_eq!(stats.fades_superseded, 99);
    assert_eq!(stats.fades_completed, 1);
    assert_eq!(acc.controller().channel().writes, vec![100, 99]);
    assert_eq!(
        sink.count(|e| matches!(e, LightEvent::FadeCompleted { generation: 100, .. })),
        1
    );
}

#[test]
fn set_returns_before_the_fade_runs() {
    let (acc, _) = accessory(100);
    let mut driver = Box::pin(acc.drive_fades());
    assert_eq!(acc.handle_line("SET Brightness 50"), Response::Ok);
    assert_eq!(acc.controller().target(), 50);
    assert_eq!(acc.get_brightness().unwrap(), 100);
    assert!(acc.controller().channel().attempts.is_empty());

    settle(&acc, &mut driver);
    assert_eq!(acc.get_brightness().unwrap(), 50);
    assert_eq!(acc.controller().channel().writes.len(), 51);
}

#[test]
fn turning_off_keeps_the_light_dimly_on() {
    let (acc, _) = accessory(80);
    let mut driver = Box::pin(acc.drive_fades());
    assert_eq!(acc.set_on(false).unwrap(), Some(1));
    settle(&acc, &mut driver);
    assert_eq!(acc.get_brightness().unwrap(), 10);
    assert!(acc.get_on().unwrap());
}

#[test]
fn protocol_lines_map_to_characteristics() {
    let (acc, _) = accessory(100);
    let mut driver = Box::pin(acc.drive_fades());
    assert_eq!(acc.handle_line("GET On"), Response::On(true));
    assert_eq!(acc.handle_line("SET Brightness 150"), Response::Ok);
    assert_eq!(acc.controller().target(), 100);
    assert_eq!(acc.handle_line("SET Brightness 0"), Response::Ok);

    settle(&acc, &mut driver);
    assert_eq!(acc.handle_line("GET Brightness"), Response::Brightness(0));
    assert_eq!(acc.handle_line("GET On"), Response::On(false));
}

#[test]
fn read_failures_surface_as_errors() {
    let (acc, _) = accessory(40);
    acc.controller().channel_mut().fail_reads = true;
    assert!(acc.get_on().is_err());
    assert!(acc.status().is_err());
    let Response::Err(msg) = acc.handle_line("GET Brightness") else {
        panic!("expected an error response");
    };
    assert!(msg.contains("read failed"));
}
