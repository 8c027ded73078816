// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use embedded_hal::digital::{InputPin as _, OutputPin as _, PinState};
use gpiocdev::line::Direction;
use gpiocdev::request::Request;
use gpiosim::{Level, Simpleton};
use pinsense::{Error, FlexPin};
use std::time::Duration;

// max time to allow events to propagate from the sim to cdev
const PROPAGATION_DELAY: Duration = Duration::from_millis(10);

fn wait_propagation_delay() {
    std::thread::sleep(PROPAGATION_DELAY);
}

#[test]
fn output() {
    let s = Simpleton::new(5);

    let offset = 3;
    let mut pin = FlexPin::output(s.dev_path(), offset, "test", PinState::Low).unwrap();

    assert!(pin.is_output());
    assert_eq!(pin.offset(), offset);
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
    pin.set_high().unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::High);
    pin.set_low().unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
}

#[test]
fn input() {
    let s = Simpleton::new(5);

    let offset = 2;
    let mut pin = FlexPin::input(s.dev_path(), offset, "test").unwrap();

    assert!(!pin.is_output());
    assert!(pin.is_low().unwrap());
    s.pullup(offset).unwrap();
    wait_propagation_delay();
    assert!(pin.is_high().unwrap());
    assert_eq!(pin.level().unwrap(), PinState::High);
}

#[test]
fn switch_direction() {
    let s = Simpleton::new(5);

    let offset = 1;
    let mut pin = FlexPin::output(s.dev_path(), offset, "test", PinState::High).unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::High);

    // sim pulls the line low once released
    pin.set_input().unwrap();
    assert!(!pin.is_output());
    assert_eq!(pin.level().unwrap(), PinState::Low);

    s.pullup(offset).unwrap();
    wait_propagation_delay();
    assert_eq!(pin.level().unwrap(), PinState::High);

    // and back again, without releasing the line
    pin.set_state(PinState::Low).unwrap();
    assert!(pin.is_output());
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);

    let req = Request::from(pin);
    let config = req.config();
    let line_config = config.line_config(offset).unwrap();
    assert_eq!(line_config.direction, Some(Direction::Output));
}

#[test]
fn line_in_use() {
    let s = Simpleton::new(5);

    let offset = 4;
    let _pin = FlexPin::output(s.dev_path(), offset, "test", PinState::Low).unwrap();
    let res = FlexPin::input(s.dev_path(), offset, "test");
    assert!(matches!(res, Err(Error::AcquisitionFailed(..))));
}

#[test]
fn from_multi_line_request() {
    let s = Simpleton::new(5);

    let req = Request::builder()
        .on_chip(s.dev_path())
        .with_lines(&[1, 2])
        .as_input()
        .request()
        .unwrap();
    assert!(matches!(
        FlexPin::try_from(req),
        Err(Error::InvalidArguments(_))
    ));
}
