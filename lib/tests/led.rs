// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use embedded_hal::digital::PinState;
use gpiosim::{Level, Simpleton};
use pinsense::led::{Command, LedDriver};
use pinsense::{Error, FlexPin};
use std::time::Duration;

#[test]
fn starts_low() {
    let s = Simpleton::new(8);

    let offset = 5;
    s.pullup(offset).unwrap();
    let led = LedDriver::new(s.dev_path(), offset);

    assert!(led.is_enabled());
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
}

#[test]
fn on_off() {
    let s = Simpleton::new(8);

    let offset = 3;
    let mut led = LedDriver::new(s.dev_path(), offset);

    led.on().unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::High);
    led.off().unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
}

#[test]
fn blink() {
    let s = Simpleton::new(8);

    let offset = 3;
    let mut led = LedDriver::new(s.dev_path(), offset);

    led.apply(&Command::Blink {
        interval: Duration::from_millis(1),
        cycles: 3,
    })
    .unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::Low);
}

#[test]
fn offset_out_of_range() {
    let s = Simpleton::new(8);

    let mut led = LedDriver::new(s.dev_path(), 8);
    assert!(!led.is_enabled());
    assert!(matches!(
        led.take_fault(),
        Some(Error::AcquisitionFailed(..))
    ));
    led.on().unwrap();
}

#[test]
fn line_in_use() {
    let s = Simpleton::new(8);

    let offset = 2;
    let _other = FlexPin::output(s.dev_path(), offset, "other", PinState::High).unwrap();
    let mut led = LedDriver::new(s.dev_path(), offset);

    assert!(!led.is_enabled());
    assert!(led.take_fault().is_some());
    // no-op, so the line is left as set by the other owner
    led.off().unwrap();
    led.blink(Duration::ZERO, 2).unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::High);
}

#[test]
fn drop_releases_line() {
    let s = Simpleton::new(8);

    let offset = 6;
    let led = LedDriver::new(s.dev_path(), offset);
    assert!(led.is_enabled());
    assert!(LedDriver::try_new(s.dev_path(), offset).is_err());

    drop(led);
    assert!(LedDriver::try_new(s.dev_path(), offset).is_ok());
}

#[test]
fn close_releases_line() {
    let s = Simpleton::new(8);

    let offset = 1;
    let mut led = LedDriver::new(s.dev_path(), offset);
    led.close();
    led.close();
    assert!(!led.is_enabled());

    let mut other = LedDriver::new(s.dev_path(), offset);
    assert!(other.is_enabled());
    other.on().unwrap();
    // the closed driver no longer affects the line
    led.off().unwrap();
    assert_eq!(s.get_level(offset).unwrap(), Level::High);
}
