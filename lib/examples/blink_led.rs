// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Basic example of blinking an LED.

use anyhow::Context;
use pinsense::led::LedDriver;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let offset = 16;

    let mut led = LedDriver::try_new("/dev/gpiochip0", offset)
        .context("Failed to acquire LED line")?;

    led.blink(Duration::from_millis(500), 5)
        .context("Failed to blink LED")?;

    Ok(())
}
