// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Basic example of polling a DHT22 sensor.

use anyhow::Context;
use pinsense::dht22::{Dht22, REFRESH_INTERVAL};
use std::thread;

fn main() -> anyhow::Result<()> {
    let offset = 4;

    let mut sensor = Dht22::open("/dev/gpiochip0", offset)
        .context("Failed to request sensor line")?;

    loop {
        match sensor.read() {
            Ok(reading) => println!("{reading}"),
            Err(e) => println!("Data not good, skip ({e})"),
        }
        thread::sleep(REFRESH_INTERVAL);
    }
}
