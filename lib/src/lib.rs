// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A library for reading DHT22 humidity/temperature sensors and driving LEDs
//! on Linux platforms using the GPIO character device.
//!
//! Both are built on [`gpiocdev`], so any line exposed by a
//! `/dev/gpiochipN` device may be used.
//!
//! # Example Usage
//!
//! Reading a DHT22 connected to line 4 of `/dev/gpiochip0`:
//!
//! ```no_run
//! # fn example() -> Result<(), pinsense::Error> {
//! let mut sensor = pinsense::dht22::Dht22::open("/dev/gpiochip0", 4)?;
//! match sensor.read() {
//!     Ok(reading) => println!("{}", reading),
//!     Err(_) => println!("Data not good, skip"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Blinking an LED on line 16:
//!
//! ```no_run
//! # fn example() -> Result<(), pinsense::Error> {
//! use std::time::Duration;
//!
//! let mut led = pinsense::led::LedDriver::with_default_chip(16);
//! led.blink(Duration::from_millis(250), 4)?;
//! # Ok(())
//! # }
//! ```

/// DHT22 sensor protocol and reader.
pub mod dht22;

/// LED driver.
pub mod led;

/// Single line requests.
pub mod pin;

pub use pin::FlexPin;

/// Errors returned by [`pinsense`](crate) functions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The chip or line could not be opened, requested or accessed.
    #[error("{0}")]
    AcquisitionFailed(String, #[source] gpiocdev::Error),

    /// The sensor stopped responding before a complete frame was received.
    #[error("sensor response timed out after {bits} of 40 data bits")]
    ProtocolTimeout {
        /// The slot that timed out, if sampling was cut short.
        slot: Option<usize>,
        /// The number of data bits received.
        bits: usize,
    },

    /// The received frame failed checksum validation.
    #[error("checksum mismatch: computed {expected:#04x}, received {actual:#04x}")]
    ChecksumMismatch {
        /// The checksum computed from the data bytes.
        expected: u8,
        /// The checksum byte received from the sensor.
        actual: u8,
    },

    /// A command or its parameters could not be parsed.
    #[error("{0}")]
    InvalidArguments(String),
}

impl Error {
    pub(crate) fn acquisition<S: Into<String>>(context: S, err: gpiocdev::Error) -> Self {
        Error::AcquisitionFailed(context.into(), err)
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// The result for [`pinsense`](crate) functions.
pub type Result<T> = std::result::Result<T, Error>;
