// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The DHT22 (AM2302) single-wire protocol.
//!
//! A read is initiated by the host holding the line low for 18ms, then
//! releasing it. The sensor acknowledges, then transmits 40 bits, each as a
//! low period followed by a high period whose length encodes the bit value.
//!
//! The reader does not timestamp edges. Instead it spins on the line level,
//! counting 1us ticks per level, and decodes the tick counts into a frame.
//! The raw counts are captured into [`Timings`] so the decode can be exercised
//! independently of the hardware.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
#[cfg(feature = "serde")]
use serde_derive::Serialize;

use crate::pin::FlexPin;
use crate::{Error, Result};

/// The maximum number of edge timing slots sampled per read.
pub const MAX_TIMINGS: usize = 85;

/// The number of slots preceding the data bits, covering the host release and
/// the sensor acknowledgement.
pub const PREAMBLE_SLOTS: usize = 4;

/// High periods longer than this many ticks are decoded as 1.
pub const BIT_THRESHOLD: u8 = 16;

/// The tick count at which a slot is considered to have timed out.
pub const TIMEOUT_TICKS: u8 = 255;

/// The number of data bits in a frame.
pub const FRAME_BITS: usize = 40;

/// The number of bytes in a frame, including the checksum.
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// The minimum period between reads supported by the sensor.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

/// The period the host holds the line low to wake the sensor.
const WAKE_PERIOD_MS: u32 = 18;

/// The period the host drives the line high before releasing it.
const RELEASE_PERIOD_US: u32 = 40;

/// The consumer label applied to the sensor line.
pub const CONSUMER: &str = "dht22";

/// The line operations required to drive the DHT22 protocol.
pub trait SensorLine {
    /// Drive the line to the given level.
    fn drive(&mut self, state: PinState) -> Result<()>;

    /// Stop driving the line so the sensor can respond.
    fn release(&mut self) -> Result<()>;

    /// Read the current level of the line.
    fn level(&mut self) -> Result<PinState>;
}

impl SensorLine for FlexPin {
    #[inline]
    fn drive(&mut self, state: PinState) -> Result<()> {
        self.set_state(state)
    }

    #[inline]
    fn release(&mut self) -> Result<()> {
        self.set_input()
    }

    #[inline]
    fn level(&mut self) -> Result<PinState> {
        FlexPin::level(self)
    }
}

/// A [`DelayNs`] using the system clock.
///
/// Short delays spin on the clock as sleeping cannot reliably provide
/// microsecond resolution. Longer delays sleep.
#[derive(Clone, Copy, Debug, Default)]
pub struct SysDelay;

impl SysDelay {
    /// Delays shorter than this are spun rather than slept.
    const SPIN_LIMIT: Duration = Duration::from_micros(100);
}

impl DelayNs for SysDelay {
    fn delay_ns(&mut self, ns: u32) {
        let period = Duration::from_nanos(ns.into());
        if period < Self::SPIN_LIMIT {
            let start = Instant::now();
            while start.elapsed() < period {
                std::hint::spin_loop();
            }
        } else {
            std::thread::sleep(period);
        }
    }
}

/// A DHT22 sensor attached to a single line.
#[derive(Debug)]
pub struct Dht22<L, D> {
    line: L,
    delay: D,
}

impl Dht22<FlexPin, SysDelay> {
    /// Request the line at `offset` on `chip` for a DHT22.
    ///
    /// The line is held as an output, idling high, until the first read.
    pub fn open<P: AsRef<Path>>(chip: P, offset: u32) -> Result<Self> {
        Self::open_with_consumer(chip, offset, CONSUMER)
    }

    /// Request the line at `offset` on `chip` for a DHT22, with the given
    /// consumer label.
    pub fn open_with_consumer<P: AsRef<Path>>(
        chip: P,
        offset: u32,
        consumer: &str,
    ) -> Result<Self> {
        let line = FlexPin::output(chip, offset, consumer, PinState::High)?;
        Ok(Dht22::new(line, SysDelay))
    }
}

impl<L, D> Dht22<L, D>
where
    L: SensorLine,
    D: DelayNs,
{
    /// Create a reader from a line and a delay provider.
    pub fn new(line: L, delay: D) -> Self {
        Dht22 { line, delay }
    }

    /// Perform a single acquisition.
    ///
    /// Reads should be at least [`REFRESH_INTERVAL`] apart.
    pub fn read(&mut self) -> Result<Reading> {
        let timings = self.sample()?;
        let frame = timings.decode()?;
        Reading::from_frame(&frame)
    }

    /// Wake the sensor and capture the tick counts of its response.
    ///
    /// Sampling stops at the first slot that times out.
    pub fn sample(&mut self) -> Result<Timings> {
        self.line.drive(PinState::Low)?;
        self.delay.delay_ms(WAKE_PERIOD_MS);
        self.line.drive(PinState::High)?;
        self.delay.delay_us(RELEASE_PERIOD_US);
        self.line.release()?;

        let mut timings = Timings::new();
        let mut last = PinState::High;
        while !timings.is_complete() {
            let mut ticks: u8 = 0;
            let level = loop {
                let level = self.line.level()?;
                if level != last {
                    break level;
                }
                ticks += 1;
                self.delay.delay_us(1);
                if ticks == TIMEOUT_TICKS {
                    break level;
                }
            };
            if !timings.record(ticks) {
                break;
            }
            last = level;
        }
        Ok(timings)
    }

    /// Release the line and delay provider.
    pub fn into_inner(self) -> (L, D) {
        (self.line, self.delay)
    }
}

/// The tick counts captured from one sensor response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Timings {
    ticks: [u8; MAX_TIMINGS],
    len: usize,
    timeout: Option<usize>,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            ticks: [0; MAX_TIMINGS],
            len: 0,
            timeout: None,
        }
    }
}

impl Timings {
    /// An empty set of timings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build timings from a sequence of tick counts, as the sampler would
    /// record them.
    ///
    /// Recording stops at the first count reaching [`TIMEOUT_TICKS`], or when
    /// [`MAX_TIMINGS`] counts have been recorded.
    pub fn from_ticks(ticks: &[u8]) -> Self {
        let mut timings = Self::new();
        for &t in ticks {
            if timings.is_complete() || !timings.record(t) {
                break;
            }
        }
        timings
    }

    /// Record the tick count for the next slot.
    ///
    /// Returns false, and records nothing, if the slot timed out.
    pub fn record(&mut self, ticks: u8) -> bool {
        if ticks >= TIMEOUT_TICKS {
            self.timeout = Some(self.len);
            return false;
        }
        if self.is_complete() {
            return false;
        }
        self.ticks[self.len] = ticks;
        self.len += 1;
        true
    }

    /// The tick counts of the slots recorded so far.
    pub fn ticks(&self) -> &[u8] {
        &self.ticks[..self.len]
    }

    /// The slot that timed out, if any.
    pub fn timed_out_at(&self) -> Option<usize> {
        self.timeout
    }

    /// Have all slots been recorded?
    pub fn is_complete(&self) -> bool {
        self.len == MAX_TIMINGS
    }

    /// The number of data bits captured.
    pub fn bit_count(&self) -> usize {
        self.data_slots().count()
    }

    // The high period of each bit follows the preamble at every second slot.
    fn data_slots(&self) -> impl Iterator<Item = u8> + '_ {
        self.ticks()
            .iter()
            .skip(PREAMBLE_SLOTS)
            .step_by(2)
            .take(FRAME_BITS)
            .copied()
    }

    /// Decode the captured bits into a frame.
    ///
    /// Bits are packed MSB first. Fewer than [`FRAME_BITS`] bits is a
    /// [`Error::ProtocolTimeout`].
    pub fn decode(&self) -> Result<[u8; FRAME_BYTES]> {
        let mut frame = [0; FRAME_BYTES];
        let mut bits = 0;
        for ticks in self.data_slots() {
            let byte = &mut frame[bits / 8];
            *byte <<= 1;
            if ticks > BIT_THRESHOLD {
                *byte |= 1;
            }
            bits += 1;
        }
        if bits < FRAME_BITS {
            return Err(Error::ProtocolTimeout {
                slot: self.timeout,
                bits,
            });
        }
        Ok(frame)
    }
}

/// The checksum of the data bytes of a frame.
pub fn checksum(frame: &[u8; FRAME_BYTES]) -> u8 {
    frame[..4].iter().fold(0, |sum, b| sum.wrapping_add(*b))
}

/// A validated humidity and temperature reading.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Reading {
    /// Relative humidity, in percent.
    pub humidity: f32,
    /// Temperature in degrees Celsius.
    pub celsius: f32,
    /// Temperature in degrees Fahrenheit.
    pub fahrenheit: f32,
}

impl Reading {
    /// Validate and convert a raw frame.
    ///
    /// Scaled temperatures over 125 are mapped to `-(t - 256)`.
    /// The sign bit of the temperature is not decoded separately.
    pub fn from_frame(frame: &[u8; FRAME_BYTES]) -> Result<Reading> {
        let expected = checksum(frame);
        if frame[4] != expected {
            return Err(Error::ChecksumMismatch {
                expected,
                actual: frame[4],
            });
        }
        let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
        let mut celsius = f32::from(u16::from_be_bytes([frame[2], frame[3]])) / 10.0;
        if celsius > 125.0 {
            celsius = -(celsius - 256.0);
        }
        Ok(Reading {
            humidity,
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
        })
    }

    /// Temperature in Kelvin.
    pub fn kelvin(&self) -> f32 {
        self.celsius + 273.15
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Humidity = {:.1} % Temperature = {:.1} C ({:.1} F)",
            self.humidity, self.celsius, self.fahrenheit
        )
    }
}

fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// The average of a burst of readings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Summary {
    /// The number of readings averaged.
    pub count: usize,
    /// Mean relative humidity, in percent.
    pub humidity: f32,
    /// Mean temperature in degrees Celsius.
    pub celsius: f32,
    /// Mean temperature in degrees Fahrenheit.
    pub fahrenheit: f32,
}

impl Summary {
    /// Average the readings, or None if there are none.
    pub fn from_readings(readings: &[Reading]) -> Option<Summary> {
        if readings.is_empty() {
            return None;
        }
        let count = readings.len();
        let n = count as f32;
        let humidity = readings.iter().map(|r| r.humidity).sum::<f32>() / n;
        let celsius = readings.iter().map(|r| r.celsius).sum::<f32>() / n;
        Some(Summary {
            count,
            humidity,
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Average of {} = Humidity = {:.2} % Temperature = {:.2} C ({:.2} F)",
            self.count, self.humidity, self.celsius, self.fahrenheit
        )
    }
}
