// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::Path;
use std::thread;
use std::time::Duration;

use embedded_hal::digital::{OutputPin, PinState};
use gpiocdev::chip::Chip;
use gpiocdev::line::Offset;

use crate::pin::FlexPin;
use crate::{Error, Result};

/// The chip used when none is specified.
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// The consumer label applied to the LED line.
pub const CONSUMER: &str = "LED";

/// Drives an LED connected to a single output line.
///
/// The driver is either enabled, holding the line and its chip, or disabled,
/// in which case all operations are no-ops that do not touch the hardware.
/// A driver that fails to acquire its line starts disabled and can only be
/// enabled by constructing a new driver.
///
/// The line, then the chip, are released when the driver is dropped.
#[derive(Debug)]
pub struct LedDriver<L = FlexPin> {
    state: State<L>,
}

#[derive(Debug)]
enum State<L> {
    Disabled(Option<Error>),
    // field order sets drop order - the line is released before the chip is closed.
    Enabled { line: L, chip: Option<Chip> },
}

impl LedDriver<FlexPin> {
    /// Acquire the line at `offset` on `chip` as an output, initially low.
    ///
    /// If the line cannot be acquired the driver is returned disabled, and
    /// the cause is available from [`LedDriver::take_fault`].
    pub fn new<P: AsRef<Path>>(chip: P, offset: Offset) -> Self {
        match Self::try_new(chip, offset) {
            Ok(led) => led,
            Err(e) => LedDriver {
                state: State::Disabled(Some(e)),
            },
        }
    }

    /// Acquire the line at `offset` on the [`DEFAULT_CHIP`].
    pub fn with_default_chip(offset: Offset) -> Self {
        Self::new(DEFAULT_CHIP, offset)
    }

    /// Acquire the line at `offset` on `chip` as an output, initially low,
    /// returning the error if it cannot be acquired.
    pub fn try_new<P: AsRef<Path>>(chip: P, offset: Offset) -> Result<Self> {
        let path = chip.as_ref();
        let chip = Chip::from_path(path).map_err(|e| {
            Error::acquisition(
                format!("unable to open GPIO chip '{}'", path.display()),
                e,
            )
        })?;
        chip.line_info(offset).map_err(|e| {
            Error::acquisition(
                format!("unable to get line {} on '{}'", offset, chip.name()),
                e,
            )
        })?;
        // chip is dropped, and so closed, if the request fails.
        let line = FlexPin::output(chip.path(), offset, CONSUMER, PinState::Low)?;
        Ok(LedDriver {
            state: State::Enabled {
                line,
                chip: Some(chip),
            },
        })
    }
}

impl<L: OutputPin<Error = Error>> LedDriver<L> {
    /// Create an enabled driver from an already configured output.
    ///
    /// The level of the output is left unchanged.
    pub fn from_pin(line: L) -> Self {
        LedDriver {
            state: State::Enabled { line, chip: None },
        }
    }

    /// Does the driver hold its line?
    pub fn is_enabled(&self) -> bool {
        matches!(self.state, State::Enabled { .. })
    }

    /// Take the error that prevented the driver acquiring its line, if any.
    pub fn take_fault(&mut self) -> Option<Error> {
        match &mut self.state {
            State::Disabled(fault) => fault.take(),
            State::Enabled { .. } => None,
        }
    }

    /// The line being driven, if enabled.
    pub fn line(&self) -> Option<&L> {
        match &self.state {
            State::Enabled { line, .. } => Some(line),
            State::Disabled(_) => None,
        }
    }

    /// Turn the LED on.
    pub fn on(&mut self) -> Result<()> {
        self.set(PinState::High)
    }

    /// Turn the LED off.
    pub fn off(&mut self) -> Result<()> {
        self.set(PinState::Low)
    }

    /// Blink the LED `cycles` times, holding it on, then off, for `interval`
    /// each cycle.
    ///
    /// Blocks until all cycles are complete.
    pub fn blink(&mut self, interval: Duration, cycles: u32) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        for _ in 0..cycles {
            self.on()?;
            thread::sleep(interval);
            self.off()?;
            thread::sleep(interval);
        }
        Ok(())
    }

    /// Perform the given command.
    pub fn apply(&mut self, cmd: &Command) -> Result<()> {
        match *cmd {
            Command::On => self.on(),
            Command::Off => self.off(),
            Command::Blink { interval, cycles } => self.blink(interval, cycles),
        }
    }

    /// Release the line and chip, leaving the driver disabled.
    ///
    /// Has no effect on a disabled driver.
    pub fn close(&mut self) {
        if self.is_enabled() {
            self.state = State::Disabled(None);
        }
    }

    fn set(&mut self, state: PinState) -> Result<()> {
        match &mut self.state {
            State::Enabled { line, .. } => line.set_state(state),
            State::Disabled(_) => Ok(()),
        }
    }
}

/// The operations supported by the LED command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Turn the LED on.
    On,
    /// Turn the LED off.
    Off,
    /// Blink the LED.
    Blink {
        /// The period the LED is held on, and then off, in each cycle.
        interval: Duration,
        /// The number of on/off cycles.
        cycles: u32,
    },
}

impl Command {
    /// Parse a command from its arguments.
    ///
    /// The arguments are one of:
    ///     on
    ///     off
    ///     blink <interval_ms> <cycles>
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Command> {
        let mut args = args.iter().map(|a| a.as_ref());
        let cmd = match args.next() {
            Some(cmd) => cmd,
            None => return Err(Error::InvalidArguments("no command provided".into())),
        };
        let cmd = match cmd {
            "on" => Command::On,
            "off" => Command::Off,
            "blink" => {
                let (interval, cycles) = match (args.next(), args.next()) {
                    (Some(interval), Some(cycles)) => (interval, cycles),
                    _ => {
                        return Err(Error::InvalidArguments(
                            "blink requires interval and cycles parameters".into(),
                        ))
                    }
                };
                let interval = interval.parse::<u64>().map_err(|e| {
                    Error::InvalidArguments(format!("invalid blink interval '{interval}': {e}"))
                })?;
                let cycles = cycles.parse::<u32>().map_err(|e| {
                    Error::InvalidArguments(format!("invalid blink cycles '{cycles}': {e}"))
                })?;
                Command::Blink {
                    interval: Duration::from_millis(interval),
                    cycles,
                }
            }
            _ => return Err(Error::InvalidArguments(format!("invalid command '{cmd}'"))),
        };
        if let Some(extra) = args.next() {
            return Err(Error::InvalidArguments(format!(
                "unexpected argument '{extra}'"
            )));
        }
        Ok(cmd)
    }
}
