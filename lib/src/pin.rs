// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::Path;

use embedded_hal::digital::PinState;
use gpiocdev::line::{Config, Direction, Offset, Value};
use gpiocdev::request::{Config as RequestConfig, Request};

use crate::{Error, Result};

/// A [`gpiocdev::request::Request`] containing a single line that may be switched
/// between input and output in place.
///
/// Holding the [`FlexPin`] grants exclusive access to the line.
/// The line is released when the [`FlexPin`] is dropped.
///
/// Switching direction reconfigures the existing request rather than
/// re-requesting the line, so the line is never released between uses.
#[derive(Debug)]
pub struct FlexPin {
    req: Request,
    offset: Offset,
    config: Config,
}

impl FlexPin {
    /// Request the line at `offset` on `chip` as an output set to `state`.
    ///
    /// ```no_run
    /// # fn example() -> Result<(), pinsense::Error> {
    /// use embedded_hal::digital::PinState;
    ///
    /// let mut pin = pinsense::FlexPin::output("/dev/gpiochip0", 17, "example", PinState::Low)?;
    /// pin.set_state(PinState::High)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn output<P>(chip: P, offset: Offset, consumer: &str, state: PinState) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let chip = chip.as_ref();
        let req = Request::builder()
            .on_chip(chip)
            .with_consumer(consumer)
            .with_line(offset)
            .as_output(state_to_value(state, false))
            .request()
            .map_err(|e| {
                Error::acquisition(
                    format!(
                        "unable to request line {} on '{}' as output",
                        offset,
                        chip.display()
                    ),
                    e,
                )
            })?;

        FlexPin::try_from(req)
    }

    /// Request the line at `offset` on `chip` as an input.
    pub fn input<P>(chip: P, offset: Offset, consumer: &str) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let chip = chip.as_ref();
        let req = Request::builder()
            .on_chip(chip)
            .with_consumer(consumer)
            .with_line(offset)
            .as_input()
            .request()
            .map_err(|e| {
                Error::acquisition(
                    format!(
                        "unable to request line {} on '{}' as input",
                        offset,
                        chip.display()
                    ),
                    e,
                )
            })?;

        FlexPin::try_from(req)
    }

    /// The offset of the line on its chip.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Is the line currently configured as an output?
    pub fn is_output(&self) -> bool {
        self.config.direction == Some(Direction::Output)
    }

    /// Read the level of the line.
    ///
    /// For outputs this is the physical level, where supported by the hardware.
    pub fn level(&mut self) -> Result<PinState> {
        let value = self.req.value(self.offset).map_err(|e| {
            Error::acquisition(format!("unable to read line {}", self.offset), e)
        })?;
        Ok(value_to_state(value, self.config.active_low))
    }

    /// Drive the line to `state`, switching it to output if necessary.
    pub fn set_state(&mut self, state: PinState) -> Result<()> {
        let value = state_to_value(state, self.config.active_low);
        if !self.is_output() {
            let mut config = self.req.config();
            config.from_line_config(&self.config).as_output(value);
            self.reconfigure(&config)?;
            // retain the input specific fields in case the pin is switched back.
            self.config.direction = Some(Direction::Output);
            self.config.value = Some(value);
            return Ok(());
        }
        if self.config.value != Some(value) {
            self.req.set_value(self.offset, value).map_err(|e| {
                Error::acquisition(format!("unable to set line {}", self.offset), e)
            })?;
            self.config.value = Some(value);
        }
        Ok(())
    }

    /// Stop driving the line by switching it to input.
    pub fn set_input(&mut self) -> Result<()> {
        if self.config.direction == Some(Direction::Input) {
            return Ok(());
        }
        let mut config = self.req.config();
        config.from_line_config(&self.config).as_input();
        self.reconfigure(&config)?;
        self.config.direction = Some(Direction::Input);
        self.config.value = None;
        Ok(())
    }

    fn reconfigure(&self, config: &RequestConfig) -> Result<()> {
        self.req.reconfigure(config).map_err(|e| {
            Error::acquisition(format!("unable to reconfigure line {}", self.offset), e)
        })
    }
}

impl TryFrom<Request> for FlexPin {
    type Error = Error;

    /// Convert any single line [`Request`] into a [`FlexPin`].
    fn try_from(req: Request) -> Result<Self> {
        let config = req.config();
        let offsets = config.lines();
        if offsets.len() != 1 {
            return Err(Error::InvalidArguments(
                "request must contain a single line".into(),
            ));
        }
        let offset = offsets[0];
        let line_config = match config.line_config(offset) {
            Some(lc) => lc.clone(),
            None => {
                return Err(Error::InvalidArguments(format!(
                    "request has no config for line {offset}"
                )))
            }
        };

        Ok(FlexPin {
            req,
            offset,
            config: line_config,
        })
    }
}

impl From<FlexPin> for Request {
    /// Convert the [`FlexPin`] into the contained [`Request`].
    fn from(pin: FlexPin) -> Self {
        pin.req
    }
}

impl embedded_hal::digital::ErrorType for FlexPin {
    type Error = Error;
}

impl embedded_hal::digital::InputPin for FlexPin {
    #[inline]
    fn is_high(&mut self) -> Result<bool> {
        Ok(self.level()? == PinState::High)
    }

    #[inline]
    fn is_low(&mut self) -> Result<bool> {
        Ok(self.level()? == PinState::Low)
    }
}

impl embedded_hal::digital::OutputPin for FlexPin {
    #[inline]
    fn set_low(&mut self) -> Result<()> {
        self.set_state(PinState::Low)
    }

    #[inline]
    fn set_high(&mut self) -> Result<()> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<()> {
        FlexPin::set_state(self, state)
    }
}

/// Converts a [`PinState`] to the gpiocdev logical line [`Value`].
fn state_to_value(state: PinState, is_active_low: bool) -> Value {
    let value = match state {
        PinState::High => Value::Active,
        PinState::Low => Value::Inactive,
    };
    if is_active_low {
        return value.not();
    }
    value
}

fn value_to_state(value: Value, is_active_low: bool) -> PinState {
    let state = match value {
        Value::Active => PinState::High,
        Value::Inactive => PinState::Low,
    };
    if is_active_low {
        return !state;
    }
    state
}
