// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{self, emit_error, format_error, ChipOpts, EmitOpts};
use anyhow::Context;
use clap::Parser;
use pinsense::dht22::{Dht22, Reading, Summary, REFRESH_INTERVAL};
#[cfg(feature = "serde")]
use serde_derive::Serialize;
use std::thread;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(alias("d"))]
pub struct Opts {
    #[command(flatten)]
    chip_opts: ChipOpts,

    /// The offset of the sensor data line on the chip
    #[arg(short, long, value_name = "offset", default_value_t = 4)]
    line: u32,

    /// Exit after this many read cycles
    ///
    /// By default the sensor is polled until the process is terminated.
    #[arg(short = 'n', long, value_name = "cycles")]
    count: Option<u64>,

    /// Group read cycles into bursts of this size and report the average
    /// of the valid readings in each burst
    #[arg(short, long, value_name = "cycles", value_parser = clap::value_parser!(u32).range(1..))]
    burst: Option<u32>,

    /// The additional delay after each burst
    ///
    /// The period is taken as milliseconds unless otherwise specified.
    #[arg(long, value_name = "period", value_parser = common::parse_duration, requires = "burst")]
    burst_delay: Option<Duration>,

    /// Prefix each report with the local time
    #[arg(long)]
    localtime: bool,

    /// The consumer label applied to the requested line.
    #[arg(short = 'C', long, value_name = "name", default_value = "pinsense-dht22")]
    consumer: String,

    #[command(flatten)]
    emit: EmitOpts,
}

pub fn cmd(opts: &Opts) -> bool {
    let chip = opts.chip_opts.path();
    let sensor = Dht22::open_with_consumer(&chip, opts.line, &opts.consumer).with_context(|| {
        format!(
            "failed to request line {} on {} for DHT22",
            opts.line,
            chip.display()
        )
    });
    let mut sensor = match sensor {
        Ok(sensor) => sensor,
        Err(e) => {
            emit_error(&opts.emit, &e);
            return false;
        }
    };

    let mut burst = Burst::default();
    let mut cycle = 0;
    loop {
        let res = sensor.read();
        let reading = res.as_ref().ok().copied();
        emit_cycle(opts, res);
        if let Some(size) = opts.burst {
            burst.push(reading);
            if burst.cycles == size {
                emit_summary(opts, Summary::from_readings(&burst.readings));
                burst = Burst::default();
                if let Some(delay) = opts.burst_delay {
                    thread::sleep(delay);
                }
            }
        }
        cycle += 1;
        if opts.count.is_some_and(|count| cycle >= count) {
            return true;
        }
        thread::sleep(REFRESH_INTERVAL);
    }
}

#[derive(Default)]
struct Burst {
    cycles: u32,
    readings: Vec<Reading>,
}

impl Burst {
    fn push(&mut self, reading: Option<Reading>) {
        self.cycles += 1;
        if let Some(r) = reading {
            self.readings.push(r);
        }
    }
}

#[derive(Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
struct CycleResult {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    time: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    reading: Option<Reading>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    summary: Option<Summary>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    error: Option<String>,
    // the result closes a burst rather than a read cycle
    #[cfg_attr(feature = "serde", serde(skip))]
    burst: bool,
}

impl CycleResult {
    fn new(opts: &Opts) -> Self {
        CycleResult {
            time: opts.localtime.then(common::format_localtime),
            ..Default::default()
        }
    }

    fn emit(&self, opts: &Opts) {
        #[cfg(feature = "json")]
        if opts.emit.json {
            match serde_json::to_string(self) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("{e}"),
            }
            return;
        }
        self.print(opts);
    }

    fn print(&self, opts: &Opts) {
        println!("{}", self.report());
        if self.reading.is_none() && !self.burst && opts.emit.verbose {
            if let Some(e) = &self.error {
                eprintln!("{e}");
            }
        }
    }

    fn report(&self) -> String {
        let prefix = match &self.time {
            Some(t) => format!("{t} "),
            None => String::new(),
        };
        if let Some(r) = &self.reading {
            format!("{prefix}{r}")
        } else if let Some(s) = &self.summary {
            format!("{prefix}{s}")
        } else if self.burst {
            format!("{prefix}No valid readings in burst")
        } else {
            format!("{prefix}Data not good, skip")
        }
    }
}

fn emit_cycle(opts: &Opts, res: pinsense::Result<Reading>) {
    let mut cr = CycleResult::new(opts);
    match res {
        Ok(r) => cr.reading = Some(r),
        Err(e) => {
            let e = anyhow::Error::new(e).context("sensor read failed");
            cr.error = Some(format_error(&opts.emit, &e));
        }
    }
    cr.emit(opts);
}

fn emit_summary(opts: &Opts, summary: Option<Summary>) {
    let mut cr = CycleResult::new(opts);
    cr.burst = true;
    match summary {
        Some(s) => cr.summary = Some(s),
        None => cr.error = Some("no valid readings in burst".into()),
    }
    cr.emit(opts);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Reading {
        Reading {
            humidity: 65.2,
            celsius: 35.1,
            fahrenheit: 95.18,
        }
    }

    #[test]
    fn report_reading() {
        let cr = CycleResult {
            reading: Some(reading()),
            ..Default::default()
        };
        assert_eq!(
            cr.report(),
            "Humidity = 65.2 % Temperature = 35.1 C (95.2 F)"
        );
    }

    #[test]
    fn report_failed_cycle() {
        let cr = CycleResult {
            time: Some("2024-01-02T03:04:05.678".into()),
            error: Some("sensor read failed".into()),
            ..Default::default()
        };
        assert_eq!(cr.report(), "2024-01-02T03:04:05.678 Data not good, skip");
    }

    #[test]
    fn report_empty_burst() {
        let cr = CycleResult {
            error: Some("no valid readings in burst".into()),
            burst: true,
            ..Default::default()
        };
        assert_eq!(cr.report(), "No valid readings in burst");
    }

    #[test]
    fn report_burst_summary() {
        let cr = CycleResult {
            summary: Summary::from_readings(&[reading(), reading()]),
            burst: true,
            ..Default::default()
        };
        assert!(cr.report().starts_with("Average of 2 = Humidity = 65.20 %"));
    }
}
