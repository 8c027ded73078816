// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A command line tool for reading DHT22 sensors and driving LEDs on GPIO lines.

use clap::Parser;
use std::process::ExitCode;

mod common;
mod dht22;
mod led;

fn main() -> ExitCode {
    match Opts::try_parse() {
        Ok(opt) => {
            let res = match opt.cmd {
                Command::Dht22(cfg) => dht22::cmd(&cfg),
                Command::Led(cfg) => led::cmd(&cfg),
            };
            return if res {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
        Err(e) => {
            let _ = e.print();
            if !e.use_stderr() {
                // help and version requests
                return ExitCode::SUCCESS;
            }
        }
    }
    ExitCode::FAILURE
}

#[derive(Parser)]
#[command(
    name = "pinsense",
    about = "A utility to read DHT22 sensors and drive LEDs on Linux using GPIO character devices.",
    version,
    propagate_version = true
)]
struct Opts {
    /// Provide more detailed error messages.
    #[arg(short = 'v', long, global = true, display_order = 800)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
enum Command {
    /// Poll a DHT22 humidity and temperature sensor.
    Dht22(dht22::Opts),

    /// Turn an LED on or off, or blink it.
    Led(led::Opts),
}
