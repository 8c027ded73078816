// SPDX-FileCopyrightText: 2024 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{emit_error, ChipOpts, EmitOpts};
use anyhow::{Context, Result};
use clap::Parser;
use pinsense::led::{Command, LedDriver};

#[derive(Debug, Parser)]
#[command(alias("l"))]
pub struct Opts {
    /// The command to perform
    ///
    /// One of:
    ///     on
    ///     off
    ///     blink <interval_ms> <cycles>
    ///
    /// e.g.
    ///     led on
    ///     led blink 500 10
    #[arg(
        value_name = "command",
        required = true,
        num_args = 1..,
        verbatim_doc_comment
    )]
    command: Vec<String>,

    #[command(flatten)]
    chip_opts: ChipOpts,

    /// The offset of the LED line on the chip
    #[arg(short, long, value_name = "offset", default_value_t = 16)]
    line: u32,

    #[command(flatten)]
    emit: EmitOpts,
}

pub fn cmd(opts: &Opts) -> bool {
    match do_cmd(opts) {
        Ok(()) => true,
        Err(e) => {
            emit_error(&opts.emit, &e);
            false
        }
    }
}

fn do_cmd(opts: &Opts) -> Result<()> {
    let command = Command::from_args(&opts.command).context("invalid LED command")?;

    let chip = opts.chip_opts.path();
    let mut led = LedDriver::new(&chip, opts.line);
    if let Some(fault) = led.take_fault() {
        // not fatal - the command is ignored
        let e = anyhow::Error::new(fault).context("failed to initialize LED controller");
        emit_error(&opts.emit, &e);
    }
    led.apply(&command).with_context(|| {
        format!(
            "failed to drive LED on line {} of {}",
            opts.line,
            chip.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use crate::{Command as Subcommand, Opts as CliOpts};
    use clap::Parser;

    fn parse(args: &[&str]) -> (super::Opts, bool) {
        let opts = CliOpts::try_parse_from(args).unwrap();
        let verbose = opts.verbose;
        match opts.cmd {
            Subcommand::Led(led) => (led, verbose),
            _ => panic!("expected led subcommand"),
        }
    }

    #[test]
    fn options_after_command() {
        let (opts, verbose) = parse(&["pinsense", "led", "on", "--chip", "1", "-v"]);
        assert_eq!(opts.command, vec!["on"]);
        assert_eq!(opts.chip_opts.chip, "1");
        assert!(opts.emit.verbose);
        assert!(verbose);
        assert_eq!(opts.line, 16);
    }

    #[test]
    fn options_before_command() {
        let (opts, _) = parse(&["pinsense", "led", "--chip", "gpiochip2", "-l", "7", "off"]);
        assert_eq!(opts.command, vec!["off"]);
        assert_eq!(opts.chip_opts.chip, "gpiochip2");
        assert_eq!(opts.line, 7);
    }

    #[test]
    fn blink_with_trailing_options() {
        let (opts, _) = parse(&["pinsense", "led", "blink", "100", "3", "--line", "5"]);
        assert_eq!(opts.command, vec!["blink", "100", "3"]);
        assert_eq!(opts.line, 5);
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_after_command() {
        let (opts, _) = parse(&["pinsense", "led", "off", "--json"]);
        assert_eq!(opts.command, vec!["off"]);
        assert!(opts.emit.json);
    }

    #[test]
    fn negative_value_rejected() {
        assert!(CliOpts::try_parse_from(["pinsense", "led", "blink", "100", "-1"]).is_err());
    }
}
