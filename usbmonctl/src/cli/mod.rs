mod control;
mod list;

use std::{
    ffi::OsString,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Result;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use itertools::Itertools;
use owo_colors::OwoColorize;
use usbmon::{
    control::{ControlAddress, ControlValue},
    discovery,
    hiddev::{HiddevDevice, HiddevOpener},
    monitor::{Monitor, MonitorError},
};

const EXAMPLES: &str = "\
Numbers can be specified in decimal or hexadecimal (prefixed by '0x').

Examples:
  usbmonctl -s O,0x01,0,0=1    degauss
  usbmonctl -g F,16            get current brightness value
  usbmonctl -s F,0x12=10       set contrast to 10";

/// USB HID Monitor Control Utility
#[derive(Parser)]
#[command(version, about, long_about = None, after_help = EXAMPLES)]
pub struct Cli {
    #[command(flatten)]
    color: colorchoice_clap::Color,

    /// hiddevN device (usually /dev/hiddevN or /dev/usb/hiddevN). If omitted,
    /// the first USB monitor found is used
    device: Option<PathBuf>,

    /// Get value of control NUMBER (TYPE=F for FEATURE or I for INPUT)
    #[arg(short, long, value_name = "TYPE,NUMBER", value_parser = ControlAddress::parse_read)]
    get: Vec<ControlAddress>,

    /// Set value of control NUMBER to VALUE (TYPE=F for FEATURE or O for
    /// OUTPUT)
    #[arg(short, long, value_name = "TYPE,NUMBER=VALUE", value_parser = ControlValue::parse_write)]
    set: Vec<ControlValue>,

    /// Check if DEVICE is an USB HID monitor (for udev use)
    #[arg(short, long)]
    check: bool,

    /// List all USB monitors and their controls
    #[arg(short, long, conflicts_with_all = ["device", "get", "set", "check"])]
    list: bool,

    /// Be verbose
    #[arg(short, long)]
    pub verbose: bool,

    /// Output the monitor list as plain JSON
    #[arg(short, long, requires = "list")]
    json: bool,

    /// Directory to search for hiddevN devices instead of /dev/ and /dev/usb/
    #[arg(long = "search-dir", value_name = "DIR")]
    search_dirs: Vec<PathBuf>,

    /// All get and set operations in the order they were given.
    #[arg(skip)]
    operations: Vec<Operation>,
}

/// A single control operation requested on the command line.
#[derive(Clone, Copy, Debug)]
enum Operation {
    Get(ControlAddress),
    Set(ControlValue),
}

impl Cli {
    /// Parses the command line, keeping the relative order of get and set
    /// operations.
    ///
    /// Without any arguments, the help is shown.
    pub fn parse_ordered() -> Self {
        Self::try_parse_ordered_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    fn try_parse_ordered_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if args.len() < 2 {
            args.push("--help".into());
        }

        let matches = Self::command().try_get_matches_from(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        cli.operations = cli.ordered_operations(&matches);
        Ok(cli)
    }

    fn ordered_operations(&self, matches: &ArgMatches) -> Vec<Operation> {
        let gets = matches
            .indices_of("get")
            .into_iter()
            .flatten()
            .zip(self.get.iter().copied().map(Operation::Get));
        let sets = matches
            .indices_of("set")
            .into_iter()
            .flatten()
            .zip(self.set.iter().copied().map(Operation::Set));

        gets.chain(sets)
            .sorted_by_key(|(index, _)| *index)
            .map(|(_, operation)| operation)
            .collect()
    }

    fn candidates(&self) -> Vec<PathBuf> {
        if self.search_dirs.is_empty() {
            discovery::find_candidates(discovery::HIDDEV_ROOTS)
        } else {
            discovery::find_candidates(&self.search_dirs)
        }
    }
}

pub fn execute(cli: &Cli) -> Result<ExitCode> {
    cli.color.write_global();

    if cli.list {
        return list::execute(cli);
    }

    let Some(mut monitor) = select_monitor(cli)? else {
        return Ok(ExitCode::FAILURE);
    };

    control::execute(cli, &mut monitor)
}

/// Opens the monitor all control operations are executed on.
///
/// Returns `Ok(None)` if there is none, after telling the user why.
fn select_monitor(cli: &Cli) -> Result<Option<Monitor<HiddevDevice>>> {
    let mut stderr = anstream::stderr();
    let mut stdout = BufWriter::new(anstream::stdout());

    if let Some(device) = &cli.device {
        return match Monitor::open(&HiddevOpener, device) {
            Ok(monitor) => {
                if cli.verbose {
                    writeln!(
                        stdout,
                        "Using specified device {}: {}",
                        device.display(),
                        monitor.identity()
                    )?;
                    stdout.flush()?;
                }
                Ok(Some(monitor))
            },
            Err(err) => {
                if !cli.check {
                    report_unusable(&mut stderr, device, &err)?;
                }
                Ok(None)
            },
        };
    }

    match discovery::find_first(&HiddevOpener, cli.candidates()) {
        Some((path, monitor)) => {
            if cli.verbose {
                writeln!(
                    stdout,
                    "{}: {}",
                    path.display().bright_black(),
                    monitor.identity()
                )?;
                stdout.flush()?;
            }
            Ok(Some(monitor))
        },
        None => {
            writeln!(stderr, "{}", "No USB HID monitors found!".red())?;
            Ok(None)
        },
    }
}

fn report_unusable(out: &mut impl Write, device: &Path, err: &MonitorError) -> Result<()> {
    match err {
        MonitorError::NotAMonitor => writeln!(
            out,
            "{}",
            format!(
                "Specified device '{}' is not an USB HID monitor!",
                device.display()
            )
            .red()
        )?,
        other => writeln!(out, "{}", format!("Unable to open device: {other}").red())?,
    }

    Ok(())
}
