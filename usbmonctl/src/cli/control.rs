use std::{
    io::{BufWriter, Write},
    process::ExitCode,
};

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::debug;
use usbmon::{hiddev::HiddevDevice, monitor::Monitor};

use super::{Cli, Operation};

/// Runs all get and set operations on the selected monitor.
///
/// A failing operation does not stop the ones after it, but makes the whole
/// run fail.
pub fn execute(root: &Cli, monitor: &mut Monitor<HiddevDevice>) -> Result<ExitCode> {
    let mut stdout = BufWriter::new(anstream::stdout());
    let mut stderr = anstream::stderr();
    let mut failed = false;

    debug!(
        "running {} operations on {}",
        root.operations.len(),
        monitor.identity()
    );

    for operation in &root.operations {
        match *operation {
            Operation::Get(address) => match monitor.read(address) {
                Ok(value) => {
                    if root.verbose {
                        write!(
                            stdout,
                            "Control {} ({:#x}) value is ",
                            monitor.control_name(address.report_id).bold(),
                            address.report_id
                        )?;
                    }
                    writeln!(stdout, "{value} ({})", format!("{value:#x}").bright_black())?;
                },
                Err(err) => {
                    failed = true;
                    stdout.flush()?;
                    writeln!(
                        stderr,
                        "{}",
                        format!("Unable to get control {address}: {err}").red()
                    )?;
                },
            },
            Operation::Set(control) => {
                if root.verbose {
                    writeln!(
                        stdout,
                        "Setting control {} ({:#x}) to {}",
                        monitor.control_name(control.address.report_id).bold(),
                        control.address.report_id,
                        control.value
                    )?;
                }

                if let Err(err) = monitor.write(control) {
                    failed = true;
                    stdout.flush()?;
                    writeln!(
                        stderr,
                        "{}",
                        format!("Unable to set control {}: {err}", control.address).red()
                    )?;
                }
            },
        }
    }

    stdout.flush()?;

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
