use std::{
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use usbmon::{
    discovery,
    enumerate::ReportControls,
    hiddev::{HiddevDevice, HiddevOpener},
    monitor::{Monitor, MonitorError, MonitorIdentity},
    transport::ReportType,
};

use super::Cli;

/// Lists every candidate device with all visible controls of the monitors
/// among them.
pub fn execute(root: &Cli) -> Result<ExitCode> {
    let mut stdout = BufWriter::new(anstream::stdout());

    let mut probed = Vec::new();
    let count = discovery::probe_all(&HiddevOpener, root.candidates(), |path, result| {
        probed.push(probe_device(path.to_path_buf(), result));
    });

    if root.json {
        let output = serde_json::to_string(&ListOutput {
            count,
            devices: probed,
        })
        .context("could not serialize the monitor list")?;
        writeln!(stdout, "{output}")?;
        stdout.flush()?;
        return Ok(ExitCode::SUCCESS);
    }

    for device in &probed {
        write_device(&mut stdout, device, root.verbose)?;
    }
    writeln!(stdout, "Found {count} USB HID monitors.")?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ListOutput {
    count: usize,
    devices: Vec<ProbedDevice>,
}

#[derive(Serialize)]
struct ProbedDevice {
    path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    monitor: Option<MonitorIdentity>,

    /// Why the device could not be opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    controls: Vec<ReportControls>,
}

fn probe_device(
    path: PathBuf,
    result: Result<&mut Monitor<HiddevDevice>, &MonitorError>,
) -> ProbedDevice {
    match result {
        Ok(monitor) => {
            let identity = monitor.identity().clone();
            let controls = ReportType::ALL
                .iter()
                .flat_map(|report_type| monitor.controls(*report_type).collect::<Vec<_>>())
                .collect();

            ProbedDevice {
                path,
                monitor: Some(identity),
                error: None,
                controls,
            }
        },
        Err(err) => ProbedDevice {
            path,
            monitor: None,
            error: match err {
                MonitorError::NotAMonitor => None,
                other => Some(other.to_string()),
            },
            controls: Vec::new(),
        },
    }
}

fn write_device(out: &mut impl Write, device: &ProbedDevice, verbose: bool) -> Result<()> {
    let Some(identity) = &device.monitor else {
        match &device.error {
            Some(err) if verbose => writeln!(
                out,
                "{}: {}",
                device.path.display().bright_black(),
                err.red()
            )?,
            _ => writeln!(
                out,
                "{}: {}",
                device.path.display().bright_black(),
                "not an USB monitor".bright_black().italic()
            )?,
        }
        return Ok(());
    };

    writeln!(out, "{}: {}", device.path.display().bright_black(), identity)?;

    for report in &device.controls {
        writeln!(
            out,
            "{}: {} - {}",
            format!("{:<7}", report.info.report_type).bold(),
            format!("{:#04x}", report.info.report_id).bright_blue(),
            report.name
        )?;

        for field in &report.fields {
            writeln!(
                out,
                "\tfield {}, flags={}, range={}..{}",
                field.info.field_index,
                field.info.flags,
                field.info.logical_minimum,
                field.info.logical_maximum
            )?;

            for usage in &field.usages {
                writeln!(
                    out,
                    "\t\tusage {} = {} ({})",
                    usage.usage_index,
                    usage.value.green(),
                    format!("{:#x}", usage.value).bright_black()
                )?;
            }
        }
    }
    writeln!(out)?;

    Ok(())
}
