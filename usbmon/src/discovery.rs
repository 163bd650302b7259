//! Finds monitors among the HID device nodes of the local machine.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    monitor::{Monitor, MonitorError},
    transport::DeviceOpener,
};

/// The directories hiddev device nodes are created in, depending on the
/// device manager in use.
pub const HIDDEV_ROOTS: &[&str] = &["/dev/", "/dev/usb/"];

/// The prefix of the file names of hiddev device nodes.
pub const HIDDEV_PREFIX: &str = "hiddev";

/// Lists all hiddev device nodes in the given directories.
///
/// Nodes are sorted by file name within each directory and directories are
/// visited in the order given. Directories that cannot be read are skipped.
pub fn find_candidates<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for root in roots {
        let root = root.as_ref();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("skipping {}: {err}", root.display());
                continue;
            },
        };

        let mut names: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name())
            .filter(|name| name.to_string_lossy().starts_with(HIDDEV_PREFIX))
            .collect();
        names.sort();

        candidates.extend(names.into_iter().map(|name| root.join(name)));
    }

    candidates
}

/// Returns the first candidate that is a monitor, keeping its device open.
///
/// Candidates after the first monitor are not opened at all.
pub fn find_first<O, I>(opener: &O, candidates: I) -> Option<(PathBuf, Monitor<O::Device>)>
where
    O: DeviceOpener,
    I: IntoIterator<Item = PathBuf>,
{
    candidates
        .into_iter()
        .find_map(|path| match Monitor::open(opener, &path) {
            Ok(monitor) => Some((path, monitor)),
            Err(err) => {
                debug!("{}: {err}", path.display());
                None
            },
        })
}

/// Probes every candidate and returns the amount of monitors found.
///
/// `visit` is called once per candidate, in order, with either the open
/// monitor session or the reason the candidate is none. Each device is closed
/// right after its visit, so no handle outlives this call.
pub fn probe_all<O, I, F>(opener: &O, candidates: I, mut visit: F) -> usize
where
    O: DeviceOpener,
    I: IntoIterator<Item = PathBuf>,
    F: FnMut(&Path, Result<&mut Monitor<O::Device>, &MonitorError>),
{
    let mut count = 0;

    for path in candidates {
        match Monitor::open(opener, &path) {
            Ok(mut monitor) => {
                count += 1;
                visit(&path, Ok(&mut monitor));
            },
            Err(err) => visit(&path, Err(&err)),
        }
    }

    count
}
