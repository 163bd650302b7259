//! Identifies monitors among HID devices and implements the control session
//! with a single monitor.

use std::{fmt, path::Path};

use thiserror::Error;
use tracing::debug;

use crate::{
    access,
    control::{ControlAddress, ControlValue, resolver},
    enumerate::Controls,
    transport::{DeviceOpener, HidTransport, OpenError, ReportType},
};

/// The bits of a usage code selecting the usage page.
pub const USAGE_PAGE_MASK: u32 = 0xffff_0000;

/// The usage page of the USB Monitor Control Class. Devices exposing an
/// application on this page are monitors.
pub const USAGE_PAGE_MONITOR: u32 = 0x0080_0000;

/// The usage page of enumerated values of monitor controls.
pub const USAGE_PAGE_MONITOR_ENUM: u32 = 0x0081_0000;

/// The usage page of the VESA virtual controls.
pub const USAGE_PAGE_VESA: u32 = 0x0082_0000;

/// Used as the display name if a monitor does not report a name.
pub const UNKNOWN_DEVICE_NAME: &str = "Unable to get device name";

/// Identifies a single monitor.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MonitorIdentity {
    pub vendor_id: u16,
    pub product_id: u16,

    /// The device release number, major version in the high byte and minor
    /// version in the low byte.
    pub version: u16,

    /// The name the monitor reports for itself.
    pub display_name: String,
}

impl MonitorIdentity {
    pub fn version_major(&self) -> u8 {
        (self.version >> 8) as u8
    }

    pub fn version_minor(&self) -> u8 {
        (self.version & 0xff) as u8
    }
}

impl fmt::Display for MonitorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:#06x}:{:#06x}) v{:x}.{:02x}",
            self.display_name,
            self.vendor_id,
            self.product_id,
            self.version_major(),
            self.version_minor()
        )
    }
}

/// Checks whether a device is a monitor and retrieves its identity.
///
/// A device is a monitor if at least one of its top-level applications lives on
/// the [`USAGE_PAGE_MONITOR`] page. Scanning stops at the first match, so a
/// device has at most one identity.
///
/// Returns [`None`] if the device information cannot be read or no
/// application matches. No report is touched in either case.
pub fn classify<T: HidTransport>(device: &T) -> Option<MonitorIdentity> {
    let info = match device.device_info() {
        Ok(info) => info,
        Err(err) => {
            debug!("could not read device info: {err}");
            return None;
        },
    };

    let is_monitor = (0..info.num_applications).any(|index| {
        device
            .application_usage(index)
            .is_ok_and(|usage| usage & USAGE_PAGE_MASK == USAGE_PAGE_MONITOR)
    });

    if !is_monitor {
        debug!(
            "{:#06x}:{:#06x} has no monitor application",
            info.vendor_id, info.product_id
        );
        return None;
    }

    let display_name = device.device_name().unwrap_or_else(|err| {
        debug!("could not read device name: {err}");
        UNKNOWN_DEVICE_NAME.to_string()
    });

    Some(MonitorIdentity {
        vendor_id: info.vendor_id,
        product_id: info.product_id,
        version: info.version,
        display_name,
    })
}

/// Represents an open control session with a single monitor.
///
/// The session owns the device handle, so there is exactly one logical
/// operation using the handle at any time. Dropping the session closes the
/// device.
pub struct Monitor<T: HidTransport> {
    device: T,
    identity: MonitorIdentity,
}

impl<T: HidTransport> Monitor<T> {
    /// Tries to start a session with a device.
    ///
    /// Gives the device back if it is not a monitor, so the caller decides
    /// whether to release it.
    pub fn new(device: T) -> Result<Self, T> {
        match classify(&device) {
            Some(identity) => Ok(Self { device, identity }),
            None => Err(device),
        }
    }

    /// Opens a device node and starts a session if it is a monitor.
    ///
    /// Returns [`MonitorError::NotAMonitor`] and closes the device if it is no
    /// monitor.
    pub fn open<O>(opener: &O, path: &Path) -> Result<Self, MonitorError>
    where
        O: DeviceOpener<Device = T>,
    {
        let device = opener.open(path)?;

        Self::new(device).map_err(|_| MonitorError::NotAMonitor)
    }

    pub fn identity(&self) -> &MonitorIdentity {
        &self.identity
    }

    /// The vendor ID biasing all control lookups of this session.
    pub fn vendor_id(&self) -> u16 {
        self.identity.vendor_id
    }

    /// Resolves the name of a control using this monitor's vendor.
    pub fn control_name(&self, control_id: u8) -> &'static str {
        resolver::resolve_name(self.vendor_id(), control_id)
    }

    /// Checks whether a control is hidden on this monitor.
    pub fn is_hidden(&self, control_id: u8) -> bool {
        resolver::is_hidden(self.vendor_id(), control_id)
    }

    /// Reads the current value of a control.
    ///
    /// See [`access::read_control`].
    pub fn read(&mut self, address: ControlAddress) -> Result<i32, access::ControlError> {
        let vendor_id = self.vendor_id();
        access::read_control(&mut self.device, vendor_id, address)
    }

    /// Writes a control value.
    ///
    /// See [`access::write_control`].
    pub fn write(&mut self, control: ControlValue) -> Result<(), access::ControlError> {
        let vendor_id = self.vendor_id();
        access::write_control(&mut self.device, vendor_id, control.address, control.value)
    }

    /// Walks all visible controls of a report type.
    ///
    /// The returned iterator borrows the session exclusively until it is
    /// dropped.
    pub fn controls(&mut self, report_type: ReportType) -> Controls<'_, T> {
        let vendor_id = self.vendor_id();
        Controls::new(&mut self.device, vendor_id, report_type)
    }

    /// Ends the session and hands out the device.
    pub fn into_device(self) -> T {
        self.device
    }
}

/// Represents an error that occurred when starting a monitor session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MonitorError {
    /// Indicates that the device node could not be opened.
    #[error(transparent)]
    Open(#[from] OpenError),

    /// Indicates that the device exposes no monitor application.
    #[error("the device is not an USB HID monitor")]
    NotAMonitor,
}
