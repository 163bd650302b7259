//! Defines the seam between the monitor control logic and the device it talks
//! to.
//!
//! The USB Monitor Control Class is a plain HID class, so everything this crate
//! needs from a device is a small set of HID requests: reading the device and
//! application information, walking reports and fields, and moving usage values
//! between the host and the device's report buffers. These requests are
//! described by [`HidTransport`]. On Linux, [`crate::hiddev`] implements them
//! on top of the kernel's hiddev interface.

use std::{
    fmt,
    io,
    path::{Path, PathBuf},
};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::control::ControlAddress;

/// Represents an open HID device that can be queried and mutated.
///
/// All report-related requests operate on state kept per handle (the staged
/// report buffers and the report walk), which is why they take `&mut self`.
/// Implementations do not need to be thread-safe: a handle is only ever used
/// by one logical operation at a time.
pub trait HidTransport {
    /// Retrieves the identity and application count of the device.
    fn device_info(&self) -> Result<DeviceInfo, TransportError>;

    /// Retrieves the usage code of the top-level application with the given
    /// index, bound by [`DeviceInfo::num_applications`].
    fn application_usage(&self, index: u32) -> Result<u32, TransportError>;

    /// Retrieves the name the device reports for itself.
    fn device_name(&self) -> Result<String, TransportError>;

    /// Asks the device to (re-)initialize all of its reports.
    ///
    /// This has to happen before reports can be walked using
    /// [`Self::report_info`].
    fn init_reports(&mut self) -> Result<(), TransportError>;

    /// Retrieves information about the report selected by `cursor`.
    ///
    /// Fails if there is no such report, which is also how the end of a report
    /// walk is signalled.
    fn report_info(
        &mut self,
        report_type: ReportType,
        cursor: ReportCursor,
    ) -> Result<ReportInfo, TransportError>;

    /// Retrieves information about a single field of a report.
    fn field_info(
        &mut self,
        report_type: ReportType,
        report_id: u8,
        field_index: u32,
    ) -> Result<FieldInfo, TransportError>;

    /// Reads a usage value out of the host-side report buffer.
    fn get_usage(&mut self, address: ControlAddress) -> Result<i32, TransportError>;

    /// Places a usage value into the host-side report buffer.
    fn set_usage(&mut self, address: ControlAddress, value: i32) -> Result<(), TransportError>;

    /// Pulls a report from the device into the host-side report buffer.
    fn get_report(&mut self, report_type: ReportType, report_id: u8) -> Result<(), TransportError>;

    /// Pushes the host-side report buffer to the device.
    fn set_report(&mut self, report_type: ReportType, report_id: u8) -> Result<(), TransportError>;
}

/// Opens [`HidTransport`]s by device node path.
///
/// Closing a device is done by dropping it.
pub trait DeviceOpener {
    /// The transport produced by this opener.
    type Device: HidTransport;

    /// Opens the device node at the given path.
    fn open(&self, path: &Path) -> Result<Self::Device, OpenError>;
}

/// The type of a HID report.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum ReportType {
    /// Reports sent from the device to the host.
    Input = 1,

    /// Reports sent from the host to the device.
    Output = 2,

    /// Bidirectional configuration reports.
    Feature = 3,
}

impl ReportType {
    /// All report types in the order they are walked when listing controls.
    pub const ALL: [ReportType; 3] = [ReportType::Input, ReportType::Output, ReportType::Feature];

    /// The upper-case name of the report type.
    pub fn name(self) -> &'static str {
        match self {
            ReportType::Input => "INPUT",
            ReportType::Output => "OUTPUT",
            ReportType::Feature => "FEATURE",
        }
    }

    /// The single letter used for the report type in control coordinates.
    pub fn letter(self) -> char {
        match self {
            ReportType::Input => 'I',
            ReportType::Output => 'O',
            ReportType::Feature => 'F',
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Selects a report during a report walk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ReportCursor {
    /// The first report of a type.
    First,

    /// The report following the given one, in the order the device declares
    /// its reports.
    After(u8),
}

/// Identifies a device and announces how many applications it exposes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct DeviceInfo {
    /// The USB vendor ID.
    pub vendor_id: u16,

    /// The USB product ID.
    pub product_id: u16,

    /// The device release number, major version in the high byte and minor
    /// version in the low byte.
    pub version: u16,

    /// The amount of top-level HID applications.
    pub num_applications: u32,
}

/// Describes a single report returned from [`HidTransport::report_info`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReportInfo {
    pub report_type: ReportType,
    pub report_id: u8,
    pub num_fields: u32,
}

/// Describes a single field of a report.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldInfo {
    /// The index of the field inside its report.
    pub field_index: u32,

    /// The raw HID main item flags of the field (constant, variable, relative
    /// etc.).
    pub flags: u32,

    /// The smallest value the field's usages can take.
    pub logical_minimum: i32,

    /// The largest value the field's usages can take.
    pub logical_maximum: i32,

    /// The amount of usages in the field.
    pub max_usage: u32,
}

/// Names the transport request that failed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum Request {
    DeviceInfo,
    Application,
    DeviceName,
    InitReports,
    ReportInfo,
    FieldInfo,
    GetUsage,
    SetUsage,
    GetReport,
    SetReport,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Request::DeviceInfo => "device info",
            Request::Application => "application",
            Request::DeviceName => "device name",
            Request::InitReports => "init reports",
            Request::ReportInfo => "report info",
            Request::FieldInfo => "field info",
            Request::GetUsage => "get usage",
            Request::SetUsage => "set usage",
            Request::GetReport => "get report",
            Request::SetReport => "set report",
        })
    }
}

/// Represents an error returned by a [`HidTransport`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Indicates that the device rejected or failed a request.
    #[error("the {0} request failed")]
    Request(Request, #[source] io::Error),

    /// Indicates that the device returned a value this crate cannot represent.
    #[error("the device returned an unsupported response")]
    UnsupportedResponse,
}

impl TransportError {
    /// The request that failed, if the error originates from one.
    pub fn request(&self) -> Option<Request> {
        match self {
            TransportError::Request(request, _) => Some(*request),
            TransportError::UnsupportedResponse => None,
        }
    }
}

/// Indicates that a device node could not be opened.
#[derive(Debug, Error)]
#[error("could not open device {}", path.display())]
pub struct OpenError {
    pub path: PathBuf,

    #[source]
    pub source: io::Error,
}
