//! Implements [`HidTransport`] on top of the Linux hiddev interface.
//!
//! hiddev exposes every HID device handled by the kernel's USB HID driver as a
//! `hiddevN` character device. Reports, fields and usages are accessed using
//! ioctls, with the kernel keeping the report buffers between requests.

use std::{
    ffi::CStr,
    fs::File,
    io,
    os::fd::{AsRawFd, RawFd},
    path::{Path, PathBuf},
};

use nix::{errno::Errno, libc::c_int};
use tracing::trace;

use self::sys::{
    HiddevDevinfo,
    HiddevFieldInfo,
    HiddevReportInfo,
    HiddevUsageRef,
    hidiocapplication,
    hidiocgdevinfo,
    hidiocgfieldinfo,
    hidiocgname,
    hidiocgreport,
    hidiocgreportinfo,
    hidiocgusage,
    hidiocinitreport,
    hidiocsreport,
    hidiocsusage,
};
use crate::{
    control::ControlAddress,
    transport::{
        DeviceInfo,
        DeviceOpener,
        FieldInfo,
        HidTransport,
        OpenError,
        ReportCursor,
        ReportInfo,
        ReportType,
        Request,
        TransportError,
    },
};

/// Passed as the report ID to select the first report of a type.
const REPORT_ID_FIRST: u32 = 0x100;

/// OR-ed into a report ID to select the report following it.
const REPORT_ID_NEXT: u32 = 0x200;

/// The size of the buffer the device name is read into.
const MAX_NAME_LENGTH: usize = 256;

/// Declarations mirroring `linux/hiddev.h`.
#[allow(dead_code)]
mod sys {
    use nix::{
        ioctl_none,
        ioctl_read,
        ioctl_read_buf,
        ioctl_readwrite,
        ioctl_write_int_bad,
        ioctl_write_ptr,
        request_code_none,
    };

    use crate::control::ControlAddress;

    #[repr(C)]
    #[derive(Default)]
    pub struct HiddevDevinfo {
        pub bustype: u32,
        pub busnum: u32,
        pub devnum: u32,
        pub ifnum: u32,
        pub vendor: i16,
        pub product: i16,
        pub version: i16,
        pub num_applications: u32,
    }

    #[repr(C)]
    #[derive(Default)]
    pub struct HiddevReportInfo {
        pub report_type: u32,
        pub report_id: u32,
        pub num_fields: u32,
    }

    #[repr(C)]
    #[derive(Default)]
    pub struct HiddevFieldInfo {
        pub report_type: u32,
        pub report_id: u32,
        pub field_index: u32,
        pub maxusage: u32,
        pub flags: u32,
        pub physical: u32,
        pub logical: u32,
        pub application: u32,
        pub logical_minimum: i32,
        pub logical_maximum: i32,
        pub physical_minimum: i32,
        pub physical_maximum: i32,
        pub unit_exponent: u32,
        pub unit: u32,
    }

    #[repr(C)]
    #[derive(Default)]
    pub struct HiddevUsageRef {
        pub report_type: u32,
        pub report_id: u32,
        pub field_index: u32,
        pub usage_index: u32,
        pub usage_code: u32,
        pub value: i32,
    }

    impl From<ControlAddress> for HiddevUsageRef {
        fn from(address: ControlAddress) -> Self {
            Self {
                report_type: address.report_type.into(),
                report_id: address.report_id.into(),
                field_index: address.field_index,
                usage_index: address.usage_index,
                ..Default::default()
            }
        }
    }

    ioctl_write_int_bad!(hidiocapplication, request_code_none!(b'H', 0x02));
    ioctl_read!(hidiocgdevinfo, b'H', 0x03, HiddevDevinfo);
    ioctl_none!(hidiocinitreport, b'H', 0x05);
    ioctl_read_buf!(hidiocgname, b'H', 0x06, u8);
    ioctl_write_ptr!(hidiocgreport, b'H', 0x07, HiddevReportInfo);
    ioctl_write_ptr!(hidiocsreport, b'H', 0x08, HiddevReportInfo);
    ioctl_readwrite!(hidiocgreportinfo, b'H', 0x09, HiddevReportInfo);
    ioctl_readwrite!(hidiocgfieldinfo, b'H', 0x0a, HiddevFieldInfo);
    ioctl_readwrite!(hidiocgusage, b'H', 0x0b, HiddevUsageRef);
    ioctl_write_ptr!(hidiocsusage, b'H', 0x0c, HiddevUsageRef);
}

fn request_error(request: Request) -> impl FnOnce(Errno) -> TransportError {
    move |errno| TransportError::Request(request, io::Error::from(errno))
}

/// Opens hiddev device nodes read-only.
#[derive(Clone, Copy, Debug, Default)]
pub struct HiddevOpener;

impl DeviceOpener for HiddevOpener {
    type Device = HiddevDevice;

    fn open(&self, path: &Path) -> Result<Self::Device, OpenError> {
        HiddevDevice::open(path)
    }
}

/// An open hiddev device node.
#[derive(Debug)]
pub struct HiddevDevice {
    file: File,
    path: PathBuf,
}

impl HiddevDevice {
    /// Opens a hiddev device node read-only.
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let file = File::open(path).map_err(|source| OpenError {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// The path the device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    fn report_request(&self, report_type: ReportType, report_id: u8) -> HiddevReportInfo {
        HiddevReportInfo {
            report_type: report_type.into(),
            report_id: report_id.into(),
            num_fields: 0,
        }
    }
}

impl HidTransport for HiddevDevice {
    fn device_info(&self) -> Result<DeviceInfo, TransportError> {
        let mut info = HiddevDevinfo::default();
        // SAFETY: `info` is a valid, exclusively borrowed `hiddev_devinfo`.
        unsafe { hidiocgdevinfo(self.fd(), &mut info) }.map_err(request_error(Request::DeviceInfo))?;

        Ok(DeviceInfo {
            vendor_id: info.vendor as u16,
            product_id: info.product as u16,
            version: info.version as u16,
            num_applications: info.num_applications,
        })
    }

    fn application_usage(&self, index: u32) -> Result<u32, TransportError> {
        let index = c_int::try_from(index).map_err(|_| TransportError::UnsupportedResponse)?;
        // SAFETY: the request takes its argument by value.
        let usage = unsafe { hidiocapplication(self.fd(), index) }
            .map_err(request_error(Request::Application))?;

        Ok(usage as u32)
    }

    fn device_name(&self) -> Result<String, TransportError> {
        let mut buf = [0u8; MAX_NAME_LENGTH];
        // SAFETY: the request length is derived from the length of `buf`.
        unsafe { hidiocgname(self.fd(), &mut buf) }.map_err(request_error(Request::DeviceName))?;

        let name = CStr::from_bytes_until_nul(&buf)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&buf).into_owned());

        Ok(name)
    }

    fn init_reports(&mut self) -> Result<(), TransportError> {
        trace!("{}: init reports", self.path.display());
        // SAFETY: the request takes no argument.
        unsafe { hidiocinitreport(self.fd()) }.map_err(request_error(Request::InitReports))?;

        Ok(())
    }

    fn report_info(
        &mut self,
        report_type: ReportType,
        cursor: ReportCursor,
    ) -> Result<ReportInfo, TransportError> {
        let mut info = HiddevReportInfo {
            report_type: report_type.into(),
            report_id: match cursor {
                ReportCursor::First => REPORT_ID_FIRST,
                ReportCursor::After(id) => u32::from(id) | REPORT_ID_NEXT,
            },
            num_fields: 0,
        };
        // SAFETY: `info` is a valid, exclusively borrowed `hiddev_report_info`.
        unsafe { hidiocgreportinfo(self.fd(), &mut info) }
            .map_err(request_error(Request::ReportInfo))?;

        Ok(ReportInfo {
            report_type: ReportType::try_from(info.report_type)
                .map_err(|_| TransportError::UnsupportedResponse)?,
            report_id: u8::try_from(info.report_id)
                .map_err(|_| TransportError::UnsupportedResponse)?,
            num_fields: info.num_fields,
        })
    }

    fn field_info(
        &mut self,
        report_type: ReportType,
        report_id: u8,
        field_index: u32,
    ) -> Result<FieldInfo, TransportError> {
        let mut info = HiddevFieldInfo {
            report_type: report_type.into(),
            report_id: report_id.into(),
            field_index,
            ..Default::default()
        };
        // SAFETY: `info` is a valid, exclusively borrowed `hiddev_field_info`.
        unsafe { hidiocgfieldinfo(self.fd(), &mut info) }
            .map_err(request_error(Request::FieldInfo))?;

        Ok(FieldInfo {
            field_index: info.field_index,
            flags: info.flags,
            logical_minimum: info.logical_minimum,
            logical_maximum: info.logical_maximum,
            max_usage: info.maxusage,
        })
    }

    fn get_usage(&mut self, address: ControlAddress) -> Result<i32, TransportError> {
        let mut uref = HiddevUsageRef::from(address);
        // SAFETY: `uref` is a valid, exclusively borrowed `hiddev_usage_ref`.
        unsafe { hidiocgusage(self.fd(), &mut uref) }.map_err(request_error(Request::GetUsage))?;

        Ok(uref.value)
    }

    fn set_usage(&mut self, address: ControlAddress, value: i32) -> Result<(), TransportError> {
        let uref = HiddevUsageRef {
            value,
            ..HiddevUsageRef::from(address)
        };
        trace!("{}: set usage {address} to {value}", self.path.display());
        // SAFETY: `uref` is a valid `hiddev_usage_ref` the kernel only reads.
        unsafe { hidiocsusage(self.fd(), &uref) }.map_err(request_error(Request::SetUsage))?;

        Ok(())
    }

    fn get_report(&mut self, report_type: ReportType, report_id: u8) -> Result<(), TransportError> {
        let info = self.report_request(report_type, report_id);
        // SAFETY: `info` is a valid `hiddev_report_info` the kernel only reads.
        unsafe { hidiocgreport(self.fd(), &info) }.map_err(request_error(Request::GetReport))?;

        Ok(())
    }

    fn set_report(&mut self, report_type: ReportType, report_id: u8) -> Result<(), TransportError> {
        let info = self.report_request(report_type, report_id);
        // SAFETY: `info` is a valid `hiddev_report_info` the kernel only reads.
        unsafe { hidiocsreport(self.fd(), &info) }.map_err(request_error(Request::SetReport))?;

        Ok(())
    }
}
