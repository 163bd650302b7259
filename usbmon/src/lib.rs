//! An implementation of the USB Monitor Control Class.
//!
//! Some monitors, mostly CRTs built around the turn of the millennium, carry a
//! USB hub with a HID device attached to it. That HID device exposes the
//! monitor's settings (brightness, contrast, geometry, color gains etc.) as
//! HID reports, as defined by the [USB Monitor Control Class](https://www.usb.org/sites/default/files/usbmon11.pdf)
//! specification, with VESA assigning the control codes.
//!
//! This crate identifies such monitors, walks the controls they expose and
//! reads or writes single control values. It does not implement HID itself:
//! the requests it needs are described by [`transport::HidTransport`]. On
//! Linux, the kernel's hiddev interface implements them, see [`hiddev`].
//!
//! # Quickstart
//!
//! ```no_run
//! use usbmon::{
//!     control::{ControlAddress, ControlValue},
//!     discovery,
//!     hiddev::HiddevOpener,
//!     transport::ReportType,
//! };
//!
//! // Look for hiddev nodes in the usual places and keep the first monitor
//! // found open.
//! let candidates = discovery::find_candidates(discovery::HIDDEV_ROOTS);
//! let (path, mut monitor) = discovery::find_first(&HiddevOpener, candidates)
//!     .expect("no USB HID monitor was found");
//! println!("{}: {}", path.display(), monitor.identity());
//!
//! // Controls are addressed by report type and ID. The ID is the VESA control
//! // code, with 0x10 being the brightness.
//! let brightness = monitor
//!     .read(ControlAddress::new(ReportType::Feature, 0x10))
//!     .expect("could not read brightness");
//!
//! // The same addresses can be parsed from their textual form.
//! monitor
//!     .write(ControlValue::parse_write("F,0x10=40").unwrap())
//!     .expect("could not write brightness");
//!
//! // All controls of a report type can be walked, including their current
//! // values. Controls known to be broken on the monitor's hardware are
//! // skipped.
//! for report in monitor.controls(ReportType::Feature) {
//!     println!("{:#04x} - {}", report.info.report_id, report.name);
//! }
//! # let _ = brightness;
//! ```

pub mod access;
pub mod control;
pub mod discovery;
pub mod enumerate;
#[cfg(target_os = "linux")]
pub mod hiddev;
pub mod monitor;
pub mod transport;
