//! Implements reading and writing single control values.

use thiserror::Error;
use tracing::trace;

use crate::{
    control::{ControlAddress, resolver},
    transport::{HidTransport, TransportError},
};

/// Reads the current value of a control.
///
/// The report is pulled from the monitor into the report buffer first, then
/// the usage value is read out of the buffer.
///
/// Returns [`ControlError::HiddenControl`] without touching the device if the
/// control is hidden for the vendor.
pub fn read_control<T: HidTransport>(
    device: &mut T,
    vendor_id: u16,
    address: ControlAddress,
) -> Result<i32, ControlError> {
    ensure_visible(vendor_id, address)?;

    device.get_report(address.report_type, address.report_id)?;
    let value = device.get_usage(address)?;

    trace!("read {value} from {address}");
    Ok(value)
}

/// Writes a control value.
///
/// The value is placed into the report buffer first, then the buffer is pushed
/// to the monitor. Pushing before placing the value would write the previous
/// buffer contents instead.
///
/// Returns [`ControlError::HiddenControl`] without touching the device if the
/// control is hidden for the vendor.
pub fn write_control<T: HidTransport>(
    device: &mut T,
    vendor_id: u16,
    address: ControlAddress,
    value: i32,
) -> Result<(), ControlError> {
    ensure_visible(vendor_id, address)?;

    device.set_usage(address, value)?;
    device.set_report(address.report_type, address.report_id)?;

    trace!("wrote {value} to {address}");
    Ok(())
}

fn ensure_visible(vendor_id: u16, address: ControlAddress) -> Result<(), ControlError> {
    if resolver::is_hidden(vendor_id, address.report_id) {
        return Err(ControlError::HiddenControl(address.report_id));
    }

    Ok(())
}

/// Represents an error that occurred when accessing a control.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControlError {
    /// Indicates that the control is hidden because it is probably broken.
    #[error("control {0:#x} is hidden because it's probably broken")]
    HiddenControl(u8),

    /// Indicates that the device failed a request.
    #[error("the device could not access the control")]
    Transport(#[from] TransportError),
}
