//! Maintains a registry of well-known monitor controls, both the generic ones
//! defined by the USB Monitor Control Class specification and vendor-specific
//! overrides.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::control::vendor::samsung;

/// Represents a known monitor control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KnownControl {
    /// The control code, which is also the report ID the control is exposed
    /// under.
    pub id: u8,

    /// A human-readable name of the control.
    pub name: &'static str,

    /// Whether the control is known to be broken on the hardware of a specific
    /// vendor and must not be touched.
    ///
    /// Controls of the generic table are never hidden.
    pub hidden: bool,
}

impl KnownControl {
    /// Creates a visible control.
    pub const fn new(id: u8, name: &'static str) -> Self {
        Self {
            id,
            name,
            hidden: false,
        }
    }

    /// Creates a control that is hidden because it is known to misbehave.
    pub const fn hidden(id: u8, name: &'static str) -> Self {
        Self {
            id,
            name,
            hidden: true,
        }
    }
}

/// Represents the control overrides of a single vendor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VendorTable {
    /// The USB vendor ID the table applies to.
    pub vendor_id: u16,

    /// The name of the vendor.
    pub vendor: &'static str,

    /// The controls of the vendor, in the order they are documented.
    pub controls: &'static [KnownControl],
}

impl VendorTable {
    /// Looks up a control of this vendor by its ID.
    pub fn lookup(&self, control_id: u8) -> Option<KnownControl> {
        self.controls
            .iter()
            .find(|control| control.id == control_id)
            .copied()
    }
}

/// Controls defined by the USB Monitor Control Class specification.
pub const VESA_CONTROLS: &[KnownControl] = &[
    KnownControl::new(0x01, "Degauss"),
    KnownControl::new(0x10, "Brightness"),
    KnownControl::new(0x12, "Contrast"),
    KnownControl::new(0x16, "Red Video Gain"),
    KnownControl::new(0x18, "Green Video Gain"),
    KnownControl::new(0x1a, "Blue Video Gain"),
    KnownControl::new(0x1c, "Focus"),
    KnownControl::new(0x20, "Horizontal Position"),
    KnownControl::new(0x22, "Horizontal Size"),
    KnownControl::new(0x24, "Horizontal Pincushion"),
    KnownControl::new(0x26, "Horizontal Pincushion Balance"),
    KnownControl::new(0x28, "Horizontal Misconvergence"),
    KnownControl::new(0x2a, "Horizontal Linearity"),
    KnownControl::new(0x2c, "Horizontal Linearity Balance"),
    KnownControl::new(0x30, "Vertical Position"),
    KnownControl::new(0x32, "Vertical Size"),
    KnownControl::new(0x34, "Vertical Pincushion"),
    KnownControl::new(0x36, "Vertical Pincushion Balance"),
    KnownControl::new(0x38, "Vertical Misconvergence"),
    KnownControl::new(0x3a, "Vertical Linearity"),
    KnownControl::new(0x3c, "Vertical Linearity Balance"),
    KnownControl::new(0x40, "Parallelogram Balance (Key Distortion)"),
    KnownControl::new(0x42, "Trapezoidal Distortion (Key)"),
    KnownControl::new(0x44, "Tilt (Rotation)"),
    KnownControl::new(0x46, "Top Corner Distortion Control"),
    KnownControl::new(0x48, "Top Corner Distortion Balance"),
    KnownControl::new(0x4a, "Bottom Corner Distortion Control"),
    KnownControl::new(0x4c, "Bottom Corner Distortion Balance"),
    KnownControl::new(0x56, "Horizontal Moire"),
    KnownControl::new(0x58, "Vertical Moire"),
    KnownControl::new(0x5e, "Input Level Select"),
    KnownControl::new(0x60, "Input Source Select"),
    KnownControl::new(0x6c, "Red Video Black Level"),
    KnownControl::new(0x6e, "Green Video Black Level"),
    KnownControl::new(0x70, "Blue Video Black Level"),
    KnownControl::new(0xa2, "Auto Size Center"),
    KnownControl::new(0xa4, "Polarity Horizontal Sychronization"),
    KnownControl::new(0xa6, "Polarity Vertical Synchronization"),
    KnownControl::new(0xaa, "Screen Orientation"),
    KnownControl::new(0xac, "Horizontal Frequency in Hz"),
    KnownControl::new(0xae, "Vertical Frequency in 0.1 Hz"),
    KnownControl::new(0xb0, "Settings"),
    KnownControl::new(0xca, "On Screen Display (OSD)"),
    KnownControl::new(0xd4, "Stereo Mode"),
];

lazy_static! {
    static ref VENDOR_TABLES: HashMap<u16, VendorTable> = HashMap::from([(
        samsung::VENDOR_ID,
        VendorTable {
            vendor_id: samsung::VENDOR_ID,
            vendor: "Samsung",
            controls: samsung::CONTROLS,
        }
    )]);
}

/// Looks up a control in the generic table.
pub fn lookup_generic(control_id: u8) -> Option<KnownControl> {
    VESA_CONTROLS
        .iter()
        .find(|control| control.id == control_id)
        .copied()
}

/// Looks up the override table of a vendor.
///
/// Returns [`None`] for vendors without known overrides.
pub fn vendor_table(vendor_id: u16) -> Option<&'static VendorTable> {
    VENDOR_TABLES.get(&vendor_id)
}

/// Iterates over all known vendor tables in no particular order.
pub fn vendor_tables() -> impl Iterator<Item = &'static VendorTable> {
    VENDOR_TABLES.values()
}
