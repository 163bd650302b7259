//! Resolves control names and visibility for a specific vendor.
//!
//! Lookups consult the vendor's override table first and fall back to the
//! generic table. Whether a control is hidden is decided by the vendor table
//! alone, as breakage is a property of specific hardware.

use crate::control::registry::{self, KnownControl};

/// The name of controls neither table knows about.
pub const UNKNOWN_CONTROL: &str = "unknown";

/// Resolves a control of a vendor, falling back to a synthetic visible entry
/// named [`UNKNOWN_CONTROL`] if no table knows about it.
pub fn resolve(vendor_id: u16, control_id: u8) -> KnownControl {
    registry::vendor_table(vendor_id)
        .and_then(|table| table.lookup(control_id))
        .or_else(|| registry::lookup_generic(control_id))
        .unwrap_or(KnownControl::new(control_id, UNKNOWN_CONTROL))
}

/// Resolves the human-readable name of a control.
pub fn resolve_name(vendor_id: u16, control_id: u8) -> &'static str {
    resolve(vendor_id, control_id).name
}

/// Checks whether a control is known to be broken on the vendor's hardware.
///
/// Hidden controls must neither be read, written nor enumerated.
pub fn is_hidden(vendor_id: u16, control_id: u8) -> bool {
    registry::vendor_table(vendor_id)
        .and_then(|table| table.lookup(control_id))
        .is_some_and(|control| control.hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{registry::VESA_CONTROLS, vendor::samsung};

    const NO_VENDOR: u16 = 0x1234;

    #[test]
    fn vendor_table_takes_precedence() {
        // 0xaa is "Screen Orientation" in the generic table.
        assert_eq!(resolve_name(samsung::VENDOR_ID, 0xaa), "Red Video Custom Value");
        assert_eq!(resolve_name(NO_VENDOR, 0xaa), "Screen Orientation");
    }

    #[test]
    fn every_vendor_entry_wins() {
        for table in registry::vendor_tables() {
            for control in table.controls {
                assert_eq!(resolve_name(table.vendor_id, control.id), control.name);
                assert_eq!(is_hidden(table.vendor_id, control.id), control.hidden);
            }
        }
    }

    #[test]
    fn falls_back_to_generic_table() {
        assert_eq!(resolve_name(samsung::VENDOR_ID, 0x10), "Brightness");
        assert!(!is_hidden(samsung::VENDOR_ID, 0x10));
    }

    #[test]
    fn unknown_controls_are_visible() {
        for vendor_id in [NO_VENDOR, samsung::VENDOR_ID] {
            assert_eq!(resolve_name(vendor_id, 0xfe), UNKNOWN_CONTROL);
            assert!(!is_hidden(vendor_id, 0xfe));
        }
        assert_eq!(resolve(NO_VENDOR, 0xfe), KnownControl::new(0xfe, "unknown"));
    }

    #[test]
    fn generic_controls_are_never_hidden_by_any_vendor() {
        for control in VESA_CONTROLS {
            let vendor_hides = registry::vendor_tables()
                .any(|table| table.lookup(control.id).is_some_and(|c| c.hidden));
            if vendor_hides {
                continue;
            }

            assert!(!is_hidden(NO_VENDOR, control.id));
            assert!(!is_hidden(samsung::VENDOR_ID, control.id));
        }
    }

    #[test]
    fn samsung_hides_its_broken_controls() {
        // Focus is generic, but broken on Samsung monitors.
        assert!(is_hidden(samsung::VENDOR_ID, 0x1c));
        assert!(!is_hidden(NO_VENDOR, 0x1c));
        assert_eq!(resolve_name(NO_VENDOR, 0x1c), "Focus");
    }
}
