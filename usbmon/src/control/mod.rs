//! Implements the addressing of single monitor controls.
//!
//! A control value lives at a usage inside a field inside a report, so it is
//! addressed by the report type, the report ID, the field index and the usage
//! index. The report ID doubles as the control code the USB Monitor Control
//! Class assigns to a control (`0x10` is brightness, `0x12` is contrast and so
//! on), which is why names and visibility are resolved by report ID only.
//!
//! Front ends specify controls in a compact textual form,
//! `TYPE,ID[,FIELD[,USAGE]][=VALUE]`, that is parsed by
//! [`ControlAddress::parse_read`] and [`ControlValue::parse_write`].

use std::fmt;

use thiserror::Error;

use crate::transport::ReportType;

pub mod registry;
pub mod resolver;
pub mod vendor;

/// Fully determines the location of one control value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ControlAddress {
    pub report_type: ReportType,

    /// The ID of the report, which is the control code.
    ///
    /// `0` is never a valid control.
    pub report_id: u8,

    pub field_index: u32,
    pub usage_index: u32,
}

impl ControlAddress {
    /// Addresses the first usage of the first field of a report, which is
    /// where monitors keep the value of a control.
    pub fn new(report_type: ReportType, report_id: u8) -> Self {
        Self {
            report_type,
            report_id,
            field_index: 0,
            usage_index: 0,
        }
    }

    /// Parses a control specification for a read operation.
    ///
    /// The syntax is `TYPE,ID[,FIELD[,USAGE]]` where `TYPE` is either `I`
    /// (input) or `F` (feature). A value must not be given.
    pub fn parse_read(spec: &str) -> Result<Self, AddressError> {
        if spec.contains('=') {
            return Err(AddressError::UnexpectedValue(spec.to_string()));
        }

        parse_coordinates(spec, Operation::Read)
    }
}

impl fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:#04x},{},{}",
            self.report_type.letter(),
            self.report_id,
            self.field_index,
            self.usage_index
        )
    }
}

/// A control value paired with the address it was read from or is written to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ControlValue {
    pub address: ControlAddress,
    pub value: i32,
}

impl ControlValue {
    /// Parses a control specification for a write operation.
    ///
    /// The syntax is `TYPE,ID[,FIELD[,USAGE]]=VALUE` where `TYPE` is either
    /// `O` (output) or `F` (feature).
    pub fn parse_write(spec: &str) -> Result<Self, AddressError> {
        let Some((coordinates, value)) = spec.split_once('=') else {
            return Err(AddressError::MissingValue);
        };

        let value = parse_number(value)
            .map(|raw| raw as i32)
            .ok_or_else(|| AddressError::InvalidValue(value.to_string()))?;
        let address = parse_coordinates(coordinates, Operation::Write)?;

        Ok(Self { address, value })
    }
}

/// Represents an error that occurred while parsing a control specification.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Error)]
#[non_exhaustive]
pub enum AddressError {
    #[error("Missing VALUE in set command")]
    MissingValue,

    #[error("Unexpected VALUE in get command '{0}'")]
    UnexpectedValue(String),

    #[error("Invalid type '{0}'")]
    InvalidType(String),

    #[error("Type I is invalid for set operation")]
    TypeInvalidForWrite,

    #[error("Type O is invalid for get operation")]
    TypeInvalidForRead,

    #[error("Missing control ID")]
    MissingId,

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Invalid value '{0}'")]
    InvalidValue(String),

    #[error("Control ID '{0}' is out of range (1..=255)")]
    IdOutOfRange(String),

    #[error("Too many components in '{0}'")]
    TooManyComponents(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Operation {
    Read,
    Write,
}

fn parse_coordinates(spec: &str, operation: Operation) -> Result<ControlAddress, AddressError> {
    let mut parts = spec.split(',');

    let report_type = match parts.next().unwrap_or_default() {
        "F" => ReportType::Feature,
        "I" if operation == Operation::Write => return Err(AddressError::TypeInvalidForWrite),
        "I" => ReportType::Input,
        "O" if operation == Operation::Read => return Err(AddressError::TypeInvalidForRead),
        "O" => ReportType::Output,
        other => return Err(AddressError::InvalidType(other.to_string())),
    };

    let id = parts.next().ok_or(AddressError::MissingId)?;
    let report_id = parse_component(id)?;
    let report_id = u8::try_from(report_id)
        .ok()
        .filter(|&id| id != 0)
        .ok_or_else(|| AddressError::IdOutOfRange(id.to_string()))?;

    let mut address = ControlAddress::new(report_type, report_id);
    if let Some(field) = parts.next() {
        address.field_index = parse_component(field)?;
    }
    if let Some(usage) = parts.next() {
        address.usage_index = parse_component(usage)?;
    }

    if parts.next().is_some() {
        return Err(AddressError::TooManyComponents(spec.to_string()));
    }

    Ok(address)
}

fn parse_component(raw: &str) -> Result<u32, AddressError> {
    parse_number(raw)
        .and_then(|num| u32::try_from(num).ok())
        .ok_or_else(|| AddressError::InvalidNumber(raw.to_string()))
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
///
/// Hexadecimal numbers are taken as raw 32-bit patterns, so `0xffffffff` is
/// `-1` once narrowed to `i32`.
fn parse_number(raw: &str) -> Option<i64> {
    if let Some(hex) = raw.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok().map(i64::from);
    }

    raw.parse::<i32>().ok().map(i64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_with_defaults() {
        let parsed = ControlValue::parse_write("F,0x12=10").unwrap();
        assert_eq!(parsed.address, ControlAddress::new(ReportType::Feature, 0x12));
        assert_eq!(parsed.value, 10);
    }

    #[test]
    fn parses_read_with_defaults() {
        let parsed = ControlAddress::parse_read("I,16").unwrap();
        assert_eq!(parsed, ControlAddress::new(ReportType::Input, 16));
    }

    #[test]
    fn parses_all_components() {
        let parsed = ControlValue::parse_write("O,1,0,0=1").unwrap();
        assert_eq!(parsed.address, ControlAddress::new(ReportType::Output, 1));
        assert_eq!(parsed.value, 1);

        let parsed = ControlAddress::parse_read("F,0x10,2,0x3").unwrap();
        assert_eq!(parsed.report_id, 0x10);
        assert_eq!(parsed.field_index, 2);
        assert_eq!(parsed.usage_index, 3);
    }

    #[test]
    fn rejects_wrong_type_for_operation() {
        assert_eq!(
            ControlValue::parse_write("I,16=5"),
            Err(AddressError::TypeInvalidForWrite)
        );
        assert_eq!(
            ControlAddress::parse_read("O,1"),
            Err(AddressError::TypeInvalidForRead)
        );
        assert_eq!(
            ControlAddress::parse_read("X,1"),
            Err(AddressError::InvalidType("X".to_string()))
        );
        assert_eq!(
            ControlAddress::parse_read("FF,1"),
            Err(AddressError::InvalidType("FF".to_string()))
        );
    }

    #[test]
    fn write_requires_value() {
        let err = ControlValue::parse_write("O,1").unwrap_err();
        assert_eq!(err, AddressError::MissingValue);
        assert!(err.to_string().starts_with("Missing VALUE"));
    }

    #[test]
    fn read_forbids_value() {
        assert!(matches!(
            ControlAddress::parse_read("F,16=5"),
            Err(AddressError::UnexpectedValue(_))
        ));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(
            ControlAddress::parse_read("F,abc"),
            Err(AddressError::InvalidNumber("abc".to_string()))
        );
        assert_eq!(
            ControlValue::parse_write("F,16=ten"),
            Err(AddressError::InvalidValue("ten".to_string()))
        );
        assert_eq!(ControlAddress::parse_read("F"), Err(AddressError::MissingId));
        assert!(matches!(
            ControlAddress::parse_read("F,1,0,0,0"),
            Err(AddressError::TooManyComponents(_))
        ));
    }

    #[test]
    fn rejects_ids_outside_control_range() {
        assert!(matches!(
            ControlAddress::parse_read("F,0"),
            Err(AddressError::IdOutOfRange(_))
        ));
        assert!(matches!(
            ControlAddress::parse_read("F,0x100"),
            Err(AddressError::IdOutOfRange(_))
        ));
    }

    #[test]
    fn values_keep_sign_and_bit_pattern() {
        assert_eq!(ControlValue::parse_write("F,16=-3").unwrap().value, -3);
        assert_eq!(ControlValue::parse_write("F,16=0xffffffff").unwrap().value, -1);
    }

    #[test]
    fn displays_as_parseable_coordinates() {
        let address = ControlAddress::parse_read("F,16,1,2").unwrap();
        assert_eq!(address.to_string(), "F,0x10,1,2");
        assert_eq!(ControlAddress::parse_read(&address.to_string()), Ok(address));
    }
}
