//! Walks all reports, fields and usages of a monitor.
//!
//! The amount of reports a monitor exposes is not known up front. The device
//! is asked for its first report and then, repeatedly, for the report
//! following the previous one until it reports that there are no more. Reports
//! follow in the order the device declares them, which need not be ascending
//! by ID. Fields and
//! usages of a report are bounded by the counts returned alongside the report
//! and field information.
//!
//! Monitors are not always well-behaved, so a single field or usage failing to
//! be queried only skips that field or usage. Reports hidden for the monitor's
//! vendor are never queried beyond their report information.

use std::{collections::HashSet, iter::FusedIterator};

use tracing::{debug, warn};

use crate::{
    control::{ControlAddress, resolver},
    transport::{FieldInfo, HidTransport, ReportCursor, ReportInfo, ReportType},
};

/// A visible report of a monitor with the current values of all of its
/// usages.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReportControls {
    pub info: ReportInfo,

    /// The resolved name of the control the report represents.
    pub name: &'static str,

    /// All fields of the report that could be queried, in ascending order.
    pub fields: Vec<FieldControls>,
}

/// A single field of a report with the current values of its usages.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldControls {
    pub info: FieldInfo,

    /// All usages of the field that could be read, in ascending order.
    pub usages: Vec<UsageValue>,
}

/// The value of a single usage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UsageValue {
    pub usage_index: u32,
    pub value: i32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum WalkState {
    /// The reports were not initialized yet.
    Pending,

    /// The next report to query.
    At(ReportCursor),

    /// There are no more reports.
    Done,
}

/// Iterates over all visible reports of one type.
///
/// Created by [`crate::monitor::Monitor::controls`] or [`Controls::new`].
/// Each call to [`Iterator::next`] queries exactly one visible report
/// including all of its fields and usages. The walk cannot be restarted;
/// create a new iterator to walk the reports again.
pub struct Controls<'a, T: HidTransport> {
    device: &'a mut T,
    vendor_id: u16,
    report_type: ReportType,
    state: WalkState,

    /// IDs of all reports returned so far.
    seen: HashSet<u8>,
}

impl<'a, T: HidTransport> Controls<'a, T> {
    /// Prepares a walk over the reports of a device.
    ///
    /// The device is not touched before the first call to
    /// [`Iterator::next`]. `vendor_id` determines which reports are hidden.
    pub fn new(device: &'a mut T, vendor_id: u16, report_type: ReportType) -> Self {
        Self {
            device,
            vendor_id,
            report_type,
            state: WalkState::Pending,
            seen: HashSet::new(),
        }
    }

    fn collect_fields(&mut self, report: &ReportInfo) -> Vec<FieldControls> {
        let mut fields = Vec::new();

        for field_index in 0..report.num_fields {
            let info = match self
                .device
                .field_info(report.report_type, report.report_id, field_index)
            {
                Ok(info) => info,
                Err(err) => {
                    warn!(
                        "unable to get field info for field {field_index} of report {:#04x}: {err}",
                        report.report_id
                    );
                    continue;
                },
            };

            let mut usages = Vec::new();
            for usage_index in 0..info.max_usage {
                let address = ControlAddress {
                    report_type: report.report_type,
                    report_id: report.report_id,
                    field_index,
                    usage_index,
                };

                match self.device.get_usage(address) {
                    Ok(value) => usages.push(UsageValue { usage_index, value }),
                    Err(err) => {
                        warn!("unable to get control value for usage {usage_index} of {address}: {err}")
                    },
                }
            }

            fields.push(FieldControls { info, usages });
        }

        fields
    }
}

impl<T: HidTransport> Iterator for Controls<'_, T> {
    type Item = ReportControls;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = match self.state {
                WalkState::Done => return None,
                WalkState::At(cursor) => cursor,
                WalkState::Pending => {
                    if let Err(err) = self.device.init_reports() {
                        warn!("unable to get {} controls: {err}", self.report_type);
                        self.state = WalkState::Done;
                        return None;
                    }

                    ReportCursor::First
                },
            };

            // Failing to get the report is how the device signals the end of the walk.
            let Ok(report) = self.device.report_info(self.report_type, cursor) else {
                self.state = WalkState::Done;
                return None;
            };

            if !self.seen.insert(report.report_id) {
                warn!(
                    "device returned {} report {:#04x} twice, stopping",
                    self.report_type, report.report_id
                );
                self.state = WalkState::Done;
                return None;
            }

            self.state = WalkState::At(ReportCursor::After(report.report_id));

            if resolver::is_hidden(self.vendor_id, report.report_id) {
                debug!(
                    "skipping hidden {} report {:#04x}",
                    self.report_type, report.report_id
                );
                continue;
            }

            let fields = self.collect_fields(&report);
            return Some(ReportControls {
                info: report,
                name: resolver::resolve_name(self.vendor_id, report.report_id),
                fields,
            });
        }
    }
}

impl<T: HidTransport> FusedIterator for Controls<'_, T> {
}
