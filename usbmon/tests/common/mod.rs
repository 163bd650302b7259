#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    io,
    path::{Path, PathBuf},
    rc::Rc,
};

use usbmon::{
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

/// The top-level usage of a monitor application (Monitor Control page).
pub const MONITOR_APPLICATION: u32 = 0x0080_0001;

/// The top-level usage of a mouse (Generic Desktop page).
pub const MOUSE_APPLICATION: u32 = 0x0001_0002;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Call {
    DeviceInfo,
    Application(u32),
    DeviceName,
    InitReports,
    ReportInfo(ReportType, ReportCursor),
    FieldInfo(ReportType, u8, u32),
    GetUsage(ControlAddress),
    SetUsage(ControlAddress, i32),
    GetReport(ReportType, u8),
    SetReport(ReportType, u8),
}

impl Call {
    /// Whether the call touches reports, fields or usages.
    pub fn is_report_request(&self) -> bool {
        !matches!(self, Call::DeviceInfo | Call::Application(_) | Call::DeviceName)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockField {
    pub flags: u32,
    pub logical_minimum: i32,
    pub logical_maximum: i32,
    pub values: Vec<i32>,
    pub broken: bool,
    pub broken_usages: Vec<u32>,
}

impl MockField {
    pub fn new(values: &[i32]) -> Self {
        Self {
            flags: 2,
            logical_minimum: 0,
            logical_maximum: 100,
            values: values.to_vec(),
            ..Default::default()
        }
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn with_broken_usage(mut self, usage_index: u32) -> Self {
        self.broken_usages.push(usage_index);
        self
    }
}

/// An in-memory monitor keeping separate host-side report buffers and
/// device-side values, like hiddev does.
#[derive(Debug, Default)]
pub struct MockDevice {
    pub info: Option<DeviceInfo>,
    pub applications: Vec<u32>,
    pub name: Option<String>,
    pub fail_init: bool,
    pub fail_get_report: bool,
    pub reports: BTreeMap<(ReportType, u8), Vec<MockField>>,

    /// Reports in the order the device declares them.
    pub report_order: Vec<(ReportType, u8)>,

    /// Whether the report after the last one is the first one again.
    pub wrap_around: bool,

    /// Field count announced for every report instead of the real one.
    pub claimed_fields: Option<u32>,

    /// Values as stored by the monitor.
    pub hardware: HashMap<ControlAddress, i32>,

    /// Values as staged in the host-side report buffers.
    pub buffer: HashMap<ControlAddress, i32>,

    pub calls: RefCell<Vec<Call>>,
    pub handle: Option<HandleGuard>,
}

/// Decrements the shared open handle count when its device is dropped.
#[derive(Debug)]
pub struct HandleGuard(Rc<Cell<usize>>);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

fn failure(request: Request) -> TransportError {
    TransportError::Request(request, io::Error::from(io::ErrorKind::InvalidInput))
}

impl MockDevice {
    pub fn monitor(vendor_id: u16) -> Self {
        Self {
            info: Some(DeviceInfo {
                vendor_id,
                product_id: 0x8002,
                version: 0x0102,
                num_applications: 2,
            }),
            applications: vec![MOUSE_APPLICATION, MONITOR_APPLICATION],
            name: Some("Mock CRT".to_string()),
            ..Default::default()
        }
    }

    pub fn mouse() -> Self {
        Self {
            info: Some(DeviceInfo {
                vendor_id: 0x046d,
                product_id: 0xc077,
                version: 0x7200,
                num_applications: 1,
            }),
            applications: vec![MOUSE_APPLICATION],
            name: Some("Mock Mouse".to_string()),
            ..Default::default()
        }
    }

    pub fn with_report(mut self, report_type: ReportType, report_id: u8, fields: Vec<MockField>) -> Self {
        for (field_index, field) in fields.iter().enumerate() {
            for (usage_index, value) in field.values.iter().enumerate() {
                self.hardware.insert(
                    ControlAddress {
                        report_type,
                        report_id,
                        field_index: field_index as u32,
                        usage_index: usage_index as u32,
                    },
                    *value,
                );
            }
        }
        if !self.report_order.contains(&(report_type, report_id)) {
            self.report_order.push((report_type, report_id));
        }
        self.reports.insert((report_type, report_id), fields);
        self
    }

    pub fn wrapping_around(mut self) -> Self {
        self.wrap_around = true;
        self
    }

    /// A monitor exposing a single-usage feature report per control.
    pub fn with_controls(mut self, ids: &[u8]) -> Self {
        for (n, id) in ids.iter().enumerate() {
            self = self.with_report(ReportType::Feature, *id, vec![MockField::new(&[n as i32])]);
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn field(&self, report_type: ReportType, report_id: u8, field_index: u32) -> Option<&MockField> {
        self.reports
            .get(&(report_type, report_id))
            .and_then(|fields| fields.get(field_index as usize))
    }

    fn copy_report(
        from: &HashMap<ControlAddress, i32>,
        to: &mut HashMap<ControlAddress, i32>,
        report_type: ReportType,
        report_id: u8,
    ) {
        for (address, value) in from {
            if address.report_type == report_type && address.report_id == report_id {
                to.insert(*address, *value);
            }
        }
    }
}

impl HidTransport for MockDevice {
    fn device_info(&self) -> Result<DeviceInfo, TransportError> {
        self.record(Call::DeviceInfo);
        self.info.ok_or_else(|| failure(Request::DeviceInfo))
    }

    fn application_usage(&self, index: u32) -> Result<u32, TransportError> {
        self.record(Call::Application(index));
        self.applications
            .get(index as usize)
            .copied()
            .ok_or_else(|| failure(Request::Application))
    }

    fn device_name(&self) -> Result<String, TransportError> {
        self.record(Call::DeviceName);
        self.name.clone().ok_or_else(|| failure(Request::DeviceName))
    }

    fn init_reports(&mut self) -> Result<(), TransportError> {
        self.record(Call::InitReports);
        if self.fail_init {
            return Err(failure(Request::InitReports));
        }

        self.buffer = self.hardware.clone();
        Ok(())
    }

    fn report_info(
        &mut self,
        report_type: ReportType,
        cursor: ReportCursor,
    ) -> Result<ReportInfo, TransportError> {
        self.record(Call::ReportInfo(report_type, cursor));

        let ids: Vec<u8> = self
            .report_order
            .iter()
            .filter(|(ty, _)| *ty == report_type)
            .map(|(_, id)| *id)
            .collect();
        let next = match cursor {
            ReportCursor::First => ids.first().copied(),
            ReportCursor::After(previous) => ids
                .iter()
                .position(|id| *id == previous)
                .and_then(|position| ids.get(position + 1).copied())
                .or_else(|| self.wrap_around.then(|| ids.first().copied()).flatten()),
        };

        next.map(|id| ReportInfo {
            report_type,
            report_id: id,
            num_fields: self.claimed_fields.unwrap_or_else(|| {
                self.reports.get(&(report_type, id)).map_or(0, Vec::len) as u32
            }),
        })
        .ok_or_else(|| failure(Request::ReportInfo))
    }

    fn field_info(
        &mut self,
        report_type: ReportType,
        report_id: u8,
        field_index: u32,
    ) -> Result<FieldInfo, TransportError> {
        self.record(Call::FieldInfo(report_type, report_id, field_index));

        match self.field(report_type, report_id, field_index) {
            Some(field) if !field.broken => Ok(FieldInfo {
                field_index,
                flags: field.flags,
                logical_minimum: field.logical_minimum,
                logical_maximum: field.logical_maximum,
                max_usage: field.values.len() as u32,
            }),
            _ => Err(failure(Request::FieldInfo)),
        }
    }

    fn get_usage(&mut self, address: ControlAddress) -> Result<i32, TransportError> {
        self.record(Call::GetUsage(address));

        let broken = self
            .field(address.report_type, address.report_id, address.field_index)
            .is_none_or(|field| field.broken_usages.contains(&address.usage_index));
        if broken {
            return Err(failure(Request::GetUsage));
        }

        self.buffer
            .get(&address)
            .copied()
            .ok_or_else(|| failure(Request::GetUsage))
    }

    fn set_usage(&mut self, address: ControlAddress, value: i32) -> Result<(), TransportError> {
        self.record(Call::SetUsage(address, value));

        if !self.hardware.contains_key(&address) {
            return Err(failure(Request::SetUsage));
        }

        self.buffer.insert(address, value);
        Ok(())
    }

    fn get_report(&mut self, report_type: ReportType, report_id: u8) -> Result<(), TransportError> {
        self.record(Call::GetReport(report_type, report_id));

        if self.fail_get_report || !self.reports.contains_key(&(report_type, report_id)) {
            return Err(failure(Request::GetReport));
        }

        Self::copy_report(&self.hardware, &mut self.buffer, report_type, report_id);
        Ok(())
    }

    fn set_report(&mut self, report_type: ReportType, report_id: u8) -> Result<(), TransportError> {
        self.record(Call::SetReport(report_type, report_id));

        if !self.reports.contains_key(&(report_type, report_id)) {
            return Err(failure(Request::SetReport));
        }

        Self::copy_report(&self.buffer, &mut self.hardware, report_type, report_id);
        Ok(())
    }
}

/// Hands out prepared devices by path and keeps track of open handles.
#[derive(Default)]
pub struct MockOpener {
    devices: RefCell<HashMap<PathBuf, MockDevice>>,
    pub opened: RefCell<Vec<PathBuf>>,
    pub open_handles: Rc<Cell<usize>>,
}

impl MockOpener {
    pub fn with_device(self, path: &str, device: MockDevice) -> Self {
        self.devices.borrow_mut().insert(PathBuf::from(path), device);
        self
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.borrow().clone()
    }
}

impl DeviceOpener for MockOpener {
    type Device = MockDevice;

    fn open(&self, path: &Path) -> Result<Self::Device, OpenError> {
        self.opened.borrow_mut().push(path.to_path_buf());

        let mut device = self.devices.borrow_mut().remove(path).ok_or_else(|| OpenError {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })?;

        self.open_handles.set(self.open_handles.get() + 1);
        device.handle = Some(HandleGuard(Rc::clone(&self.open_handles)));
        Ok(device)
    }
}

pub fn paths(raw: &[&str]) -> Vec<PathBuf> {
    raw.iter().map(PathBuf::from).collect()
}
