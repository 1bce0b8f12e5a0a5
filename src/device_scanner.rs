use serialport::{SerialPortInfo, SerialPortType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialDevice {
    pub name: String,
    pub description: String,
}

impl SerialDevice {
    pub fn new(name: String, description: String) -> Self {
        Self { name, description }
    }
}

impl From<SerialPortInfo> for SerialDevice {
    fn from(info: SerialPortInfo) -> Self {
        let description = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let label = [usb.manufacturer, usb.product]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if label.is_empty() {
                    format!("USB {:04x}:{:04x}", usb.vid, usb.pid)
                } else {
                    format!("USB {} ({:04x}:{:04x})", label, usb.vid, usb.pid)
                }
            }
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::PciPort => "PCI".to_string(),
            SerialPortType::Unknown => "Unknown".to_string(),
        };

        SerialDevice::new(info.port_name, description)
    }
}

/// Lists the serial ports available on this machine, sorted by name
pub fn list_ports() -> Result<Vec<SerialDevice>, String> {
    let ports = serialport::available_ports()
        .map_err(|e| format!("Failed to enumerate serial ports: {}", e))?;

    let mut devices: Vec<SerialDevice> = ports.into_iter().map(SerialDevice::from).collect();
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}
